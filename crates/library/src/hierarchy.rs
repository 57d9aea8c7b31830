//! Opening the cache that belongs to a hierarchy.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use mandb_cache::error::ErrorKind as CacheErrorKind;
use mandb_cache::{Database, OpenMode};
use std::fs;
use std::path::Path;

/// Open the cache at `path`.
///
/// A cache that is locked, missing or from another format version comes
/// back as [`ErrorKind::Unavailable`]: lookups should carry on without it.
pub fn open_cache(path: &Path, mode: OpenMode) -> Result<Database> {
    Database::open(path, mode).map_err(|err| ErrorKind::cache(err, path))
}

/// Open the cache at `path` for an update, creating it if needed.
///
/// A cache written by another format version can't be updated in place, so
/// it is thrown away and recreated. The returned flag says whether that
/// happened, in which case the whole hierarchy must be rescanned.
pub fn open_for_update(path: &Path) -> Result<(Database, bool)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(err) = fs::create_dir_all(parent)
    {
        tracing::warn!(path = %parent.display(), error = %err, "Cannot create cache directory");
        return Err(err).or_raise(|| ErrorKind::Unavailable(path.to_path_buf()));
    }
    match Database::open(path, OpenMode::CreateIfMissing) {
        Ok(db) => Ok((db, false)),
        Err(err) if matches!(&*err, CacheErrorKind::VersionMismatch(_)) => {
            tracing::warn!(path = %path.display(), error = %err, "Rebuilding cache from an incompatible version");
            let db = open_cache(path, OpenMode::CreateTruncate)?;
            Ok((db, true))
        },
        Err(err) => Err(ErrorKind::cache(err, path)),
    }
}
