//! Cache handle, format version and scan bookkeeping.

use crate::error::{ErrorKind, Result};
use crate::models::key::{SCAN_TIME_KEY, SEP, VERSION_KEY};
use mandb_storage::{Backend, BackendHandle, FileBackend, OpenMode};
use std::fmt;
use std::path::Path;
use time::UtcDateTime;
use tracing::instrument;

/// Format version written to, and demanded of, every cache.
///
/// Bump this whenever the key layout or record codec changes; older caches
/// are then reported as [`ErrorKind::VersionMismatch`] and get rebuilt.
pub const SCHEMA_VERSION: &str = "mandb-1";

/// An open index cache.
///
/// This is the main entry point for interacting with the cache. It owns the
/// storage handle (and therefore its lock) until [`close`](Database::close)
/// is called or it is dropped.
pub struct Database {
    pub(crate) backend: BackendHandle,
}

impl Database {
    /// Open the cache at `path`.
    ///
    /// A cache that is being created (or truncated) is stamped with
    /// [`SCHEMA_VERSION`]; any other cache must already carry it.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display(), %mode))]
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let backend = FileBackend::open(path, mode).map_err(ErrorKind::storage)?;
        Self::with_backend(Box::new(backend))
    }

    /// Wrap an already-open storage backend (useful for testing).
    pub fn with_backend(backend: BackendHandle) -> Result<Self> {
        let mut db = Self { backend };
        let fresh = match db.backend.mode() {
            OpenMode::CreateTruncate => true,
            OpenMode::CreateIfMissing => db.backend.is_empty(),
            OpenMode::ReadWrite | OpenMode::ReadOnly => false,
        };
        match fresh {
            true => db.backend.replace(VERSION_KEY, SCHEMA_VERSION).map_err(ErrorKind::storage)?,
            false => db.check_version()?,
        }
        Ok(db)
    }

    fn check_version(&self) -> Result<()> {
        match self.version()? {
            Some(version) if version == SCHEMA_VERSION => Ok(()),
            found => {
                tracing::debug!(found = ?found, expected = SCHEMA_VERSION, "Cache version mismatch");
                exn::bail!(ErrorKind::VersionMismatch(found))
            },
        }
    }

    /// The format version recorded in the cache, if any.
    pub fn version(&self) -> Result<Option<String>> {
        self.backend.fetch(VERSION_KEY).map_err(ErrorKind::storage)
    }

    pub fn path(&self) -> Option<&Path> {
        self.backend.path()
    }

    pub fn mode(&self) -> OpenMode {
        self.backend.mode()
    }

    // =========================================================================
    // Scan bookkeeping
    // =========================================================================

    /// When the hierarchy backing this cache was last scanned.
    ///
    /// An unreadable timestamp is treated like a missing one: the next update
    /// rescans everything, which is always safe.
    pub fn scan_time(&self) -> Result<Option<UtcDateTime>> {
        let Some(raw) = self.backend.fetch(SCAN_TIME_KEY).map_err(ErrorKind::storage)? else {
            return Ok(None);
        };
        let parsed = raw.split_once(SEP).and_then(|(secs, nanos)| {
            let secs = secs.parse::<i64>().ok()?;
            let nanos = nanos.parse::<u32>().ok()?;
            UtcDateTime::from_unix_timestamp(secs).and_then(|t| t.replace_nanosecond(nanos)).ok()
        });
        if parsed.is_none() {
            tracing::warn!(value = %raw, "Ignoring unreadable scan timestamp");
        }
        Ok(parsed)
    }

    /// Record that a scan completed at `when`.
    pub fn set_scan_time(&mut self, when: UtcDateTime) -> Result<()> {
        let value = format!("{}{SEP}{}", when.unix_timestamp(), when.nanosecond());
        self.backend.replace(SCAN_TIME_KEY, &value).map_err(ErrorKind::storage)
    }

    /// Forget the last scan time so that the next update rescans everything.
    pub fn reset_scan_time(&mut self) -> Result<()> {
        self.backend.delete(SCAN_TIME_KEY).map_err(ErrorKind::storage)?;
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Reclaim space left behind by replaced and deleted records.
    pub fn compact(&mut self) -> Result<()> {
        self.backend.compact().map_err(ErrorKind::storage)
    }

    /// Flush and unlock the cache.
    pub fn close(mut self) -> Result<()> {
        self.backend.close().map_err(ErrorKind::storage)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("path", &self.path()).field("mode", &self.mode()).finish()
    }
}
