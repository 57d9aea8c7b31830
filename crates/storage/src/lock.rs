//! Advisory file locking.
//!
//! Locks are taken with `fs2` and never block: a lock held elsewhere is
//! reported as [`ErrorKind::Locked`] straight away. On Unix these are
//! `flock(2)` locks, which belong to the open file description, so two
//! handles opened by the same process exclude each other just like two
//! processes would.

use crate::OpenMode;
use crate::error::{ErrorKind, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::Path;

/// Acquire the lock appropriate for `mode` on an already-open file.
///
/// Write-capable modes take an exclusive lock, read-only takes a shared lock.
pub(crate) fn acquire(file: &File, mode: OpenMode, path: &Path) -> Result<()> {
    // Fully-qualified: `std::fs::File` grew inherent methods of the same
    // names with different signatures.
    let locked = match mode.is_writable() {
        true => FileExt::try_lock_exclusive(file),
        false => FileExt::try_lock_shared(file),
    };
    match locked {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
            tracing::debug!(path = %path.display(), %mode, "Database lock is held elsewhere");
            exn::bail!(ErrorKind::Locked(path.to_path_buf()))
        },
        Err(err) => exn::bail!(ErrorKind::from_io(err, path)),
    }
}

/// Release a lock taken by [`acquire`]. Failures are logged, not returned:
/// the lock disappears with the file descriptor regardless.
pub(crate) fn release(file: &File, path: &Path) {
    if let Err(err) = FileExt::unlock(file) {
        tracing::warn!(path = %path.display(), error = %err, "Failed to release database lock");
    }
}
