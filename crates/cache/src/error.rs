//! Cache Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Storage failures are folded into the three outcomes a
//! caller can act on: the cache is unavailable (carry on without it), the
//! cache is from an incompatible version (rebuild it), or the cache is corrupt.

use derive_more::{Display, Error};
use mandb_storage::error::{Error as StorageError, ErrorKind as StorageErrorKind};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The cache cannot be opened right now (missing, locked or inaccessible).
    #[display("cache unavailable")]
    Unavailable,
    /// The cache carries no version marker, or a different one.
    #[display("cache version mismatch (found {})", _0.as_deref().unwrap_or("nothing"))]
    VersionMismatch(#[error(not(source))] Option<String>),
    /// Stored data violates the cache's invariants.
    #[display("corrupt cache: {_0}")]
    Corrupt(#[error(not(source))] String),
    /// A record was rejected before it reached storage.
    #[display("invalid record: {_0}")]
    InvalidRecord(#[error(not(source))] String),
    /// Any other storage failure (I/O, writes through a read-only handle, ...).
    #[display("storage error")]
    Storage,
}

impl ErrorKind {
    /// Wrap a storage error, keeping its frame as a child and classifying it
    /// so callers don't need to reach into the storage crate's kinds.
    #[track_caller]
    pub fn storage(err: StorageError) -> Error {
        let kind = match &*err {
            kind if kind.is_unavailable() => ErrorKind::Unavailable,
            StorageErrorKind::Corrupt(reason) => ErrorKind::Corrupt(reason.clone()),
            _ => ErrorKind::Storage,
        };
        err.raise(kind)
    }

    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt(reason.into())
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Returns `true` if the cache can't be used as-is but nothing is broken:
    /// readers should skip it, writers may recreate it.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable | Self::VersionMismatch(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_storage_errors_are_classified() {
        let locked: StorageError = StorageErrorKind::Locked(PathBuf::from("/var/cache/man/index.db")).into();
        assert!(matches!(&*ErrorKind::storage(locked), ErrorKind::Unavailable));
        let corrupt: StorageError = StorageErrorKind::Corrupt("bad magic".to_string()).into();
        assert!(matches!(&*ErrorKind::storage(corrupt), ErrorKind::Corrupt(reason) if reason == "bad magic"));
        let closed: StorageError = StorageErrorKind::Closed.into();
        assert!(matches!(&*ErrorKind::storage(closed), ErrorKind::Storage));
    }

    #[test]
    fn test_version_mismatch_is_unavailable_not_retryable() {
        let kind = ErrorKind::VersionMismatch(Some("2.4.0".to_string()));
        assert!(kind.is_unavailable());
        assert!(!kind.is_retryable());
        assert_eq!(kind.to_string(), "cache version mismatch (found 2.4.0)");
        assert_eq!(ErrorKind::VersionMismatch(None).to_string(), "cache version mismatch (found nothing)");
    }
}
