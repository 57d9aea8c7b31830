//! Storage Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Database file does not exist (and the open mode does not create it).
    #[display("database not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied by filesystem permissions.
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Another handle holds an incompatible lock on the database file.
    #[display("database locked: {}", _0.display())]
    Locked(#[error(not(source))] PathBuf),
    /// A mutation was attempted through a read-only handle.
    #[display("database opened read-only: {}", _0.display())]
    ReadOnly(#[error(not(source))] PathBuf),
    /// The handle has already been closed.
    #[display("database handle is closed")]
    Closed,
    /// On-disk data failed validation somewhere other than a torn tail.
    #[display("corrupt database: {_0}")]
    Corrupt(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Locked(_))
    }

    /// Returns `true` if the database simply cannot be used right now, as
    /// opposed to being broken. Callers are expected to carry on without it.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::PermissionDenied(_) | Self::Locked(_))
    }

    pub(crate) fn from_io(err: IoError, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.into()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.into()),
            _ => Self::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_are_classified() {
        let missing = ErrorKind::from_io(IoError::from(std::io::ErrorKind::NotFound), "/cache/index.db");
        assert!(matches!(missing, ErrorKind::NotFound(ref p) if p == &PathBuf::from("/cache/index.db")));
        assert!(missing.is_unavailable());
        let denied = ErrorKind::from_io(IoError::from(std::io::ErrorKind::PermissionDenied), "/cache/index.db");
        assert!(denied.is_unavailable());
        let other = ErrorKind::from_io(IoError::from(std::io::ErrorKind::InvalidData), "/cache/index.db");
        assert!(!other.is_unavailable());
        assert!(other.is_retryable());
    }

    #[test]
    fn test_corruption_is_not_unavailability() {
        assert!(!ErrorKind::Corrupt("bad checksum".into()).is_unavailable());
        assert!(!ErrorKind::Corrupt("bad checksum".into()).is_retryable());
    }
}
