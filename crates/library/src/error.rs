//! Library Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Per-file problems never surface here: the scanner logs
//! and skips them. What does surface is either "this hierarchy's cache can't
//! be used right now" or a genuine failure.

use derive_more::{Display, Error};
use mandb_cache::error::Error as CacheError;
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The cache at this path is locked, inaccessible or can't be created;
    /// carry on without it.
    #[display("cache unavailable: {}", _0.display())]
    Unavailable(#[error(not(source))] PathBuf),
    /// A cache operation failed; rebuilding the cache is the way out.
    #[display("cache error")]
    Cache,
    /// A hierarchy directory could not be listed.
    #[display("cannot read directory {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// Scanning a file failed in a way that can't be skipped.
    #[display("scan failed at {}", _0.display())]
    Scan(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Convert a cache error, keeping it as a child and lifting its
    /// "unavailable" classification.
    #[track_caller]
    pub(crate) fn cache(err: CacheError, path: impl Into<PathBuf>) -> Error {
        match err.is_unavailable() {
            true => err.raise(ErrorKind::Unavailable(path.into())),
            false => err.raise(ErrorKind::Cache),
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Returns `true` if the hierarchy should simply be skipped this run.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
