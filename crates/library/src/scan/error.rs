//! Per-file scan errors.
//!
//! Most of these end up as a warning and a skipped file; only
//! [`ErrorKind::Cache`] stops the scan.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A per-file scan error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scanning one file.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The file name doesn't look like `name.ext[.comp]` for this directory.
    #[display("bogus filename: {}", _0.display())]
    BogusFilename(#[error(not(source))] PathBuf),
    /// The page is indexed from a sibling file with another compression
    /// suffix that still exists.
    #[display("competing extensions: {}", _0.display())]
    CompetingExtensions(#[error(not(source))] PathBuf),
    /// The page's ultimate source could not be found.
    #[display("cannot resolve {}", _0.display())]
    Resolve(#[error(not(source))] PathBuf),
    /// The file disappeared or couldn't be inspected.
    #[display("cannot read {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// Reading from or writing to the cache failed.
    #[display("cache error")]
    Cache,
}

impl ErrorKind {
    /// Whether the scan should warn about this file and move on.
    pub fn is_skippable(&self) -> bool {
        !matches!(self, Self::Cache)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
