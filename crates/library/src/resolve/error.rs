//! Error types for the [`resolve`](super) module.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A resolution error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resolution.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a page could not be traced back to its ultimate source.
///
/// None of these are fatal: the page in question is skipped.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A symbolic link points at nothing.
    #[display("dangling symlink: {}", _0.display())]
    Dangling(#[error(not(source))] PathBuf),
    /// Too many `.so` hops, which in practice means a page includes itself.
    #[display("self-referencing .so chain at {}", _0.display())]
    Cycle(#[error(not(source))] PathBuf),
    /// The page or its directory could not be read.
    #[display("cannot read {}", _0.display())]
    Unreadable(#[error(not(source))] PathBuf),
    /// A `.so` request names a file that doesn't exist.
    #[display(".so target not found: {}", _0.display())]
    MissingTarget(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
