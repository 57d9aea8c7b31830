use std::fmt::{Display, Formatter, Result as FmtResult};

/// How a backend file should be opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Create the file, or empty an existing one. The exclusive lock is taken
    /// *before* the existing contents are discarded.
    CreateTruncate,
    /// Create the file if it does not exist, otherwise open it as-is.
    CreateIfMissing,
    /// Open an existing file for reading and writing.
    ReadWrite,
    /// Open an existing file for reading only, under a shared lock.
    ReadOnly,
}

impl OpenMode {
    /// Whether handles opened in this mode accept mutations (and therefore
    /// require an exclusive lock).
    #[inline]
    #[must_use]
    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::ReadOnly)
    }

    /// Whether opening in this mode may create a missing file.
    #[inline]
    #[must_use]
    pub fn creates(&self) -> bool {
        matches!(self, Self::CreateTruncate | Self::CreateIfMissing)
    }
}

impl Display for OpenMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::CreateTruncate => "create-truncate",
            Self::CreateIfMissing => "create-if-missing",
            Self::ReadWrite => "read-write",
            Self::ReadOnly => "read-only",
        })
    }
}
