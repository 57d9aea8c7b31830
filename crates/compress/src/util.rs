use crate::Compression;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Every suffix recognised as "this page is compressed", in probing order.
///
/// Includes formats whose support may not be compiled in: a page named
/// `foo.1.xz` must never be parsed as a page with extension `1.xz`.
pub const KNOWN_SUFFIXES: [&str; 4] = ["gz", "bz2", "xz", "zst"];

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl Compression {
    /// Returns the file suffix for this compression format, without a dot.
    ///
    /// Returns [`None`](Option::None) for uncompressed data.
    #[inline]
    #[must_use]
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Bzip2 => Some("bz2"),
            Compression::Gzip => Some("gz"),
            #[cfg(feature = "xz")]
            Compression::Xz => Some("xz"),
            #[cfg(feature = "zstd")]
            Compression::Zstd => Some("zst"),
        }
    }

    /// Returns the short name for displaying to the user.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Bzip2 => "bzip2",
            Compression::Gzip => "gzip",
            #[cfg(feature = "xz")]
            Compression::Xz => "xz",
            #[cfg(feature = "zstd")]
            Compression::Zstd => "zstd",
        }
    }

    /// Verify that `bytes` start with the expected magic bytes for this format.
    ///
    /// Useful for cross-checking a format detected from a file suffix against
    /// actual file contents.
    #[must_use]
    pub fn check_magic_bytes(&self, bytes: &[u8]) -> bool {
        Self::from_magic_bytes(bytes) == *self
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;

    #[rstest]
    #[case(Compression::None, "none")]
    #[case(Compression::Bzip2, "bzip2")]
    #[case(Compression::Gzip, "gzip")]
    #[cfg_attr(feature = "xz", case(Compression::Xz, "xz"))]
    #[cfg_attr(feature = "zstd", case(Compression::Zstd, "zstd"))]
    fn test_display(#[case] format: Compression, #[case] expected: &str) {
        assert_eq!(format.to_string(), expected);
    }

    #[test]
    fn test_suffix_round_trips_through_from_suffix() {
        for format in [Compression::Bzip2, Compression::Gzip] {
            let suffix = format.suffix().unwrap();
            assert_eq!(Compression::from_suffix(suffix).unwrap(), format);
        }
        assert_eq!(Compression::None.suffix(), None);
    }

    #[test]
    fn test_check_magic_bytes() {
        assert!(Compression::Gzip.check_magic_bytes(&[0x1F, 0x8B, 0x08]));
        assert!(!Compression::Gzip.check_magic_bytes(b".TH"));
        assert!(Compression::None.check_magic_bytes(b".TH"));
    }
}
