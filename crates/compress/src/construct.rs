use crate::Compression;
use crate::error::{ErrorKind, Result};
use crate::util::KNOWN_SUFFIXES;
use std::path::Path;

const BZIP2_MAGIC: [u8; 3] = [0x42, 0x5A, 0x68];
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
#[cfg(feature = "xz")]
const XZ_MAGIC: [u8; 6] = [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];
#[cfg(feature = "zstd")]
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

impl Compression {
    /// Map a file suffix (without the leading dot) to a compression format.
    ///
    /// Suffixes are case-sensitive, the same way they are on disk: `ls.1.GZ`
    /// is a page with extension `GZ`, not a gzipped page.
    pub fn from_suffix(suffix: &str) -> Result<Self> {
        match suffix {
            "bz2" => Ok(Compression::Bzip2),
            "gz" => Ok(Compression::Gzip),
            #[cfg(feature = "xz")]
            "xz" => Ok(Compression::Xz),
            #[cfg(not(feature = "xz"))]
            "xz" => exn::bail!(ErrorKind::DisabledFormat(suffix.to_string())),
            #[cfg(feature = "zstd")]
            "zst" => Ok(Compression::Zstd),
            #[cfg(not(feature = "zstd"))]
            "zst" => exn::bail!(ErrorKind::DisabledFormat(suffix.to_string())),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(suffix.to_string())),
        }
    }

    /// Split a file name into its stem and recognised compression suffix.
    ///
    /// Only suffixes listed in [`KNOWN_SUFFIXES`] are split off, regardless of
    /// which formats were compiled in. The returned suffix does not include
    /// the dot.
    ///
    /// ```
    /// use mandb_compress::Compression;
    ///
    /// assert_eq!(Compression::split_suffix("ls.1.gz"), ("ls.1", Some("gz")));
    /// assert_eq!(Compression::split_suffix("ls.1"), ("ls.1", None));
    /// assert_eq!(Compression::split_suffix("gz"), ("gz", None));
    /// ```
    #[must_use]
    pub fn split_suffix(file_name: &str) -> (&str, Option<&str>) {
        match file_name.rsplit_once('.') {
            Some((stem, suffix)) if !stem.is_empty() && KNOWN_SUFFIXES.contains(&suffix) => (stem, Some(suffix)),
            _ => (file_name, None),
        }
    }

    /// Detect compression from a path's suffix.
    ///
    /// Unrecognised, disabled, or missing suffixes are all treated as
    /// uncompressed.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| Self::split_suffix(name).1)
            .and_then(|suffix| Self::from_suffix(suffix).ok())
            .unwrap_or(Compression::None)
    }

    /// Detect compression format from magic bytes.
    ///
    /// Returns the `None` variant if no magic bytes match or if the input is
    /// too short to detect any format.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        if bytes.starts_with(&BZIP2_MAGIC) {
            return Compression::Bzip2;
        }
        if bytes.starts_with(&GZIP_MAGIC) {
            return Compression::Gzip;
        }
        #[cfg(feature = "xz")]
        if bytes.starts_with(&XZ_MAGIC) {
            return Compression::Xz;
        }
        #[cfg(feature = "zstd")]
        if bytes.starts_with(&ZSTD_MAGIC) {
            return Compression::Zstd;
        }
        Compression::None
    }
}
