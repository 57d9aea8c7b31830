//! Compression Operations

use crate::Compression;
use crate::error::{ErrorKind, Result};
use bzip2::{Compression as BzCompression, read::BzDecoder, write::BzEncoder};
use exn::ResultExt;
use flate2::{Compression as GzCompression, read::GzDecoder, write::GzEncoder};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use tracing::instrument;
#[cfg(feature = "xz")]
use xz2::{read::XzDecoder, write::XzEncoder};
#[cfg(feature = "zstd")]
use zstd::stream::{read::Decoder as ZstdDecoder, write::Encoder as ZstdEncoder};

// Pages are compressed once at install time and read many times; the levels
// here match what distribution packaging tools use by default.
const BZIP2_LEVEL: BzCompression = BzCompression::best();
const GZIP_LEVEL: GzCompression = GzCompression::best();
#[cfg(feature = "xz")]
const XZ_LEVEL: u32 = 6;
#[cfg(feature = "zstd")]
const ZSTD_LEVEL: i32 = 19;

/// Open a page file for line-oriented reading, decompressing on the fly.
///
/// The compression format is chosen from the file's suffix (see
/// [`Compression::from_path`]) and checked against the first bytes of the
/// file. A page without a compression suffix is still decompressed if its
/// contents say it is compressed; a page whose contents contradict its
/// suffix is rejected as [`ErrorKind::InvalidData`].
///
/// # Examples
///
/// ```no_run
/// use std::io::BufRead;
///
/// let mut first = String::new();
/// let mut reader = mandb_compress::open("/usr/share/man/man1/ls.1.gz").unwrap();
/// reader.read_line(&mut first).unwrap();
/// ```
pub fn open(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path).or_raise(|| ErrorKind::Open(path.to_path_buf()))?;
    let mut reader = BufReader::new(file);
    let head = reader.fill_buf().or_raise(|| ErrorKind::Io)?;
    let format = match Compression::from_path(path) {
        Compression::None => Compression::from_magic_bytes(head),
        format if format.check_magic_bytes(head) => format,
        format => {
            tracing::debug!(path = %path.display(), %format, "Contents don't match the compression suffix");
            exn::bail!(ErrorKind::InvalidData)
        },
    };
    Ok(Box::new(BufReader::new(format.wrap_reader(reader)?)))
}

impl Compression {
    /// Compress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use mandb_compress::Compression;
    ///
    /// let page = b".TH LS 1\n.SH NAME\nls \\- list directory contents\n";
    /// let compressed = Compression::Gzip.compress(page).unwrap();
    /// assert!(Compression::Gzip.check_magic_bytes(&compressed));
    /// ```
    #[instrument(skip(input), fields(format = %self, input_size = input.len()))]
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        {
            let mut writer = self.wrap_writer(&mut output)?;
            writer.write_all(input).or_raise(|| ErrorKind::Io)?;
            writer.flush().or_raise(|| ErrorKind::Io)?;
        }
        Ok(output)
    }

    /// Decompress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mandb_compress::Compression;
    ///
    /// let original = b".so man1/ls.1\n";
    /// let compressed = Compression::Bzip2.compress(original).unwrap();
    /// let decompressed = Compression::Bzip2.decompress(&compressed).unwrap();
    /// assert_eq!(decompressed, original);
    /// ```
    #[instrument(skip(input), fields(format = %self, input_size = input.len()))]
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.wrap_reader(input)?.read_to_end(&mut output).or_raise(|| ErrorKind::InvalidData)?;
        Ok(output)
    }

    /// Wrap a reader with the appropriate decompression layer.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::{Cursor, Read};
    /// use mandb_compress::Compression;
    ///
    /// let compressed = Compression::Gzip.compress(b"hello").unwrap();
    /// let mut reader = Compression::Gzip.wrap_reader(Cursor::new(compressed)).unwrap();
    /// let mut decompressed = Vec::new();
    /// reader.read_to_end(&mut decompressed).unwrap();
    /// assert_eq!(decompressed, b"hello");
    /// ```
    pub fn wrap_reader<'a, R: Read + 'a>(&self, reader: R) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => Box::new(reader),
            Compression::Bzip2 => Box::new(BzDecoder::new(reader)),
            Compression::Gzip => Box::new(GzDecoder::new(reader)),
            #[cfg(feature = "xz")]
            Compression::Xz => Box::new(XzDecoder::new(reader)),
            #[cfg(feature = "zstd")]
            Compression::Zstd => Box::new(ZstdDecoder::new(reader).or_raise(|| ErrorKind::Decoder)?),
        })
    }

    /// Wrap a writer with the appropriate compression layer.
    ///
    /// The compressed stream is finalised when the returned writer is dropped.
    pub fn wrap_writer<'a, W: Write + 'a>(&self, writer: W) -> Result<Box<dyn Write + 'a>> {
        Ok(match self {
            Compression::None => Box::new(writer),
            Compression::Bzip2 => Box::new(BzEncoder::new(writer, BZIP2_LEVEL)),
            Compression::Gzip => Box::new(GzEncoder::new(writer, GZIP_LEVEL)),
            #[cfg(feature = "xz")]
            Compression::Xz => Box::new(XzEncoder::new(writer, XZ_LEVEL)),
            #[cfg(feature = "zstd")]
            Compression::Zstd => {
                Box::new(ZstdEncoder::new(writer, ZSTD_LEVEL).or_raise(|| ErrorKind::Decoder)?.auto_finish())
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use crate::error::ErrorKind;
    use rstest::rstest;
    use std::io::{BufRead, Read};

    const PAGE: &[u8] = b".\\\" comment\n.TH LS 1\n.SH NAME\nls \\- list directory contents\n";

    #[rstest]
    #[case(Compression::None)]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    #[cfg_attr(feature = "xz", case(Compression::Xz))]
    #[cfg_attr(feature = "zstd", case(Compression::Zstd))]
    fn test_compress_decompress(#[case] format: Compression) {
        let compressed = format.compress(PAGE).unwrap();
        assert_eq!(format.decompress(&compressed).unwrap(), PAGE);
    }

    #[rstest]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    #[cfg_attr(feature = "xz", case(Compression::Xz))]
    #[cfg_attr(feature = "zstd", case(Compression::Zstd))]
    fn test_invalid_compressed_data(#[case] format: Compression) {
        assert!(format.decompress(b"This is not compressed data").is_err());
    }

    #[rstest]
    #[case(Compression::None)]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    fn test_wrap_reader(#[case] format: Compression) {
        let compressed = format.compress(PAGE).unwrap();
        let mut reader = format.wrap_reader(std::io::Cursor::new(compressed)).unwrap();
        let mut decompressed = Vec::new();
        reader.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, PAGE);
    }

    #[rstest]
    #[case("ls.1", Compression::None)]
    #[case("ls.1.gz", Compression::Gzip)]
    #[case("ls.1.bz2", Compression::Bzip2)]
    fn test_open_reads_lines_through_decompression(#[case] name: &str, #[case] format: Compression) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, format.compress(PAGE).unwrap()).unwrap();
        let lines: Vec<String> = crate::open(&path).unwrap().lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], ".TH LS 1");
    }

    #[test]
    fn test_open_detects_unsuffixed_compression() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ls.1");
        std::fs::write(&path, Compression::Gzip.compress(PAGE).unwrap()).unwrap();
        let first = crate::open(&path).unwrap().lines().next().unwrap().unwrap();
        assert_eq!(first, ".\\\" comment");
    }

    #[test]
    fn test_open_rejects_mismatched_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ls.1.gz");
        std::fs::write(&path, PAGE).unwrap();
        let err = crate::open(&path).err().unwrap();
        assert_eq!(*err, ErrorKind::InvalidData);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.1.gz");
        let err = crate::open(&path).err().unwrap();
        assert_eq!(*err, ErrorKind::Open(path));
    }
}
