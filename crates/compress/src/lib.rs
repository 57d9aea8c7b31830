//! Compression handling for manual page files.
//!
//! Manual pages are routinely installed compressed (`ls.1.gz`, `tar.1.xz`).
//! This crate wraps the decompression libraries behind a unified
//! [`Compression`] enum, providing:
//!
//! - **Suffix detection** from file names ([`Compression::split_suffix`],
//!   [`Compression::from_suffix`]) so that `ls.1.gz` can be taken apart into
//!   the page stem `ls.1` and its compression format.
//! - **Magic byte detection** ([`Compression::from_magic_bytes`]) for
//!   cross-checking a suffix against actual file contents.
//! - **Streaming** via wrapped readers ([`Compression::wrap_reader`],
//!   [`open`]) so that callers can read the first lines of a page without
//!   decompressing the whole thing.
//! - **In-memory** compression/decompression ([`Compression::compress`],
//!   [`Compression::decompress`]), mostly useful for building fixtures.
//!
//! Bzip2 and Gzip are always available. XZ and Zstd are behind feature flags;
//! their suffixes are still *recognised* when the feature is disabled, so
//! that a `.xz` page is never mistaken for a page with section `xz`.

mod construct;
pub mod error;
mod ops;
mod util;

pub use crate::ops::open;
pub use crate::util::KNOWN_SUFFIXES;

/// A supported compression format.
///
/// Variants gated behind feature flags (`xz`, `zstd`) are only available when
/// the corresponding feature is enabled. Defaults to [`None`](Self::None)
/// (uncompressed).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed
    #[default]
    None,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// Gzip compression (.gz)
    Gzip,
    /// XZ/LZMA compression (.xz)
    #[cfg(feature = "xz")]
    Xz,
    /// Zstd compression (.zst)
    #[cfg(feature = "zstd")]
    Zstd,
}
