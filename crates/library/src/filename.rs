//! Splitting page file names into their parts.

use crate::scan::error::{ErrorKind, Result};
use mandb_cache::RESERVED_PREFIX;
use mandb_compress::Compression;
use std::path::Path;

/// The parts of a page file name such as `printf.3p.gz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageName<'a> {
    pub name: &'a str,
    /// Section plus subsection (`3p`).
    pub extension: &'a str,
    /// Compression suffix, without the dot (`gz`).
    pub compression: Option<&'a str>,
}

impl<'a> PageName<'a> {
    /// Parse the name of a file found in the directory for `section`.
    ///
    /// The extension must start with the directory's section: `ls.1` is fine
    /// in `man1` but bogus in `man8`.
    pub fn parse(path: &'a Path, section: &str) -> Result<Self> {
        let bogus = || ErrorKind::BogusFilename(path.to_path_buf());
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            exn::bail!(bogus());
        };
        let (stem, compression) = Compression::split_suffix(file_name);
        let Some((name, extension)) = stem.rsplit_once('.') else {
            exn::bail!(bogus());
        };
        if name.is_empty()
            || extension.is_empty()
            || section.is_empty()
            || !extension.starts_with(section)
            || name.starts_with(RESERVED_PREFIX)
            || file_name.contains('\t')
        {
            exn::bail!(bogus());
        }
        Ok(Self { name, extension, compression })
    }
}
