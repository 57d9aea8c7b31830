//! Whatis extraction for manual pages.
//!
//! The index cache stores a one-line description for every page, taken from
//! its NAME section. This crate reads that section out of:
//!
//! - **roff sources** written with the `man` macros (`.SH NAME`) or the
//!   `mdoc` macros (`.Sh NAME`, `.Nm`, `.Nd`), and
//! - **formatted pages** (cat pages), with backspace overstriking removed.
//!
//! Pages may be compressed; they are read through [`mandb_compress::open`].
//! Each entry comes back as a `names - description` line, e.g.
//! `printf, fprintf - formatted output conversion`, one line per entry.

mod consts;
mod entries;
pub mod error;
mod formatted;
mod roff;

use crate::consts::FILTER_HINT;
use crate::error::{ErrorKind, Result};
use crate::formatted::FormattedName;
use crate::roff::RoffName;
use exn::ResultExt;
use mandb_compress::Compression;
use std::io::BufRead;
use std::path::Path;
use tracing::instrument;

/// Pages with no NAME section in their first few thousand lines don't have
/// one at all.
const DEFAULT_MAX_LINES: usize = 4096;

/// What was learnt about a page by reading it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// The raw NAME section, one `names - description` entry per line.
    pub whatis: Option<String>,
    /// Preprocessors the page asks for (`t` for tbl, `e` for eqn, ...).
    pub filter: Option<String>,
}

/// Something that can pull whatis text out of a page file.
pub trait WhatisExtractor {
    /// Read the page at `path`, known to users as `name`.
    fn extract(&self, path: &Path, name: &str) -> Result<Extracted>;
}

/// The default extractor, handling roff sources and formatted pages.
#[derive(Debug, Clone, Copy)]
pub struct PageExtractor {
    max_lines: usize,
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self { max_lines: DEFAULT_MAX_LINES }
    }
}

impl PageExtractor {
    /// Give up looking for a NAME section after `max_lines` lines.
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }
}

enum Parser {
    Roff(RoffName),
    Formatted(FormattedName),
}

impl Parser {
    fn detect(first_line: &str) -> Self {
        match first_line.starts_with(['.', '\'']) {
            true => Parser::Roff(RoffName::default()),
            false => Parser::Formatted(FormattedName::default()),
        }
    }

    fn feed(&mut self, line: &str) -> bool {
        match self {
            Parser::Roff(name) => name.feed(line),
            Parser::Formatted(name) => name.feed(line),
        }
    }

    fn finish(self) -> Option<String> {
        match self {
            Parser::Roff(name) if name.found() => name.finish(),
            Parser::Formatted(name) if name.found() => name.finish(),
            _ => None,
        }
    }
}

impl WhatisExtractor for PageExtractor {
    #[instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    fn extract(&self, path: &Path, name: &str) -> Result<Extracted> {
        // Refuse pages we can't decompress instead of parsing compressed bytes.
        if let Some(suffix) = path.file_name().and_then(|n| n.to_str()).and_then(|n| Compression::split_suffix(n).1) {
            Compression::from_suffix(suffix).map_err(ErrorKind::compression)?;
        }
        let mut reader = mandb_compress::open(path).map_err(ErrorKind::compression)?;
        let mut buf = Vec::new();
        let mut filter = None;
        let mut parser: Option<Parser> = None;
        for index in 0..self.max_lines {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
            if read == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if index == 0 {
                filter = FILTER_HINT.captures(line).map(|caps| caps[1].to_string());
            }
            if parser.is_none() && line.trim().is_empty() {
                continue;
            }
            let active = parser.get_or_insert_with(|| Parser::detect(line));
            if !active.feed(line) {
                break;
            }
        }
        let whatis = parser.and_then(Parser::finish);
        if whatis.is_none() {
            tracing::warn!(name, path = %path.display(), "No NAME section found");
        }
        Ok(Extracted { whatis, filter })
    }
}

/// Extract with the default [`PageExtractor`].
pub fn extract(path: impl AsRef<Path>, name: &str) -> Result<Extracted> {
    PageExtractor::default().extract(path.as_ref(), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_extract_source_page_with_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("column.1");
        fs::write(&path, "'\\\" t\n.TH COLUMN 1\n.SH NAME\ncolumn \\- columnate lists\n.SH SYNOPSIS\n").unwrap();
        let extracted = extract(&path, "column").unwrap();
        assert_eq!(extracted.whatis.as_deref(), Some("column - columnate lists"));
        assert_eq!(extracted.filter.as_deref(), Some("t"));
    }

    #[test]
    fn test_extract_compressed_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ls.1.gz");
        let page = b".TH LS 1\n.SH NAME\nls \\- list directory contents\n";
        fs::write(&path, Compression::Gzip.compress(page).unwrap()).unwrap();
        let extracted = extract(&path, "ls").unwrap();
        assert_eq!(extracted.whatis.as_deref(), Some("ls - list directory contents"));
        assert_eq!(extracted.filter, None);
    }

    #[test]
    fn test_extract_formatted_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ls.1");
        fs::write(&path, "\nLS(1)\n\nNAME\n       ls - list directory contents\n\nSYNOPSIS\n").unwrap();
        let extracted = extract(&path, "ls").unwrap();
        assert_eq!(extracted.whatis.as_deref(), Some("ls - list directory contents"));
    }

    #[test]
    fn test_page_without_name_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.1");
        fs::write(&path, ".TH ODD 1\n.SH DESCRIPTION\nodd\n").unwrap();
        assert_eq!(extract(&path, "odd").unwrap(), Extracted::default());
    }

    #[test]
    fn test_line_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.1");
        let mut page = ".TH LONG 1\n".repeat(10);
        page.push_str(".SH NAME\nlong \\- far down\n");
        fs::write(&path, page).unwrap();
        let extracted = PageExtractor::default().with_max_lines(5).extract(&path, "long").unwrap();
        assert_eq!(extracted.whatis, None);
    }

    #[test]
    fn test_missing_page() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract(dir.path().join("gone.1"), "gone").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Compression(_)));
    }
}
