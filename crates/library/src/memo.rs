//! Whatis text already extracted during the current scan.

use mandb_extract::{Extracted, WhatisExtractor};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maps an ultimate source path to what was extracted from it.
///
/// Many pages resolve to the same source (every `.so` stub and link to
/// `printf.3` does), so each source is read once per scan. The table belongs
/// to one hierarchy at a time and must be [cleared](Memo::clear) before
/// moving on to the next.
#[derive(Debug, Default)]
pub struct Memo {
    entries: HashMap<PathBuf, Extracted>,
}

impl Memo {
    /// The extraction for `source`, running `extractor` on a miss.
    ///
    /// Failed extractions are remembered as empty, the same as a page without
    /// a NAME section: trying again within the same scan won't help.
    pub fn get_or_extract(&mut self, source: &Path, name: &str, extractor: &dyn WhatisExtractor) -> &Extracted {
        self.entries.entry(source.to_path_buf()).or_insert_with(|| {
            extractor.extract(source, name).unwrap_or_else(|err| {
                tracing::warn!(path = %source.display(), error = %err, "Cannot extract whatis");
                Extracted::default()
            })
        })
    }

    pub fn get(&self, source: &Path) -> Option<&Extracted> {
        self.entries.get(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandb_extract::error::{ErrorKind, Result};
    use std::cell::Cell;

    #[derive(Default)]
    struct Counting {
        calls: Cell<usize>,
    }

    impl WhatisExtractor for Counting {
        fn extract(&self, path: &Path, _name: &str) -> Result<Extracted> {
            self.calls.set(self.calls.get() + 1);
            if path.ends_with("broken.1") {
                exn::bail!(ErrorKind::Unreadable(path.to_path_buf()));
            }
            Ok(Extracted { whatis: Some(format!("{} - a page", path.display())), filter: None })
        }
    }

    #[test]
    fn test_each_source_is_extracted_once() {
        let extractor = Counting::default();
        let mut memo = Memo::default();
        let first = memo.get_or_extract(Path::new("/man/man3/printf.3"), "printf", &extractor).clone();
        let again = memo.get_or_extract(Path::new("/man/man3/printf.3"), "fprintf", &extractor).clone();
        assert_eq!(first, again);
        assert_eq!(extractor.calls.get(), 1);
        memo.get_or_extract(Path::new("/man/man1/ls.1"), "ls", &extractor);
        assert_eq!(extractor.calls.get(), 2);
        assert_eq!(memo.len(), 2);
    }

    #[test]
    fn test_failures_are_remembered_as_empty() {
        let extractor = Counting::default();
        let mut memo = Memo::default();
        let path = Path::new("/man/man1/broken.1");
        assert_eq!(memo.get_or_extract(path, "broken", &extractor), &Extracted::default());
        memo.get_or_extract(path, "broken", &extractor);
        assert_eq!(extractor.calls.get(), 1);
        assert_eq!(memo.get(path), Some(&Extracted::default()));
    }

    #[test]
    fn test_clear() {
        let extractor = Counting::default();
        let mut memo = Memo::default();
        memo.get_or_extract(Path::new("/man/man1/ls.1"), "ls", &extractor);
        memo.clear();
        assert!(memo.is_empty());
        memo.get_or_extract(Path::new("/man/man1/ls.1"), "ls", &extractor);
        assert_eq!(extractor.calls.get(), 2);
    }
}
