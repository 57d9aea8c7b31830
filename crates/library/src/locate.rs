//! Finding the files behind a `(name, extension)` pair.

use glob::{MatchOptions, Pattern};
use mandb_compress::Compression;
use std::path::{Path, PathBuf};

/// Looks for the page files that could back a cache record.
pub trait PageLocator {
    /// Paths under `root` holding page `name` with `extension`: source pages
    /// under `manN`, or formatted pages under `catN` when `formatted` is set.
    fn find(&self, root: &Path, extension: &str, name: &str, formatted: bool) -> Vec<PathBuf>;

    fn exists(&self, root: &Path, extension: &str, name: &str, formatted: bool) -> bool {
        !self.find(root, extension, name, formatted).is_empty()
    }
}

/// Finds pages with `glob`, in the `manN/name.ext[.gz]` layout and the
/// older `manNx/name.ext` layout with per-subsection directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobLocator;

impl PageLocator for GlobLocator {
    fn find(&self, root: &Path, extension: &str, name: &str, formatted: bool) -> Vec<PathBuf> {
        let Some(section) = extension.chars().next() else {
            return Vec::new();
        };
        let prefix = if formatted { "cat" } else { "man" };
        let wanted = format!("{name}.{extension}");
        let Some(root_str) = root.to_str() else {
            tracing::warn!(root = %root.display(), "Hierarchy path is not valid UTF-8");
            return Vec::new();
        };
        let pattern = Path::new(&Pattern::escape(root_str))
            .join(format!("{prefix}{}*", Pattern::escape(&section.to_string())))
            .join(format!("{}*", Pattern::escape(&wanted)));
        let pattern = format!("{}", pattern.display());
        let options = MatchOptions { case_sensitive: true, require_literal_separator: true, require_literal_leading_dot: true };
        let Ok(paths) = glob::glob_with(&pattern, options) else {
            tracing::warn!(pattern, "Invalid page search pattern");
            return Vec::new();
        };
        // `ls.1*` also matches `ls.1x` and `ls.1.bak`; keep exact names and
        // their compressed forms only.
        paths
            .filter_map(|entry| entry.ok())
            .filter(|path| {
                path.file_name()
                    .and_then(|file_name| file_name.to_str())
                    .is_some_and(|file_name| Compression::split_suffix(file_name).0 == wanted)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_find_source_pages() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "man1/ls.1.gz");
        touch(dir.path(), "man1/ls.1x");
        touch(dir.path(), "man1/lsof.1");
        touch(dir.path(), "cat1/ls.1");
        let found = GlobLocator.find(dir.path(), "1", "ls", false);
        assert_eq!(found, [dir.path().join("man1/ls.1.gz")]);
        assert!(GlobLocator.exists(dir.path(), "1x", "ls", false));
        assert!(!GlobLocator.exists(dir.path(), "8", "ls", false));
    }

    #[test]
    fn test_find_formatted_pages() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "cat1/ls.1.bz2");
        assert_eq!(GlobLocator.find(dir.path(), "1", "ls", true), [dir.path().join("cat1/ls.1.bz2")]);
        assert!(GlobLocator.find(dir.path(), "1", "ls", false).is_empty());
    }

    #[test]
    fn test_subsection_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "man3p/open.3p");
        assert!(GlobLocator.exists(dir.path(), "3p", "open", false));
    }

    #[test]
    fn test_glob_characters_in_names() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "man1/[.1");
        touch(dir.path(), "man1/a.1");
        assert_eq!(GlobLocator.find(dir.path(), "1", "[", false), [dir.path().join("man1/[.1")]);
        assert!(!GlobLocator.exists(dir.path(), "1", "?", false));
    }

    #[test]
    fn test_glob_characters_in_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("share [local]*?");
        touch(&root, "man1/ls.1");
        assert_eq!(GlobLocator.find(&root, "1", "ls", false), [root.join("man1/ls.1")]);
        assert!(!GlobLocator.exists(&root, "1", "cat", false));
    }
}
