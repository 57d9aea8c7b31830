//! Bringing a hierarchy's cache up to date with the files on disk.
//!
//! The scanner walks the `manN` (and optionally `catN`) directories of one
//! hierarchy, skipping any directory that hasn't changed since the last
//! recorded scan, and stores a record for every page it finds plus one
//! alias record for every other name the page documents.

pub mod error;
mod file;

use crate::error::{ErrorKind, Result};
use crate::memo::Memo;
use crate::privs::{NoPrivileges, Privileges, Scope};
use crate::resolve::{DEFAULT_MAX_DEPTH, Resolver};
use exn::ResultExt;
use mandb_cache::Database;
use mandb_config::{Config, Hierarchy};
use mandb_extract::WhatisExtractor;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tracing::instrument;

/// Page directories are `man1`, `man3p`, ...; formatted pages live in `cat1`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DirKind {
    Source,
    Formatted,
}

impl DirKind {
    fn prefix(self) -> &'static str {
        match self {
            DirKind::Source => "man",
            DirKind::Formatted => "cat",
        }
    }
}

/// Tunables for [`Scanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Sections to scan, in order. Empty means every section directory found.
    pub sections: Vec<String>,
    /// Also index formatted pages that have no source page.
    pub stray_cats: bool,
    /// Maximum `.so` recursion depth.
    pub so_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { sections: Vec::new(), stray_cats: true, so_depth: DEFAULT_MAX_DEPTH }
    }
}

impl From<&Config> for ScanOptions {
    fn from(config: &Config) -> Self {
        Self { sections: config.sections.clone(), stray_cats: config.stray_cats, so_depth: config.so_depth }
    }
}

/// What one [`Scanner::scan`] pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Directories in which at least one record was added, replaced or removed.
    pub changed_dirs: usize,
    /// Records inserted or replaced.
    pub stored: usize,
    /// Records that were already up to date, or lost to a higher precedence.
    pub unchanged: usize,
    /// Stale records dropped because their file changed compression.
    pub removed: usize,
    /// Files skipped with a warning.
    pub skipped: usize,
}

/// Scans hierarchies into their caches.
///
/// One scanner can be used for several hierarchies in turn, as long as
/// [`clear_memo`](Scanner::clear_memo) is called in between.
pub struct Scanner<'a> {
    extractor: &'a dyn WhatisExtractor,
    privileges: &'a dyn Privileges,
    memo: Memo,
    options: ScanOptions,
}

impl<'a> Scanner<'a> {
    pub fn new(extractor: &'a dyn WhatisExtractor) -> Self {
        Self { extractor, privileges: &NoPrivileges, memo: Memo::default(), options: ScanOptions::default() }
    }

    pub fn with_privileges(mut self, privileges: &'a dyn Privileges) -> Self {
        self.privileges = privileges;
        self
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Forget every whatis extracted so far. Call this between hierarchies.
    pub fn clear_memo(&mut self) {
        self.memo.clear();
    }

    /// Scan `hierarchy` into `db`.
    ///
    /// Without `force`, only directories modified since the cache's last
    /// recorded scan are visited. The scan time is recorded after every
    /// directory that changed something, and at the end of a full scan.
    #[instrument(level = "debug", skip_all, fields(root = %hierarchy.root.display(), force))]
    pub fn scan(&mut self, db: &mut Database, hierarchy: &Hierarchy, force: bool) -> Result<ScanReport> {
        let root = hierarchy.root.as_path();
        let _scope = (!hierarchy.system).then(|| Scope::enter(self.privileges));
        let last = match force {
            true => None,
            false => db.scan_time().map_err(|err| ErrorKind::cache(err, root))?,
        };
        let started = UtcDateTime::now();
        let resolver = Resolver::new(root).with_max_depth(self.options.so_depth);
        let mut report = ScanReport::default();

        let mut kinds = vec![DirKind::Source];
        if self.options.stray_cats {
            kinds.push(DirKind::Formatted);
        }
        for kind in kinds {
            for (section, dir) in self.section_dirs(root, kind)? {
                if !modified_since(&dir, last) {
                    tracing::trace!(dir = %dir.display(), "Unchanged since last scan");
                    continue;
                }
                if self.scan_dir(db, &resolver, &dir, &section, kind, &mut report)? {
                    report.changed_dirs += 1;
                    db.set_scan_time(started).map_err(|err| ErrorKind::cache(err, root))?;
                }
            }
        }
        if last.is_none() {
            db.set_scan_time(started).map_err(|err| ErrorKind::cache(err, root))?;
        }
        tracing::info!(
            root = %root.display(),
            changed_dirs = report.changed_dirs,
            stored = report.stored,
            skipped = report.skipped,
            "Scanned hierarchy"
        );
        Ok(report)
    }

    /// The `(section, directory)` pairs to visit, in scanning order.
    fn section_dirs(&self, root: &Path, kind: DirKind) -> Result<Vec<(String, PathBuf)>> {
        if !self.options.sections.is_empty() {
            let dirs = self
                .options
                .sections
                .iter()
                .map(|section| (section.clone(), root.join(format!("{}{section}", kind.prefix()))))
                .filter(|(_, dir)| dir.is_dir())
                .collect();
            return Ok(dirs);
        }
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(root = %root.display(), "Hierarchy does not exist");
                return Ok(Vec::new());
            },
            Err(err) => return Err(err).or_raise(|| ErrorKind::Io(root.to_path_buf())),
        };
        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.or_raise(|| ErrorKind::Io(root.to_path_buf()))?;
            let file_name = entry.file_name();
            let Some(section) = file_name.to_str().and_then(|name| name.strip_prefix(kind.prefix())) else {
                continue;
            };
            if !section.is_empty() && entry.path().is_dir() {
                dirs.push((section.to_string(), entry.path()));
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Scan every file in one section directory. Returns whether the cache
    /// changed.
    fn scan_dir(
        &mut self,
        db: &mut Database,
        resolver: &Resolver,
        dir: &Path,
        section: &str,
        kind: DirKind,
        report: &mut ScanReport,
    ) -> Result<bool> {
        let mut paths = match list_files(dir) {
            Ok(paths) => paths,
            Err(err) => {
                tracing::warn!(dir = %dir.display(), error = %err, "Cannot read section directory");
                return Ok(false);
            },
        };
        paths.sort();
        let before = (report.stored, report.removed);
        for path in &paths {
            let scanned = match kind {
                DirKind::Source => self.scan_page(db, resolver, path, section, report),
                DirKind::Formatted => self.scan_formatted(db, resolver, path, section, report),
            };
            match scanned {
                Ok(()) => {},
                Err(err) if err.is_skippable() => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping page");
                    report.skipped += 1;
                },
                Err(err) => return Err(err).or_raise(|| ErrorKind::Scan(path.clone())),
            }
        }
        Ok((report.stored, report.removed) != before)
    }
}

fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            paths.push(entry.path());
        }
    }
    Ok(paths)
}

/// Whether `dir` changed after `last`. Anything that can't be checked
/// counts as changed.
fn modified_since(dir: &Path, last: Option<UtcDateTime>) -> bool {
    let Some(last) = last else {
        return true;
    };
    match fs::metadata(dir).and_then(|meta| meta.modified()) {
        Ok(modified) => UtcDateTime::from(modified) > last,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privs::tests::Recording;
    use mandb_cache::{Kind, PageRecord};
    use mandb_compress::Compression;
    use mandb_extract::PageExtractor;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    const LS: &str = ".TH LS 1\n.SH NAME\nls \\- list directory contents\n.SH SYNOPSIS\n";
    const PRINTF: &str = ".TH PRINTF 3\n.SH NAME\nprintf, fprintf, $bogus$ \\- formatted output conversion\n";

    fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn hierarchy() -> (TempDir, Hierarchy) {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "man1/ls.1", LS.as_bytes());
        write(dir.path(), "man1/dir.1", b".so man1/ls.1\n");
        write(dir.path(), "man3/printf.3", PRINTF.as_bytes());
        write(dir.path(), "man1/README", b"not a page");
        write(dir.path(), "man1/route.8", b".TH ROUTE 8\n");
        let hierarchy = Hierarchy::new(dir.path()).system();
        (dir, hierarchy)
    }

    fn database() -> Database {
        Database::with_backend(Box::new(mandb_storage::MemoryBackend::default())).unwrap()
    }

    fn only(db: &Database, name: &str, ext: &str) -> PageRecord {
        db.get(name, ext).unwrap().unwrap_or_else(|| panic!("no record for {name}({ext})"))
    }

    fn backdate(dir: &Path, by: Duration) {
        fs::File::open(dir).unwrap().set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn test_full_scan() {
        let (_dir, hierarchy) = hierarchy();
        let extractor = PageExtractor::default();
        let mut db = database();
        let report = Scanner::new(&extractor).scan(&mut db, &hierarchy, false).unwrap();

        assert_eq!(report.changed_dirs, 2);
        assert_eq!(report.skipped, 2);
        let ls = only(&db, "ls", "1");
        assert_eq!(ls.kind, Kind::SourcePage);
        assert_eq!(ls.whatis.as_deref(), Some("list directory contents"));
        let dir = only(&db, "dir", "1");
        assert_eq!(dir.kind, Kind::SourceAlias);
        assert_eq!(dir.pointer.as_deref(), Some("ls"));
        assert_eq!(dir.whatis, None);
        let fprintf = only(&db, "fprintf", "3");
        assert_eq!(fprintf.kind, Kind::NameAlias);
        assert_eq!(fprintf.pointer.as_deref(), Some("printf"));
        assert_eq!(fprintf.whatis, None);
        assert_eq!(only(&db, "printf", "3").whatis.as_deref(), Some("formatted output conversion"));
        assert_eq!(db.records().unwrap().len(), 4);
        assert!(db.scan_time().unwrap().is_some());
    }

    #[test]
    fn test_rescan_skips_unchanged_directories() {
        let (_dir, hierarchy) = hierarchy();
        let extractor = PageExtractor::default();
        let mut db = database();
        let mut scanner = Scanner::new(&extractor);
        scanner.scan(&mut db, &hierarchy, false).unwrap();

        let report = scanner.scan(&mut db, &hierarchy, false).unwrap();
        assert_eq!(report, ScanReport::default());

        let report = scanner.scan(&mut db, &hierarchy, true).unwrap();
        assert_eq!(report.changed_dirs, 0);
        assert_eq!(report.stored, 0);
        assert!(report.unchanged > 0);
    }

    #[test]
    fn test_only_modified_directories_are_rescanned() {
        let (dir, hierarchy) = hierarchy();
        let extractor = PageExtractor::default();
        let mut db = database();
        let mut scanner = Scanner::new(&extractor);
        scanner.scan(&mut db, &hierarchy, false).unwrap();

        let hour = Duration::from_secs(3600);
        db.set_scan_time(UtcDateTime::from(SystemTime::now() - hour)).unwrap();
        write(dir.path(), "man1/cp.1", b".TH CP 1\n.SH NAME\ncp \\- copy files\n");
        write(dir.path(), "man3/puts.3", b".TH PUTS 3\n.SH NAME\nputs \\- output a line\n");
        backdate(&dir.path().join("man3"), 2 * hour);

        let report = scanner.scan(&mut db, &hierarchy, false).unwrap();
        assert_eq!(report.changed_dirs, 1);
        assert_eq!(only(&db, "cp", "1").whatis.as_deref(), Some("copy files"));
        assert_eq!(db.get("puts", "3").unwrap(), None);
    }

    #[test]
    fn test_competing_extensions() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "man1/ls.1", LS.as_bytes());
        write(dir.path(), "man1/ls.1.gz", &Compression::Gzip.compress(LS.as_bytes()).unwrap());
        let extractor = PageExtractor::default();
        let mut db = database();
        let report = Scanner::new(&extractor).scan(&mut db, &Hierarchy::new(dir.path()), false).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(only(&db, "ls", "1").compression, None);
    }

    #[test]
    fn test_recompressed_page_replaces_stale_record() {
        let dir = tempfile::tempdir().unwrap();
        let plain = write(dir.path(), "man1/ls.1", LS.as_bytes());
        let extractor = PageExtractor::default();
        let hierarchy = Hierarchy::new(dir.path());
        let mut db = database();
        let mut scanner = Scanner::new(&extractor);
        scanner.scan(&mut db, &hierarchy, false).unwrap();

        fs::remove_file(plain).unwrap();
        write(dir.path(), "man1/ls.1.gz", &Compression::Gzip.compress(LS.as_bytes()).unwrap());
        scanner.clear_memo();
        let report = scanner.scan(&mut db, &hierarchy, true).unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(report.changed_dirs, 1);
        let ls = only(&db, "ls", "1");
        assert_eq!(ls.compression.as_deref(), Some("gz"));
        assert_eq!(ls.whatis.as_deref(), Some("list directory contents"));
    }

    #[test]
    fn test_stray_cats() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "man1/ls.1", LS.as_bytes());
        write(dir.path(), "cat1/ls.1", b"LS(1)\n\nNAME\n       ls - list directory contents\n");
        write(dir.path(), "cat1/foo.1", b"FOO(1)\n\nNAME\n       foo, bar - do foo things\n");
        let extractor = PageExtractor::default();
        let hierarchy = Hierarchy::new(dir.path());

        let mut db = database();
        Scanner::new(&extractor).scan(&mut db, &hierarchy, false).unwrap();
        assert_eq!(only(&db, "ls", "1").kind, Kind::SourcePage);
        let foo = only(&db, "foo", "1");
        assert_eq!(foo.kind, Kind::FormattedPage);
        assert_eq!(foo.whatis.as_deref(), Some("do foo things"));
        assert_eq!(only(&db, "bar", "1").kind, Kind::NameAliasCat);

        let options = ScanOptions { stray_cats: false, ..ScanOptions::default() };
        let mut db = database();
        Scanner::new(&extractor).with_options(options).scan(&mut db, &hierarchy, false).unwrap();
        assert_eq!(db.get("foo", "1").unwrap(), None);
    }

    #[test]
    fn test_configured_sections_limit_the_scan() {
        let (_dir, hierarchy) = hierarchy();
        let extractor = PageExtractor::default();
        let options = ScanOptions { sections: vec!["3".to_string(), "9".to_string()], ..ScanOptions::default() };
        let mut db = database();
        let report = Scanner::new(&extractor).with_options(options).scan(&mut db, &hierarchy, false).unwrap();
        assert_eq!(report.changed_dirs, 1);
        assert!(db.get("ls", "1").unwrap().is_none());
        assert!(db.get("printf", "3").unwrap().is_some());
    }

    #[test]
    fn test_missing_hierarchy_scans_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = PageExtractor::default();
        let mut db = database();
        let report = Scanner::new(&extractor).scan(&mut db, &Hierarchy::new(dir.path().join("gone")), false).unwrap();
        assert_eq!(report, ScanReport::default());
    }

    #[test]
    fn test_user_hierarchies_drop_privileges() {
        let (_dir, hierarchy) = hierarchy();
        let extractor = PageExtractor::default();
        let privileges = Recording::default();
        let mut scanner = Scanner::new(&extractor).with_privileges(&privileges);

        scanner.scan(&mut database(), &hierarchy, false).unwrap();
        assert_eq!(privileges.entered.get(), 0);

        let user = Hierarchy { system: false, ..hierarchy };
        scanner.scan(&mut database(), &user, false).unwrap();
        assert_eq!(privileges.entered.get(), 1);
        assert_eq!(privileges.depth.get(), 0);
    }
}
