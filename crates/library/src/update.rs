//! Updating every configured hierarchy in one go.

use crate::error::{ErrorKind, Result};
use crate::hierarchy::open_for_update;
use crate::locate::{GlobLocator, PageLocator};
use crate::privs::{NoPrivileges, Privileges, Scope};
use crate::purge::{PurgeReport, purge};
use crate::scan::{ScanOptions, ScanReport, Scanner};
use mandb_cache::Database;
use mandb_config::{Config, Hierarchy};
use mandb_extract::{PageExtractor, WhatisExtractor};
use std::path::PathBuf;
use tracing::instrument;

/// What happened to one hierarchy during an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub root: PathBuf,
    pub scan: ScanReport,
    pub purge: PurgeReport,
    /// The cache was recreated from scratch.
    pub rebuilt: bool,
}

/// Scans and purges hierarchies one after the other.
pub struct Updater<'a> {
    config: &'a Config,
    scanner: Scanner<'a>,
    locator: &'a dyn PageLocator,
    privileges: &'a dyn Privileges,
}

impl<'a> Updater<'a> {
    pub fn new(config: &'a Config, extractor: &'a dyn WhatisExtractor) -> Self {
        Self {
            config,
            scanner: Scanner::new(extractor).with_options(ScanOptions::from(config)),
            locator: &GlobLocator,
            privileges: &NoPrivileges,
        }
    }

    pub fn with_locator(mut self, locator: &'a dyn PageLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_privileges(mut self, privileges: &'a dyn Privileges) -> Self {
        self.privileges = privileges;
        self.scanner = self.scanner.with_privileges(privileges);
        self
    }

    /// Update every configured hierarchy.
    ///
    /// A hierarchy whose cache is unavailable (typically locked by another
    /// process) is skipped with a warning and left out of the reports.
    pub fn run(&mut self, force: bool) -> Result<Vec<UpdateReport>> {
        let config = self.config;
        let mut reports = Vec::with_capacity(config.hierarchies.len());
        for hierarchy in &config.hierarchies {
            let updated = self.update(hierarchy, force);
            self.scanner.clear_memo();
            match updated {
                Ok(report) => reports.push(report),
                Err(err) if err.is_unavailable() => {
                    tracing::warn!(root = %hierarchy.root.display(), error = %err, "Skipping hierarchy");
                },
                Err(err) => return Err(err),
            }
        }
        Ok(reports)
    }

    /// Open, scan, purge and close the cache of one hierarchy.
    #[instrument(level = "debug", skip_all, fields(root = %hierarchy.root.display(), force))]
    pub fn update(&mut self, hierarchy: &Hierarchy, force: bool) -> Result<UpdateReport> {
        let path = self.config.database_path(hierarchy);
        let (mut db, rebuilt) = open_for_update(&path)?;
        let (scan, purge) = self.reconcile(&mut db, hierarchy, force || rebuilt)?;
        if scan.stored > 0 || scan.removed > 0 || purge.removed > 0 {
            db.compact().map_err(|err| ErrorKind::cache(err, &path))?;
        }
        db.close().map_err(|err| ErrorKind::cache(err, &path))?;
        Ok(UpdateReport { root: hierarchy.root.clone(), scan, purge, rebuilt })
    }

    fn reconcile(&mut self, db: &mut Database, hierarchy: &Hierarchy, force: bool) -> Result<(ScanReport, PurgeReport)> {
        let scan = self.scanner.scan(db, hierarchy, force)?;
        let _scope = (!hierarchy.system).then(|| Scope::enter(self.privileges));
        let purge = purge(db, &hierarchy.root, self.locator)?;
        Ok((scan, purge))
    }
}

/// Update every hierarchy in `config` with the default extractor and
/// locator.
pub fn update(config: &Config, force: bool) -> Result<Vec<UpdateReport>> {
    let extractor = PageExtractor::default();
    Updater::new(config, &extractor).run(force)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::open_cache;
    use mandb_cache::{Kind, OpenMode, SCHEMA_VERSION, VERSION_KEY};
    use mandb_storage::{Backend, FileBackend};
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn config(roots: &[&Path], cache: &Path) -> Config {
        let hierarchies = roots
            .iter()
            .enumerate()
            .map(|(i, root)| Hierarchy::new(*root).with_cache_dir(cache.join(i.to_string())))
            .collect();
        Config { hierarchies, ..Config::default() }
    }

    #[test]
    fn test_update_then_purge() {
        let man = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let ls = write(man.path(), "man1/ls.1", ".TH LS 1\n.SH NAME\nls \\- list directory contents\n");
        write(man.path(), "man1/cp.1", ".TH CP 1\n.SH NAME\ncp \\- copy files\n");
        let config = config(&[man.path()], cache.path());

        let reports = update(&config, false).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].scan.stored, 2);
        assert_eq!(reports[0].purge.removed, 0);
        assert!(!reports[0].rebuilt);

        fs::remove_file(ls).unwrap();
        let reports = update(&config, false).unwrap();
        assert_eq!(reports[0].purge.removed, 1);

        let db = open_cache(&config.database_path(&config.hierarchies[0]), OpenMode::ReadOnly).unwrap();
        assert!(db.lookup_all("ls", None).unwrap().is_empty());
        assert_eq!(db.lookup_all("cp", None).unwrap()[0].kind, Kind::SourcePage);
        db.close().unwrap();
    }

    #[test]
    fn test_locked_hierarchy_is_skipped() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        write(first.path(), "man1/ls.1", ".TH LS 1\n.SH NAME\nls \\- list directory contents\n");
        write(second.path(), "man1/cp.1", ".TH CP 1\n.SH NAME\ncp \\- copy files\n");
        let config = config(&[first.path(), second.path()], cache.path());

        let (held, _) = open_for_update(&config.database_path(&config.hierarchies[0])).unwrap();
        let reports = update(&config, false).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].root, second.path());
        held.close().unwrap();
    }

    #[test]
    fn test_foreign_cache_is_rebuilt() {
        let man = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        write(man.path(), "man1/ls.1", ".TH LS 1\n.SH NAME\nls \\- list directory contents\n");
        let config = config(&[man.path()], cache.path());
        let path = config.database_path(&config.hierarchies[0]);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut backend = FileBackend::open(&path, OpenMode::CreateTruncate).unwrap();
        backend.replace(VERSION_KEY, "0").unwrap();
        backend.close().unwrap();

        let reports = update(&config, false).unwrap();
        assert!(reports[0].rebuilt);
        assert_eq!(reports[0].scan.stored, 1);
        let db = open_cache(&path, OpenMode::ReadOnly).unwrap();
        assert_eq!(db.version().unwrap().as_deref(), Some(SCHEMA_VERSION));
        db.close().unwrap();
    }
}
