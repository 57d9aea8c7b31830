//! Dropping records whose files are gone.

use crate::error::{ErrorKind, Result};
use crate::locate::PageLocator;
use mandb_cache::{Database, Kind};
use std::path::Path;
use tracing::instrument;

/// What one [`purge`] pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub removed: usize,
    /// An alias was found that a real page should replace; the scan time has
    /// been reset so that the next update rescans the whole hierarchy.
    pub rescan_needed: bool,
}

/// Remove every record in `db` whose page no longer exists under `root`.
///
/// Page records go when no file backs them. Alias records go when the page
/// they point at is gone, or straight away if they point nowhere. An alias
/// whose own name has since become a real page is left alone but triggers a
/// full rescan, which replaces it.
#[instrument(level = "debug", skip_all, fields(root = %root.display()))]
pub fn purge(db: &mut Database, root: &Path, locator: &dyn PageLocator) -> Result<PurgeReport> {
    let records = db.records().map_err(|err| ErrorKind::cache(err, root))?;
    let mut report = PurgeReport::default();
    for (name, record) in &records {
        let (name, ext) = (name.as_str(), record.extension.as_str());
        let remove = match record.kind {
            Kind::SourcePage | Kind::SourceAlias => !locator.exists(root, ext, name, false),
            Kind::FormattedPage => !locator.exists(root, ext, name, true),
            Kind::NameAlias | Kind::NameAliasCat => {
                let formatted = record.kind == Kind::NameAliasCat;
                let pointer = record.pointer.as_deref().filter(|pointer| !pointer.is_empty());
                match pointer {
                    _ if locator.exists(root, ext, name, formatted) => {
                        tracing::debug!(name, ext, "Alias has become a real page");
                        report.rescan_needed = true;
                        false
                    },
                    None => {
                        tracing::warn!(name, ext, "Alias points nowhere");
                        report.rescan_needed = true;
                        true
                    },
                    Some(target) => !locator.exists(root, ext, target, formatted),
                }
            },
        };
        if remove {
            tracing::debug!(name, ext, kind = %record.kind, "Removing stale record");
            db.delete(name, record).map_err(|err| ErrorKind::cache(err, root))?;
            report.removed += 1;
        }
    }
    if report.rescan_needed {
        db.reset_scan_time().map_err(|err| ErrorKind::cache(err, root))?;
    }
    tracing::info!(root = %root.display(), removed = report.removed, "Purged hierarchy");
    Ok(report)
}
