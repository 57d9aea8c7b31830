use super::error::{ErrorKind, Result};
use super::{ScanReport, Scanner};
use crate::filename::PageName;
use crate::resolve::{Follow, Resolver};
use crate::whatis::{self, is_usable_name};
use exn::ResultExt;
use mandb_cache::error::ErrorKind as CacheErrorKind;
use mandb_cache::{Database, Kind, PageRecord};
use mandb_compress::Compression;
use std::fs;
use std::path::{Path, PathBuf};
use time::UtcDateTime;

impl Scanner<'_> {
    /// Index one file from a `manN` directory.
    pub(super) fn scan_page(
        &mut self,
        db: &mut Database,
        resolver: &Resolver,
        path: &Path,
        section: &str,
        report: &mut ScanReport,
    ) -> Result<()> {
        let page = PageName::parse(path, section)?;
        let modified_at = modified_at(path)?;

        if let Some(existing) = db.get(page.name, page.extension).or_raise(|| ErrorKind::Cache)?
            && existing.kind.is_source()
        {
            match existing.compression.as_deref() == page.compression {
                true if existing.modified_at == modified_at => {
                    tracing::trace!(path = %path.display(), "Already indexed");
                    report.unchanged += 1;
                    return Ok(());
                },
                true => {},
                false => {
                    let sibling = sibling(path, &page, existing.compression.as_deref());
                    if sibling.exists() {
                        exn::bail!(ErrorKind::CompetingExtensions(path.to_path_buf()));
                    }
                    tracing::debug!(name = page.name, ext = page.extension, stale = %sibling.display(), "Dropping record for a file that changed compression");
                    db.delete(page.name, &existing).or_raise(|| ErrorKind::Cache)?;
                    report.removed += 1;
                },
            }
        }

        let source = resolver.resolve(path, Follow::all()).or_raise(|| ErrorKind::Resolve(path.to_path_buf()))?;
        let record = PageRecord::new(page.extension, section, Kind::SourcePage, modified_at).with_compression(page.compression);
        let record = match source == path {
            true => record,
            false => {
                let Some(target) = name_of(&source) else {
                    exn::bail!(ErrorKind::Resolve(path.to_path_buf()));
                };
                tracing::trace!(path = %path.display(), source = %source.display(), "Page is an alias");
                PageRecord { kind: Kind::SourceAlias, ..record }.with_pointer(target)
            },
        };
        self.index(db, &page, &source, record, report)
    }

    /// Index one file from a `catN` directory, unless its source is indexed.
    pub(super) fn scan_formatted(
        &mut self,
        db: &mut Database,
        resolver: &Resolver,
        path: &Path,
        section: &str,
        report: &mut ScanReport,
    ) -> Result<()> {
        let page = PageName::parse(path, section)?;
        let modified_at = modified_at(path)?;
        if let Some(existing) = db.get(page.name, page.extension).or_raise(|| ErrorKind::Cache)? {
            let current = existing.kind == Kind::FormattedPage
                && existing.modified_at == modified_at
                && existing.compression.as_deref() == page.compression;
            if existing.kind.is_source() || current {
                report.unchanged += 1;
                return Ok(());
            }
        }
        let source = resolver
            .resolve(path, Follow::SYMLINK | Follow::HARDLINK)
            .or_raise(|| ErrorKind::Resolve(path.to_path_buf()))?;
        let record = PageRecord::new(page.extension, section, Kind::FormattedPage, modified_at).with_compression(page.compression);
        self.index(db, &page, &source, record, report)
    }

    /// Store `primary` for the page itself and an alias for every other name
    /// its whatis documents.
    fn index(
        &mut self,
        db: &mut Database,
        page: &PageName<'_>,
        source: &Path,
        primary: PageRecord,
        report: &mut ScanReport,
    ) -> Result<()> {
        let extracted = self.memo.get_or_extract(source, page.name, self.extractor).clone();
        let descriptions = whatis::split(extracted.whatis.as_deref().unwrap_or_default());
        // Aliases borrow their text from the page they point at. Pages
        // installed under a name their NAME section doesn't mention still get
        // the first description.
        let own = match primary.pointer {
            Some(_) => None,
            None => descriptions.iter().find(|d| d.name == page.name).or(descriptions.first()).and_then(|d| d.whatis),
        };
        let primary = primary.with_filter(extracted.filter.as_deref()).with_whatis(own);
        store(db, page.name, &primary, report)?;

        let alias = primary.as_alias(primary.kind.alias_kind(), page.name);
        for description in descriptions.iter().filter(|d| d.name != page.name) {
            if !is_usable_name(description.name) {
                tracing::debug!(name = description.name, page = page.name, "Ignoring unusable name in whatis");
                continue;
            }
            store(db, description.name, &alias, report)?;
        }
        Ok(())
    }
}

fn store(db: &mut Database, name: &str, record: &PageRecord, report: &mut ScanReport) -> Result<()> {
    let outcome = match db.store(name, record) {
        Ok(outcome) => outcome,
        Err(err) if matches!(&*err, CacheErrorKind::InvalidRecord(_)) => {
            tracing::warn!(name, error = %err, "Not storing record");
            return Ok(());
        },
        Err(err) => return Err(err).or_raise(|| ErrorKind::Cache),
    };
    tracing::debug!(name, ext = %record.extension, kind = %record.kind, ?outcome, "Stored record");
    match outcome.is_change() {
        true => report.stored += 1,
        false => report.unchanged += 1,
    }
    Ok(())
}

fn modified_at(path: &Path) -> Result<UtcDateTime> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
    Ok(UtcDateTime::from(modified))
}

/// The same page with a different compression suffix (or none).
fn sibling(path: &Path, page: &PageName<'_>, compression: Option<&str>) -> PathBuf {
    let file_name = match compression {
        Some(suffix) => format!("{}.{}.{suffix}", page.name, page.extension),
        None => format!("{}.{}", page.name, page.extension),
    };
    path.with_file_name(file_name)
}

/// The page name of a resolved source file, `printf` for `printf.3.gz`.
fn name_of(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let (stem, _) = Compression::split_suffix(file_name);
    let (name, _) = stem.rsplit_once('.')?;
    Some(name).filter(|name| !name.is_empty()).map(str::to_string)
}
