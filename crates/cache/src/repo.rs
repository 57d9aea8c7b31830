//! Storing, deleting and looking up page records.
//!
//! Every `(name, extension)` pair maps to at most one record. When two
//! records compete for the same slot, [`Kind`] precedence decides which one
//! stays; between records of the same kind the newer file usually wins.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::codec::{self, StoredEntry};
use crate::models::key::{self, Key};
use crate::models::{Kind, PageRecord};
use exn::OptionExt;
use mandb_storage::Backend;

/// What [`Database::store`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Nothing was stored for this `(name, extension)` yet.
    Inserted,
    /// The record displaced an existing one.
    Replaced,
    /// An identical (or equivalent) record was already stored.
    Unchanged,
    /// The existing record, of the given kind, takes precedence and was kept.
    Kept(Kind),
}

impl StoreOutcome {
    /// Whether the cache contents changed.
    pub fn is_change(self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced)
    }
}

/// Which records a lookup should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section<'a> {
    Any,
    /// Extensions starting with the given string (`3` matches `3`, `3pm`).
    Prefix(&'a str),
    /// Exactly this extension.
    Exact(&'a str),
}

impl Section<'_> {
    fn matches(&self, extension: &str) -> bool {
        match self {
            Section::Any => true,
            Section::Prefix(prefix) => extension.starts_with(prefix),
            Section::Exact(exact) => extension == *exact,
        }
    }
}

enum Decision {
    Replace,
    Keep,
    Same,
}

fn decide(existing: &StoredEntry<'_>, incoming: &PageRecord) -> Decision {
    if incoming.kind.outranks(existing.kind) {
        return Decision::Replace;
    }
    if existing.kind.outranks(incoming.kind) {
        return Decision::Keep;
    }
    if existing.same_as(incoming) {
        return Decision::Same;
    }
    let newer = incoming.modified_at > existing.modified_at;
    let same_time = incoming.modified_at == existing.modified_at;
    if incoming.kind == Kind::SourcePage {
        return match existing.compression == incoming.compression.as_deref() {
            // Same file regenerated, even if it went back in time.
            true => Decision::Replace,
            // The same page installed twice with different compression: the
            // newer file wins, and neither does if they're the same age.
            false => match (same_time, newer) {
                (true, _) => Decision::Same,
                (false, true) => Decision::Replace,
                (false, false) => Decision::Keep,
            },
        };
    }
    match newer || same_time {
        true => Decision::Replace,
        false => Decision::Keep,
    }
}

fn validate(name: &str, record: &PageRecord) -> Result<()> {
    if name.is_empty() || key::is_reserved(name) || name.contains(key::SEP) {
        exn::bail!(ErrorKind::InvalidRecord(format!("unusable page name {name:?}")));
    }
    if record.extension.is_empty() || record.extension.contains(key::SEP) {
        exn::bail!(ErrorKind::InvalidRecord(format!("unusable extension {:?} for {name}", record.extension)));
    }
    Ok(())
}

impl Database {
    fn fetch(&self, key: &str) -> Result<Option<String>> {
        self.backend.fetch(key).map_err(ErrorKind::storage)
    }

    // =========================================================================
    // Store
    // =========================================================================

    /// Store `record` under page `name`, resolving any competing record for
    /// the same `(name, extension)`.
    ///
    /// A name's first extension is stored directly under the name; a second
    /// extension turns the name into an overflow list with one multi key per
    /// extension. Multi keys are always written before the marker that
    /// references them.
    pub fn store(&mut self, name: &str, record: &PageRecord) -> Result<StoreOutcome> {
        validate(name, record)?;
        let encoded = codec::encode(record);
        let Some(current) = self.fetch(name)? else {
            self.backend.insert(name, &encoded).map_err(ErrorKind::storage)?;
            return Ok(StoreOutcome::Inserted);
        };
        if let Some(extensions) = key::overflow_list(&current) {
            let multi = key::multi_key(name, &record.extension);
            if let Some(existing) = self.fetch(&multi)? {
                return self.resolve(&multi, &existing, record, &encoded);
            }
            if extensions.contains(&record.extension.as_str()) {
                exn::bail!(ErrorKind::corrupt(format!("{name}.{} is listed but not stored", record.extension)));
            }
            self.backend.insert(&multi, &encoded).map_err(ErrorKind::storage)?;
            let mut extensions = extensions;
            extensions.push(&record.extension);
            let marker = key::overflow_marker(&extensions);
            self.backend.replace(name, &marker).map_err(ErrorKind::storage)?;
            return Ok(StoreOutcome::Inserted);
        }
        let existing = StoredEntry::decode(&current)?;
        if existing.extension == record.extension {
            return self.resolve(name, &current, record, &encoded);
        }
        // Second extension for this name: move both records to multi keys.
        tracing::trace!(name, first = existing.extension, second = %record.extension, "Splitting page name");
        let marker = key::overflow_marker(&[existing.extension, record.extension.as_str()]);
        self.backend.replace(&key::multi_key(name, existing.extension), &current).map_err(ErrorKind::storage)?;
        self.backend.replace(&key::multi_key(name, &record.extension), &encoded).map_err(ErrorKind::storage)?;
        self.backend.replace(name, &marker).map_err(ErrorKind::storage)?;
        Ok(StoreOutcome::Inserted)
    }

    fn resolve(&mut self, key: &str, existing: &str, record: &PageRecord, encoded: &str) -> Result<StoreOutcome> {
        let existing = StoredEntry::decode(existing)?;
        match decide(&existing, record) {
            Decision::Replace => {
                self.backend.replace(key, encoded).map_err(ErrorKind::storage)?;
                Ok(StoreOutcome::Replaced)
            },
            Decision::Keep => {
                tracing::debug!(
                    key = %key.replace(key::SEP, "."),
                    kept = %existing.kind,
                    rejected = %record.kind,
                    "Keeping existing record",
                );
                Ok(StoreOutcome::Kept(existing.kind))
            },
            Decision::Same => Ok(StoreOutcome::Unchanged),
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete the record for `(name, record.extension)`.
    ///
    /// A direct record is deleted outright. Under an overflow marker only the
    /// matching multi key goes, and the marker shrinks; a marker left with a
    /// single extension is kept as is rather than folded back into a direct
    /// record. Returns `false` if nothing was stored under `name`.
    pub fn delete(&mut self, name: &str, record: &PageRecord) -> Result<bool> {
        let Some(current) = self.fetch(name)? else {
            return Ok(false);
        };
        let Some(mut extensions) = key::overflow_list(&current) else {
            self.backend.delete(name).map_err(ErrorKind::storage)?;
            return Ok(true);
        };
        let position = extensions
            .iter()
            .position(|ext| *ext == record.extension)
            .ok_or_raise(|| ErrorKind::corrupt(format!("{name}.{} is missing from its overflow list", record.extension)))?;
        let multi = key::multi_key(name, &record.extension);
        if !self.backend.delete(&multi).map_err(ErrorKind::storage)? {
            exn::bail!(ErrorKind::corrupt(format!("{name}.{} is listed but not stored", record.extension)));
        }
        extensions.remove(position);
        match extensions.is_empty() {
            true => self.backend.delete(name).map(drop).map_err(ErrorKind::storage)?,
            false => self.backend.replace(name, &key::overflow_marker(&extensions)).map_err(ErrorKind::storage)?,
        }
        Ok(true)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// All records stored under `name` whose extension matches `section`, in
    /// the order their extensions were first stored.
    pub fn lookup(&self, name: &str, section: Section<'_>) -> Result<Vec<PageRecord>> {
        let Some(current) = self.fetch(name)? else {
            return Ok(Vec::new());
        };
        let Some(extensions) = key::overflow_list(&current) else {
            let entry = StoredEntry::decode(&current)?;
            return Ok(section.matches(entry.extension).then(|| entry.to_record()).into_iter().collect());
        };
        let mut records = Vec::new();
        for extension in extensions.into_iter().filter(|ext| section.matches(ext)) {
            let multi = key::multi_key(name, extension);
            let raw = self
                .fetch(&multi)?
                .ok_or_raise(|| ErrorKind::corrupt(format!("{name}.{extension} is listed but not stored")))?;
            records.push(StoredEntry::decode(&raw)?.to_record());
        }
        Ok(records)
    }

    /// Records under `name` whose extension starts with `section` (all of
    /// them when `section` is `None`).
    pub fn lookup_all(&self, name: &str, section: Option<&str>) -> Result<Vec<PageRecord>> {
        self.lookup(name, section.map_or(Section::Any, Section::Prefix))
    }

    /// Records under `name` whose extension is exactly `extension` (all of
    /// them when `extension` is `None`).
    pub fn lookup_exact(&self, name: &str, extension: Option<&str>) -> Result<Vec<PageRecord>> {
        self.lookup(name, extension.map_or(Section::Any, Section::Exact))
    }

    /// The single record for `(name, extension)`, if there is one.
    pub fn get(&self, name: &str, extension: &str) -> Result<Option<PageRecord>> {
        Ok(self.lookup(name, Section::Exact(extension))?.into_iter().next())
    }

    // =========================================================================
    // Walk
    // =========================================================================

    /// Snapshot every page record in the cache as `(name, record)` pairs.
    ///
    /// Reserved keys and overflow markers are skipped; records under multi
    /// keys are reported with their page name. The snapshot is detached from
    /// the cache so that callers can delete while going through it.
    pub fn records(&self) -> Result<Vec<(String, PageRecord)>> {
        let mut records = Vec::with_capacity(self.backend.len());
        for (raw, value) in self.backend.iter() {
            let name = match Key::parse(raw) {
                Key::Reserved => continue,
                Key::Simple(_) if key::overflow_list(value).is_some() => continue,
                Key::Simple(name) | Key::Multi(name) => name,
            };
            let entry = StoredEntry::decode(value)?;
            records.push((name.to_string(), entry.to_record()));
        }
        Ok(records)
    }
}
