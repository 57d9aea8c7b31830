//! Record codec.
//!
//! A record is stored as nine tab-separated fields:
//!
//! ```text
//! extension  section  mtime_sec  mtime_nsec  kind  pointer  filter  compression  whatis
//! ```
//!
//! Unset optional fields are written as `-`, except the whatis which is left
//! empty. The whatis is last so that decoding can split on the first eight
//! tabs only.

use super::key::SEP;
use super::{Kind, PageRecord};
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use time::UtcDateTime;

const FIELDS: usize = 9;
const UNSET: &str = "-";

/// A record decoded straight out of a stored value, borrowing its strings.
///
/// Walking the cache (purge, lookups filtered by extension) decodes every
/// value it touches, so this avoids allocating until a record is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredEntry<'a> {
    pub extension: &'a str,
    pub section: &'a str,
    pub modified_at: UtcDateTime,
    pub kind: Kind,
    pub pointer: Option<&'a str>,
    pub filter: Option<&'a str>,
    pub compression: Option<&'a str>,
    pub whatis: Option<&'a str>,
}

impl<'a> StoredEntry<'a> {
    pub fn decode(raw: &'a str) -> Result<Self> {
        let fields: Vec<&str> = raw.splitn(FIELDS, SEP).collect();
        let [extension, section, secs, nanos, kind, pointer, filter, compression, whatis] = fields[..] else {
            exn::bail!(ErrorKind::corrupt(format!("record has {} fields, expected {FIELDS}", fields.len())));
        };
        if extension.is_empty() {
            exn::bail!(ErrorKind::corrupt("record has an empty extension"));
        }
        let kind = Kind::from_code(kind).ok_or_raise(|| ErrorKind::corrupt(format!("unknown record kind {kind:?}")))?;
        Ok(Self {
            extension,
            section,
            modified_at: decode_time(secs, nanos)?,
            kind,
            pointer: unset_to_none(pointer),
            filter: unset_to_none(filter),
            compression: unset_to_none(compression),
            whatis: Some(whatis).filter(|w| !w.is_empty()),
        })
    }

    pub fn to_record(&self) -> PageRecord {
        PageRecord {
            extension: self.extension.to_string(),
            section: self.section.to_string(),
            modified_at: self.modified_at,
            kind: self.kind,
            pointer: self.pointer.map(str::to_string),
            filter: self.filter.map(str::to_string),
            compression: self.compression.map(str::to_string),
            whatis: self.whatis.map(str::to_string),
        }
    }

    /// Field-by-field equality with an owned record.
    pub fn same_as(&self, record: &PageRecord) -> bool {
        self.extension == record.extension
            && self.section == record.section
            && self.modified_at == record.modified_at
            && self.kind == record.kind
            && self.pointer == record.pointer.as_deref()
            && self.filter == record.filter.as_deref()
            && self.compression == record.compression.as_deref()
            && self.whatis == record.whatis.as_deref()
    }
}

fn unset_to_none(field: &str) -> Option<&str> {
    (field != UNSET).then_some(field)
}

fn decode_time(secs: &str, nanos: &str) -> Result<UtcDateTime> {
    let secs = secs.parse::<i64>().or_raise(|| ErrorKind::corrupt(format!("bad modification time {secs:?}")))?;
    let nanos = nanos.parse::<u32>().or_raise(|| ErrorKind::corrupt(format!("bad modification time {nanos:?}")))?;
    UtcDateTime::from_unix_timestamp(secs)
        .and_then(|t| t.replace_nanosecond(nanos))
        .or_raise(|| ErrorKind::corrupt("modification time out of range"))
}

/// Encode a record as a stored value.
///
/// Separators and line breaks can't survive inside a field, so any in the
/// whatis (the only free-text field) are turned into spaces.
pub fn encode(record: &PageRecord) -> String {
    let opt = |field: &Option<String>| field.as_deref().unwrap_or(UNSET).to_string();
    let whatis = record.whatis.as_deref().unwrap_or("").replace([SEP, '\n', '\r'], " ");
    [
        record.extension.clone(),
        record.section.clone(),
        record.modified_at.unix_timestamp().to_string(),
        record.modified_at.nanosecond().to_string(),
        record.kind.code().to_string(),
        opt(&record.pointer),
        opt(&record.filter),
        opt(&record.compression),
        whatis,
    ]
    .join("\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ls() -> PageRecord {
        PageRecord::new("1", "1", Kind::SourcePage, UtcDateTime::from_unix_timestamp(1_700_000_000).unwrap())
            .with_compression(Some("gz"))
            .with_whatis(Some("list directory contents"))
    }

    #[test]
    fn test_encode_layout() {
        let mut record = ls();
        record.modified_at = record.modified_at.replace_nanosecond(250).unwrap();
        assert_eq!(encode(&record), "1\t1\t1700000000\t250\tA\t-\t-\tgz\tlist directory contents");
    }

    #[test]
    fn test_decode_borrows_and_restores() {
        let record = ls().as_alias(Kind::SourceAlias, "dir").with_filter(Some("t"));
        let raw = encode(&record);
        let entry = StoredEntry::decode(&raw).unwrap();
        assert_eq!(entry.pointer, Some("dir"));
        assert_eq!(entry.filter, Some("t"));
        assert!(entry.same_as(&record));
        assert_eq!(entry.to_record(), record);
    }

    #[test]
    fn test_whatis_may_contain_separators() {
        let record = ls().with_whatis(Some("one\ttwo\nthree"));
        let raw = encode(&record);
        let entry = StoredEntry::decode(&raw).unwrap();
        assert_eq!(entry.whatis, Some("one two three"));
        // A tab that slipped into a stored whatis still decodes.
        let entry = StoredEntry::decode("1\t1\t0\t0\tA\t-\t-\t-\tone\ttwo").unwrap();
        assert_eq!(entry.whatis, Some("one\ttwo"));
    }

    #[test]
    fn test_empty_pointer_survives_decoding() {
        let entry = StoredEntry::decode("1\t1\t0\t0\tB\t\t-\t-\t").unwrap();
        assert_eq!(entry.pointer, Some(""));
        assert_eq!(entry.whatis, None);
        assert!(entry.to_record().has_broken_pointer());
    }

    #[rstest]
    #[case::too_few_fields("1\t1\t0\t0\tA\t-\t-\t-")]
    #[case::empty_extension("\t1\t0\t0\tA\t-\t-\t-\t")]
    #[case::unknown_kind("1\t1\t0\t0\tZ\t-\t-\t-\t")]
    #[case::bad_seconds("1\t1\tyesterday\t0\tA\t-\t-\t-\t")]
    #[case::bad_nanoseconds("1\t1\t0\t2000000000\tA\t-\t-\t-\t")]
    fn test_decode_rejects(#[case] raw: &str) {
        let err = StoredEntry::decode(raw).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Corrupt(_)));
    }
}
