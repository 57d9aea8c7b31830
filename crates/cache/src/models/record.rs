use super::Kind;
use time::UtcDateTime;

/// Everything the index cache knows about one `(name, extension)` pair.
///
/// The name itself is not part of the record: it is the key the record is
/// stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// Full page extension, e.g. `1`, `3pm`, `1x`.
    pub extension: String,
    /// Section the page lives in, e.g. `1`, `3`.
    pub section: String,
    /// Modification time of the file the record was built from.
    pub modified_at: UtcDateTime,
    pub kind: Kind,
    /// For aliases: the name of the page they stand in for.
    pub pointer: Option<String>,
    /// Preprocessor hint, e.g. `t` for tbl.
    pub filter: Option<String>,
    /// Compression suffix of the underlying file (`gz`, `xz`, ...).
    pub compression: Option<String>,
    /// One-line description.
    pub whatis: Option<String>,
}

impl PageRecord {
    pub fn new(
        extension: impl Into<String>,
        section: impl Into<String>,
        kind: Kind,
        modified_at: UtcDateTime,
    ) -> Self {
        Self {
            extension: extension.into(),
            section: section.into(),
            modified_at,
            kind,
            pointer: None,
            filter: None,
            compression: None,
            whatis: None,
        }
    }

    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }

    pub fn with_filter(mut self, filter: Option<&str>) -> Self {
        self.filter = filter.map(str::to_string);
        self
    }

    pub fn with_compression(mut self, compression: Option<&str>) -> Self {
        self.compression = compression.map(str::to_string);
        self
    }

    pub fn with_whatis(mut self, whatis: Option<&str>) -> Self {
        self.whatis = whatis.map(str::to_string);
        self
    }

    /// Same record under a different kind, pointing at `pointer`.
    ///
    /// Aliases don't carry a whatis of their own: it is looked up through the
    /// pointer.
    pub fn as_alias(&self, kind: Kind, pointer: impl Into<String>) -> Self {
        Self { kind, pointer: Some(pointer.into()), whatis: None, ..self.clone() }
    }

    /// An alias whose pointer is missing or empty can't be followed.
    pub fn has_broken_pointer(&self) -> bool {
        self.kind != Kind::SourcePage
            && self.kind != Kind::FormattedPage
            && self.pointer.as_deref().is_none_or(str::is_empty)
    }
}
