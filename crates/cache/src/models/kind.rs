use std::cmp::Ordering;
use std::fmt;

/// What sort of file a [`PageRecord`](super::PageRecord) describes.
///
/// Kinds are totally ordered by precedence: when two records compete for the
/// same `(name, extension)` slot, the one with the lower [`rank`](Kind::rank)
/// wins. `Ord` follows rank, so `Kind::SourcePage < Kind::NameAliasCat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A real, regular source page.
    SourcePage,
    /// A symlink, hardlink or `.so` stub that resolves to another source page.
    SourceAlias,
    /// An extra name pulled out of a source page's whatis line.
    NameAlias,
    /// A formatted (cat) page with no source behind it.
    FormattedPage,
    /// An extra name pulled out of a formatted page's whatis line.
    NameAliasCat,
}

impl Kind {
    pub const ALL: [Kind; 5] =
        [Kind::SourcePage, Kind::SourceAlias, Kind::NameAlias, Kind::FormattedPage, Kind::NameAliasCat];

    /// Precedence rank, lower wins.
    pub const fn rank(self) -> u8 {
        match self {
            Kind::SourcePage => 0,
            Kind::SourceAlias => 1,
            #[cfg(not(feature = "formatted-before-alias"))]
            Kind::NameAlias => 2,
            #[cfg(not(feature = "formatted-before-alias"))]
            Kind::FormattedPage => 3,
            #[cfg(feature = "formatted-before-alias")]
            Kind::NameAlias => 3,
            #[cfg(feature = "formatted-before-alias")]
            Kind::FormattedPage => 2,
            Kind::NameAliasCat => 4,
        }
    }

    /// Whether a record of this kind beats one of kind `other`.
    pub fn outranks(self, other: Kind) -> bool {
        self.rank() < other.rank()
    }

    /// Whether this kind describes a source file (a page or a link to one).
    pub fn is_source(self) -> bool {
        matches!(self, Kind::SourcePage | Kind::SourceAlias)
    }

    /// Whether this kind was derived from a whatis line rather than a file.
    pub fn is_name_alias(self) -> bool {
        matches!(self, Kind::NameAlias | Kind::NameAliasCat)
    }

    /// The kind to give extra whatis names of a page whose primary kind is
    /// `self`: pages ranked below formatted pages hand out [`Kind::NameAlias`],
    /// the rest [`Kind::NameAliasCat`].
    pub fn alias_kind(self) -> Kind {
        match self.rank() < Kind::FormattedPage.rank() && !self.is_name_alias() {
            true => Kind::NameAlias,
            false => Kind::NameAliasCat,
        }
    }

    /// Single character tag used in the stored record.
    pub(crate) const fn code(self) -> char {
        match self {
            Kind::SourcePage => 'A',
            Kind::SourceAlias => 'B',
            Kind::NameAlias => 'C',
            Kind::FormattedPage => 'D',
            Kind::NameAliasCat => 'E',
        }
    }

    pub(crate) fn from_code(code: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|kind| code.len() == 1 && code.starts_with(kind.code()))
    }
}

impl Ord for Kind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Kind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::SourcePage => "source page",
            Kind::SourceAlias => "source alias",
            Kind::NameAlias => "name alias",
            Kind::FormattedPage => "formatted page",
            Kind::NameAliasCat => "formatted name alias",
        })
    }
}
