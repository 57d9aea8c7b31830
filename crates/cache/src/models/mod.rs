pub(crate) mod codec;
pub(crate) mod key;
mod kind;
mod record;

pub use self::codec::StoredEntry;
pub use self::kind::Kind;
pub use self::record::PageRecord;
