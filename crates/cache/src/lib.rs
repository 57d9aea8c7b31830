//! Index cache for manual pages.
//!
//! This crate provides the per-hierarchy cache that maps page names to what
//! is known about them: which extensions exist, whether each is a real page,
//! an alias or a formatted-only page, and its one-line description. The cache
//! is not the source of truth - the pages themselves are. If it is deleted,
//! it can be rebuilt by scanning the hierarchy.
//!
//! # Architecture
//! The cache sits on top of any [`mandb_storage::Backend`]:
//! - **Records** ([`PageRecord`]) are encoded as tab-separated strings, one
//!   per `(name, extension)` pair. The page name is the key.
//! - **Keys** are the bare page name while a name has one extension, and
//!   `name<TAB>extension` once it has several, with the bare name then
//!   holding the list of extensions.
//! - **Precedence** ([`Kind`]) decides which record wins when two describe
//!   the same `(name, extension)`.
//! - Two **reserved keys** hold the cache's format version and the time of
//!   the last scan.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::{Database, SCHEMA_VERSION};
pub use crate::models::key::{RESERVED_PREFIX, SCAN_TIME_KEY, VERSION_KEY};
pub use crate::models::{Kind, PageRecord, StoredEntry};
pub use crate::repo::{Section, StoreOutcome};
pub use mandb_storage::OpenMode;
