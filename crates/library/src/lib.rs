//! Keeping manual page index caches in step with the filesystem.
//!
//! - [`resolve`] traces a page file back to the file holding its text.
//! - [`Scanner`] walks a hierarchy and stores what it finds.
//! - [`purge`] removes records whose files are gone.
//! - [`update`] does all of the above for every configured hierarchy.

pub mod error;
pub mod filename;
mod hierarchy;
pub mod locate;
mod memo;
pub mod privs;
mod purge;
pub mod resolve;
pub mod scan;
mod update;
pub mod whatis;

pub use crate::filename::PageName;
pub use crate::hierarchy::{open_cache, open_for_update};
pub use crate::locate::{GlobLocator, PageLocator};
pub use crate::memo::Memo;
pub use crate::privs::{NoPrivileges, Privileges, Scope};
pub use crate::purge::{PurgeReport, purge};
pub use crate::resolve::{Follow, Resolver};
pub use crate::scan::{ScanOptions, ScanReport, Scanner};
pub use crate::update::{UpdateReport, Updater, update};
