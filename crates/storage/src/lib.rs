//! Storage backends for the manual page index cache.
//!
//! A backend is a locked, flat key/value store of UTF-8 strings: it knows
//! nothing about page records, overflow markers or versions (that is the job
//! of `mandb-cache`). Opening a backend acquires an advisory lock on the
//! underlying file that never blocks. If another process holds an
//! incompatible lock the open fails immediately with
//! [`Locked`](crate::error::ErrorKind::Locked).

pub mod backend;
pub mod error;
mod lock;
mod mode;

pub use crate::backend::{Backend, Entries, FileBackend};
#[cfg(feature = "mock")]
pub use crate::backend::MemoryBackend;
pub use crate::mode::OpenMode;

/// An owned, type-erased backend as held by a cache database handle.
pub type BackendHandle = Box<dyn Backend + Send>;
