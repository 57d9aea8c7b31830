//! Storage backend trait and implementations.
//!
//! This module defines the [`Backend`] trait: a locked, flat key/value store
//! that the index cache engine is written against. The engine never knows
//! which on-disk format it is talking to.

mod file;
mod frame;
#[cfg(feature = "mock")]
mod memory;

pub use self::file::FileBackend;
#[cfg(feature = "mock")]
pub use self::memory::MemoryBackend;
use crate::OpenMode;
use crate::error::Result;
use std::path::Path;

/// A one-pass, finite sequence of `(key, value)` pairs.
///
/// Entries borrow from the backend, so the borrow checker rules out
/// mutating the store while a walk is in progress. Collect what you need
/// first if you intend to delete as you go.
pub type Entries<'a> = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

/// Unified interface for storage backends.
///
/// It's a glorified dbm interface: insert-if-absent, replace, fetch, exists,
/// delete and iterate. Every mutating call is a single backend operation and
/// is therefore atomic with respect to the one key it touches.
///
/// Mutations through a handle opened with [`OpenMode::ReadOnly`] fail with
/// [`ReadOnly`](crate::error::ErrorKind::ReadOnly).
///
/// # Examples
///
/// ```
/// use mandb_storage::{Backend, OpenMode, FileBackend};
///
/// # fn example() -> mandb_storage::error::Result<()> {
/// let dir = tempfile::tempdir().unwrap();
/// let mut backend = FileBackend::open(dir.path().join("index.db"), OpenMode::CreateTruncate)?;
/// assert!(backend.insert("ls", "1\t1\t0\t0\tA\t-\t-\tgz\tlist directory contents")?);
/// // A second insert of the same key is refused rather than overwriting.
/// assert!(!backend.insert("ls", "something else")?);
/// assert!(backend.exists("ls")?);
/// backend.close()?;
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub trait Backend {
    /// Location of the backing file, if there is one (used for logging).
    fn path(&self) -> Option<&Path>;

    /// The mode this handle was opened with.
    fn mode(&self) -> OpenMode;

    /// Number of live keys.
    fn len(&self) -> usize;

    /// Whether the store holds no keys at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `value` under `key` only if `key` is absent.
    ///
    /// Returns `false` (and changes nothing) if the key already exists.
    fn insert(&mut self, key: &str, value: &str) -> Result<bool>;

    /// Insert or overwrite `value` under `key`.
    fn replace(&mut self, key: &str, value: &str) -> Result<()>;

    /// Fetch a copy of the value stored under `key`.
    fn fetch(&self, key: &str) -> Result<Option<String>>;

    /// Check whether `key` exists.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Delete `key`. Returns `false` if it did not exist.
    fn delete(&mut self, key: &str) -> Result<bool>;

    /// Walk every live `(key, value)` pair, in key order.
    fn iter(&self) -> Entries<'_>;

    /// Reclaim space left behind by replaced and deleted values.
    ///
    /// Backends that never leave garbage behind need not override this.
    fn compact(&mut self) -> Result<()> {
        Ok(())
    }

    /// Flush outstanding writes and release the lock.
    ///
    /// Any further call on the handle fails with
    /// [`Closed`](crate::error::ErrorKind::Closed). Dropping a handle without
    /// closing it also releases the lock, but skips the final sync.
    fn close(&mut self) -> Result<()>;
}
