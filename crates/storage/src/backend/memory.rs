//! In-memory storage backend for testing.

use crate::OpenMode;
use crate::backend::{Backend, Entries};
use crate::error::{ErrorKind, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// In-memory storage backend for testing.
///
/// Behaves like a [`FileBackend`](super::FileBackend) that happens to never
/// touch the disk: same key ordering, same read-only and closed-handle
/// errors, no locking.
///
/// # Examples
///
/// ```
/// use mandb_storage::{Backend, MemoryBackend};
///
/// let mut backend = MemoryBackend::with_entries([("ls", "1\t1\t0\t0\tA\t-\t-\t-\tlist")]);
/// assert!(backend.exists("ls").unwrap());
/// backend.replace("cat", "...").unwrap();
/// assert_eq!(backend.len(), 2);
/// ```
#[derive(Debug)]
pub struct MemoryBackend {
    mode: OpenMode,
    entries: BTreeMap<String, String>,
    closed: bool,
}

impl MemoryBackend {
    /// Create a writable mock backend pre-populated with entries.
    pub fn with_entries(entries: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            mode: OpenMode::CreateIfMissing,
            entries: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            closed: false,
        }
    }

    /// Change the mode the mock pretends to have been opened with.
    pub fn with_mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    fn check(&self, write: bool) -> Result<()> {
        if self.closed {
            exn::bail!(ErrorKind::Closed);
        }
        if write && !self.mode.is_writable() {
            exn::bail!(ErrorKind::ReadOnly(PathBuf::from(":memory:")));
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        let entries: [(&str, &str); 0] = [];
        Self::with_entries(entries)
    }
}

impl Backend for MemoryBackend {
    fn path(&self) -> Option<&Path> {
        None
    }

    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert(&mut self, key: &str, value: &str) -> Result<bool> {
        self.check(true)?;
        if self.entries.contains_key(key) {
            return Ok(false);
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    fn replace(&mut self, key: &str, value: &str) -> Result<()> {
        self.check(true)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn fetch(&self, key: &str) -> Result<Option<String>> {
        self.check(false)?;
        Ok(self.entries.get(key).cloned())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.check(false)?;
        Ok(self.entries.contains_key(key))
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        self.check(true)?;
        Ok(self.entries.remove(key).is_some())
    }

    fn iter(&self) -> Entries<'_> {
        Box::new(self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    fn close(&mut self) -> Result<()> {
        self.check(false)?;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_mock_rejects_writes() {
        let mut backend = MemoryBackend::with_entries([("ls", "x")]).with_mode(OpenMode::ReadOnly);
        assert!(backend.exists("ls").unwrap());
        assert!(matches!(&*backend.delete("ls").unwrap_err(), ErrorKind::ReadOnly(_)));
    }

    #[test]
    fn test_closed_mock_refuses_work() {
        let mut backend = MemoryBackend::default();
        backend.close().unwrap();
        assert!(matches!(&*backend.fetch("ls").unwrap_err(), ErrorKind::Closed));
    }
}
