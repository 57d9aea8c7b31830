//! Log-structured file backend.
//!
//! The whole store is an append-only log of checksummed frames (see the
//! `frame` module). Opening replays the log into an ordered in-memory map;
//! every mutation appends exactly one frame with a single `write(2)` so a
//! crash can at worst lose the one frame being written. Deleting never
//! shrinks the file, [`compact`](Backend::compact) does.

use crate::backend::frame::{self, Frame, MAGIC};
use crate::backend::{Backend, Entries};
use crate::error::{ErrorKind, Result};
use crate::{OpenMode, lock};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Local file storage backend.
///
/// # Examples
///
/// ```no_run
/// use mandb_storage::{Backend, FileBackend, OpenMode};
///
/// # fn example() -> mandb_storage::error::Result<()> {
/// let backend = FileBackend::open("/var/cache/man/index.db", OpenMode::ReadOnly)?;
/// println!("{} keys", backend.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    mode: OpenMode,
    file: Option<File>,
    entries: BTreeMap<String, String>,
    garbage: usize,
}

impl FileBackend {
    /// Open (and lock) the database file at `path`.
    ///
    /// # Errors
    ///
    /// - [`NotFound`](ErrorKind::NotFound) if the file is missing and `mode`
    ///   does not create it.
    /// - [`Locked`](ErrorKind::Locked) if another handle holds an
    ///   incompatible lock. This never waits.
    /// - [`Corrupt`](ErrorKind::Corrupt) if the log fails validation before
    ///   its final frame.
    #[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        // Never let the OS truncate for us: the lock has to be held first, or
        // we could wipe a database out from under a reader.
        let mut file = OpenOptions::new()
            .read(true)
            .write(mode.is_writable())
            .create(mode.creates())
            .truncate(false)
            .open(&path)
            .map_err(|e| ErrorKind::from_io(e, &path))?;
        lock::acquire(&file, mode, &path)?;

        let mut backend = Self {
            path,
            mode,
            file: None,
            entries: BTreeMap::new(),
            garbage: 0,
        };
        if mode == OpenMode::CreateTruncate {
            file.set_len(0).map_err(ErrorKind::Io)?;
        }
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(ErrorKind::Io)?;

        if buf.is_empty() {
            if mode.is_writable() {
                file.write_all(MAGIC).map_err(ErrorKind::Io)?;
            }
        } else {
            let replay = frame::replay(&buf)?;
            if replay.is_torn(buf.len()) {
                tracing::warn!(
                    path = %backend.path.display(),
                    discarded = buf.len() - replay.valid_len,
                    "Discarding torn write at end of database"
                );
                if mode.is_writable() {
                    file.set_len(replay.valid_len as u64).map_err(ErrorKind::Io)?;
                }
            }
            backend.entries = replay.entries;
            backend.garbage = replay.garbage;
        }
        file.seek(SeekFrom::End(0)).map_err(ErrorKind::Io)?;
        backend.file = Some(file);
        Ok(backend)
    }

    /// Number of dead frames a [`compact`](Backend::compact) would reclaim.
    pub fn garbage(&self) -> usize {
        self.garbage
    }

    fn writable(&mut self) -> Result<&mut File> {
        if !self.mode.is_writable() {
            exn::bail!(ErrorKind::ReadOnly(self.path.clone()));
        }
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => exn::bail!(ErrorKind::Closed),
        }
    }

    fn readable(&self) -> Result<()> {
        match self.file {
            Some(_) => Ok(()),
            None => exn::bail!(ErrorKind::Closed),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".compact");
        PathBuf::from(staging)
    }

    fn append(&mut self, frame: Frame<'_>) -> Result<()> {
        let bytes = frame.encode();
        self.writable()?.write_all(&bytes).map_err(ErrorKind::Io)?;
        Ok(())
    }
}

/// Write a complete log to `staging`, locked the way the live database is.
fn write_staged(staging: &Path, path: &Path, buf: &[u8]) -> Result<File> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(staging)
        .map_err(|e| ErrorKind::from_io(e, staging))?;
    lock::acquire(&file, OpenMode::ReadWrite, path)?;
    file.write_all(buf).map_err(ErrorKind::Io)?;
    file.sync_data().map_err(ErrorKind::Io)?;
    Ok(file)
}

impl Backend for FileBackend {
    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert(&mut self, key: &str, value: &str) -> Result<bool> {
        self.writable()?;
        if self.entries.contains_key(key) {
            return Ok(false);
        }
        self.append(Frame::Put(key, value))?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    fn replace(&mut self, key: &str, value: &str) -> Result<()> {
        self.append(Frame::Put(key, value))?;
        if self.entries.insert(key.to_string(), value.to_string()).is_some() {
            self.garbage += 1;
        }
        Ok(())
    }

    fn fetch(&self, key: &str) -> Result<Option<String>> {
        self.readable()?;
        Ok(self.entries.get(key).cloned())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.readable()?;
        Ok(self.entries.contains_key(key))
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        self.writable()?;
        if !self.entries.contains_key(key) {
            return Ok(false);
        }
        self.append(Frame::Delete(key))?;
        self.entries.remove(key);
        self.garbage += 2;
        Ok(true)
    }

    fn iter(&self) -> Entries<'_> {
        Box::new(self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.path.display(), garbage = self.garbage))]
    fn compact(&mut self) -> Result<()> {
        let mut buf = MAGIC.to_vec();
        for (key, value) in &self.entries {
            Frame::Put(key, value).encode_into(&mut buf);
        }
        self.writable()?;
        // The live log stays untouched until the rewritten one is complete
        // on disk, then the rename swaps them in one step.
        let staging = self.staging_path();
        let written = write_staged(&staging, &self.path, &buf);
        let file = match written {
            Ok(file) => file,
            Err(err) => {
                let _ = std::fs::remove_file(&staging);
                return Err(err);
            },
        };
        if let Err(err) = std::fs::rename(&staging, &self.path) {
            let _ = std::fs::remove_file(&staging);
            exn::bail!(ErrorKind::from_io(err, &self.path));
        }
        if let Some(old) = self.file.replace(file) {
            lock::release(&old, &self.path);
        }
        self.garbage = 0;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(file) = self.file.take() else {
            exn::bail!(ErrorKind::Closed);
        };
        if self.mode.is_writable() {
            file.sync_data().map_err(ErrorKind::Io)?;
        }
        lock::release(&file, &self.path);
        Ok(())
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            lock::release(&file, &self.path);
        }
    }
}
