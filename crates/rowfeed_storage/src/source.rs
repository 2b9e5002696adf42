//! Directory source trait definition.

use crate::error::StorageResult;
use std::path::Path;

/// A single entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DirEntry {
    /// File name, relative to the listed directory.
    pub name: String,
    /// Size of the file in bytes at listing time.
    pub size: u64,
}

impl DirEntry {
    /// Creates a directory entry.
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// A place where watched files live.
///
/// Directory sources are **opaque file stores**. They list, read and create
/// files; they never interpret row formats or track read positions. RowFeed
/// owns all of that.
///
/// # Invariants
///
/// - `list` returns regular files only, one entry per file name
/// - `read_at` returns exactly `len` bytes starting at `offset`
/// - `create` never overwrites or appends to an existing file
/// - Sources are never asked to rename or delete watched files
///
/// # Implementors
///
/// - [`super::InMemoryDirectory`] - For testing
/// - [`super::LocalDirectory`] - For the local file system
/// - Remote sessions returned by a [`super::RemoteConnector`]
pub trait DirectorySource: Send + Sync {
    /// Lists the regular files in `dir` with their current sizes.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory does not exist or cannot be read.
    fn list(&self, dir: &Path) -> StorageResult<Vec<DirEntry>>;

    /// Reads `len` bytes of `path` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, path: &Path, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Creates a new file at `path` holding `data`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::AlreadyExists`] if the file exists, or
    /// an I/O error if it cannot be written.
    fn create(&self, path: &Path, data: &[u8]) -> StorageResult<()>;

    /// Releases any session held by this source.
    ///
    /// Local sources hold nothing and use the default no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the session could not be shut down cleanly.
    fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Human readable description used in log output.
    fn describe(&self) -> String {
        "directory".to_string()
    }
}

impl<S: DirectorySource + ?Sized> DirectorySource for Box<S> {
    fn list(&self, dir: &Path) -> StorageResult<Vec<DirEntry>> {
        (**self).list(dir)
    }

    fn read_at(&self, path: &Path, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        (**self).read_at(path, offset, len)
    }

    fn create(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        (**self).create(path, data)
    }

    fn close(&self) -> StorageResult<()> {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: DirectorySource + ?Sized> DirectorySource for std::sync::Arc<S> {
    fn list(&self, dir: &Path) -> StorageResult<Vec<DirEntry>> {
        (**self).list(dir)
    }

    fn read_at(&self, path: &Path, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        (**self).read_at(path, offset, len)
    }

    fn create(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        (**self).create(path, data)
    }

    fn close(&self) -> StorageResult<()> {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
