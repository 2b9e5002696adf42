//! In-memory directory source for testing.

use crate::error::{StorageError, StorageResult};
use crate::source::{DirEntry, DirectorySource};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// An in-memory directory tree.
///
/// Besides the [`DirectorySource`] operations the engine uses, it exposes
/// the mutations an external writer performs on a watched directory
/// (append, rename, remove) so tests can script growth and rollover.
///
/// # Thread Safety
///
/// This source is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use rowfeed_storage::{DirectorySource, InMemoryDirectory};
/// use std::path::Path;
///
/// let dir = InMemoryDirectory::with_dirs(["/out"]);
/// dir.append("/out/current.tmp", b"a,b\n");
/// dir.rename("/out/current.tmp", "/out/0001.csv");
///
/// let entries = dir.list(Path::new("/out")).unwrap();
/// assert_eq!(entries[0].name, "0001.csv");
/// assert_eq!(entries[0].size, 4);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    dirs: RwLock<BTreeSet<PathBuf>>,
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
}

impl InMemoryDirectory {
    /// Creates an empty tree with no directories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree with the given directories already present.
    pub fn with_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let tree = Self::new();
        for dir in dirs {
            tree.add_dir(dir);
        }
        tree
    }

    /// Adds a directory.
    pub fn add_dir(&self, dir: impl AsRef<Path>) {
        self.dirs.write().insert(dir.as_ref().to_path_buf());
    }

    /// Replaces the content of `path`, creating the file if needed.
    pub fn put(&self, path: impl AsRef<Path>, data: &[u8]) {
        self.files
            .write()
            .insert(path.as_ref().to_path_buf(), data.to_vec());
    }

    /// Appends to `path`, creating the file if needed.
    pub fn append(&self, path: impl AsRef<Path>, data: &[u8]) {
        self.files
            .write()
            .entry(path.as_ref().to_path_buf())
            .or_default()
            .extend_from_slice(data);
    }

    /// Moves `from` to `to`, replacing any file at `to`.
    ///
    /// Returns false if `from` does not exist.
    pub fn rename(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> bool {
        let mut files = self.files.write();
        match files.remove(from.as_ref()) {
            Some(data) => {
                files.insert(to.as_ref().to_path_buf(), data);
                true
            }
            None => false,
        }
    }

    /// Removes `path`. Returns false if it did not exist.
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.files.write().remove(path.as_ref()).is_some()
    }

    /// Returns a copy of the content of `path`.
    #[must_use]
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.read().get(path.as_ref()).cloned()
    }

    /// Returns the names of the files directly inside `dir`.
    #[must_use]
    pub fn file_names(&self, dir: impl AsRef<Path>) -> Vec<String> {
        let dir = dir.as_ref();
        self.files
            .read()
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }
}

impl DirectorySource for InMemoryDirectory {
    fn list(&self, dir: &Path) -> StorageResult<Vec<DirEntry>> {
        if !self.dirs.read().contains(dir) {
            return Err(StorageError::NotFound(dir.to_path_buf()));
        }

        let files = self.files.read();
        let entries = files
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .filter_map(|(path, data)| {
                path.file_name()
                    .map(|name| DirEntry::new(name.to_string_lossy(), data.len() as u64))
            })
            .collect();
        Ok(entries)
    }

    fn read_at(&self, path: &Path, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let files = self.files.read();
        let data = files
            .get(path)
            .ok_or_else(|| StorageError::NotFound(path.to_path_buf()))?;
        let size = data.len() as u64;
        let offset_usize = offset as usize;
        let end = offset_usize.saturating_add(len);

        if offset > size || end > data.len() {
            return Err(StorageError::ReadPastEnd {
                path: path.to_path_buf(),
                offset,
                len,
                size,
            });
        }

        Ok(data[offset_usize..end].to_vec())
    }

    fn create(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        if !self.dirs.read().contains(parent) {
            return Err(StorageError::NotFound(parent.to_path_buf()));
        }

        let mut files = self.files.write();
        if files.contains_key(path) {
            return Err(StorageError::AlreadyExists(path.to_path_buf()));
        }
        files.insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
