//! Local file system directory source.

use crate::error::{StorageError, StorageResult};
use crate::source::{DirEntry, DirectorySource};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A directory source backed by the local file system.
///
/// Every call goes straight to the OS: files are reopened on each read so
/// that growth, renames and replacements done by the external writer are
/// always observed.
///
/// # Example
///
/// ```no_run
/// use rowfeed_storage::{DirectorySource, LocalDirectory};
/// use std::path::Path;
///
/// let source = LocalDirectory::new();
/// for entry in source.list(Path::new("/var/spool/out")).unwrap() {
///     println!("{} ({} bytes)", entry.name, entry.size);
/// }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDirectory;

impl LocalDirectory {
    /// Creates a local directory source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn map_not_found(err: io::Error, path: &Path) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(path.to_path_buf())
    } else {
        StorageError::Io(err)
    }
}

impl DirectorySource for LocalDirectory {
    fn list(&self, dir: &Path) -> StorageResult<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| map_not_found(e, dir))? {
            let entry = entry?;
            // The writer may rename the file between read_dir and metadata.
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() {
                continue;
            }
            entries.push(DirEntry::new(
                entry.file_name().to_string_lossy().into_owned(),
                metadata.len(),
            ));
        }
        entries.sort();
        Ok(entries)
    }

    fn read_at(&self, path: &Path, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let mut file = File::open(path).map_err(|e| map_not_found(e, path))?;
        let size = file.metadata()?.len();
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd {
                path: path.to_path_buf(),
                offset,
                len,
                size,
            });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn create(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.to_path_buf()),
                _ => map_not_found(e, path),
            })?;
        file.write_all(data)?;
        file.sync_all()?;
        Ok(())
    }

    fn describe(&self) -> String {
        "local".to_string()
    }
}
