//! Test fixtures and directory helpers.
//!
//! Provides watched directories on disk and in memory, plus the user-table
//! format most scenarios are written against.

use rowfeed_core::{Engine, EngineConfig, FormatSpec, StartPosition};
use rowfeed_storage::InMemoryDirectory;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Name of the open file the fixtures write to.
pub const OPEN_FILE: &str = "current.tmp";

/// Fields of the user table.
pub const USER_FIELDS: &str = "UserId,Name,FirstName,LastName,Group,Role";

/// Delimited user-table format keyed by `UserId`.
pub fn user_format() -> FormatSpec {
    FormatSpec::builder()
        .fields(USER_FIELDS)
        .delimiter(",")
        .row_key("UserId")
        .build()
        .expect("user format is valid")
}

/// The `i`-th user row, with every value prefixed by `tempfile-`.
pub fn user_line(i: usize) -> String {
    let values: Vec<String> = USER_FIELDS
        .split(',')
        .map(|field| format!("tempfile-{field}{i}"))
        .collect();
    format!("{}\n", values.join(","))
}

/// The key of [`user_line`]`(i)`.
pub fn user_key(i: usize) -> String {
    format!("tempfile-UserId{i}")
}

/// A temporary directory watched by an engine, with writer-side helpers.
pub struct WatchedDir {
    temp_dir: TempDir,
}

impl WatchedDir {
    /// Creates an empty watched directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Returns the path of the open file.
    pub fn open_path(&self) -> PathBuf {
        self.path().join(OPEN_FILE)
    }

    /// Appends `data` to the open file, creating it if needed.
    pub fn append_open(&self, data: &[u8]) {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.open_path())
            .expect("Failed to open the open file");
        file.write_all(data).expect("Failed to append");
    }

    /// Finalizes the open file under `closed_name`.
    pub fn roll_over(&self, closed_name: &str) {
        fs::rename(self.open_path(), self.path().join(closed_name))
            .expect("Failed to roll over the open file");
    }

    /// Writes a finished file.
    pub fn put_closed(&self, name: &str, data: &[u8]) {
        fs::write(self.path().join(name), data).expect("Failed to write closed file");
    }

    /// Reads a file from the directory.
    pub fn read(&self, name: &str) -> Vec<u8> {
        fs::read(self.path().join(name)).expect("Failed to read file")
    }

    /// Names of every file in the directory, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("Failed to list directory")
            .map(|entry| {
                entry
                    .expect("Failed to read entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// Engine configuration reading and writing this directory.
    pub fn config(&self, format: FormatSpec) -> EngineConfig {
        EngineConfig::new(self.path(), format)
    }

    /// Opens a local engine over this directory.
    pub fn engine(&self, format: FormatSpec) -> Engine {
        Engine::open_local(self.config(format)).expect("Failed to open engine")
    }

    /// Opens a local engine that also reads what is already here.
    pub fn engine_from_start(&self, format: FormatSpec) -> Engine {
        Engine::open_local(self.config(format).start(StartPosition::Beginning))
            .expect("Failed to open engine")
    }
}

impl Default for WatchedDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory path used by in-memory fixtures.
pub const MEMORY_DIR: &str = "/watched";

/// An in-memory watched directory shared with an engine.
pub struct MemoryDir {
    /// The shared tree.
    pub tree: Arc<InMemoryDirectory>,
}

impl MemoryDir {
    /// Creates a tree containing only [`MEMORY_DIR`].
    pub fn new() -> Self {
        Self {
            tree: Arc::new(InMemoryDirectory::with_dirs([MEMORY_DIR])),
        }
    }

    /// Path of `name` inside [`MEMORY_DIR`].
    pub fn file(&self, name: &str) -> PathBuf {
        Path::new(MEMORY_DIR).join(name)
    }

    /// Appends `data` to the open file.
    pub fn append_open(&self, data: &[u8]) {
        self.tree.append(self.file(OPEN_FILE), data);
    }

    /// Finalizes the open file under `closed_name`.
    pub fn roll_over(&self, closed_name: &str) {
        assert!(
            self.tree.rename(self.file(OPEN_FILE), self.file(closed_name)),
            "no open file to roll over"
        );
    }

    /// Opens an engine over the shared tree with `configure` applied.
    pub fn engine_with(
        &self,
        format: FormatSpec,
        configure: impl FnOnce(EngineConfig) -> EngineConfig,
    ) -> Engine {
        let config = configure(EngineConfig::new(MEMORY_DIR, format));
        Engine::open(config, Box::new(Arc::clone(&self.tree))).expect("Failed to open engine")
    }

    /// Opens an engine over the shared tree.
    pub fn engine(&self, format: FormatSpec) -> Engine {
        self.engine_with(format, |config| config)
    }
}

impl Default for MemoryDir {
    fn default() -> Self {
        Self::new()
    }
}
