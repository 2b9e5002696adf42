//! # RowFeed Storage
//!
//! Directory source trait and implementations for RowFeed.
//!
//! This crate provides the lowest-level abstraction RowFeed watches: a
//! directory that can be listed, read at an offset, and written with brand
//! new files. Sources are **opaque file stores** - they know nothing about
//! open/closed suffixes, rows, or read positions.
//!
//! ## Design Principles
//!
//! - Sources are simple (list, read_at, create)
//! - No knowledge of row formats or cursor state
//! - Must be `Send + Sync`
//! - Renames and deletes are performed by the external writer, never by us
//!
//! ## Available Sources
//!
//! - [`InMemoryDirectory`] - For testing
//! - [`LocalDirectory`] - For the local file system
//! - Remote sessions opened through a [`RemoteConnector`]
//!
//! ## Example
//!
//! ```rust
//! use rowfeed_storage::{DirectorySource, InMemoryDirectory};
//! use std::path::Path;
//!
//! let dir = InMemoryDirectory::with_dirs(["/out"]);
//! dir.append("/out/rows.tmp", b"hello world");
//! let data = dir.read_at(Path::new("/out/rows.tmp"), 6, 5).unwrap();
//! assert_eq!(&data, b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod local;
mod memory;
mod remote;
mod source;

pub use error::{StorageError, StorageResult};
pub use local::LocalDirectory;
pub use memory::InMemoryDirectory;
pub use remote::{connect, Credential, RemoteConfig, RemoteConnector, DEFAULT_PORT};
pub use source::{DirEntry, DirectorySource};
