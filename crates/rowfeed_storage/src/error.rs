//! Error types for directory source operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for directory source operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while listing, reading or writing a directory.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The directory or file does not exist.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Attempted to create a file that already exists.
    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Attempted to read beyond the end of a file.
    #[error("read beyond end of {}: offset {offset}, len {len}, size {size}", .path.display())]
    ReadPastEnd {
        /// The file that was read.
        path: PathBuf,
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current file size.
        size: u64,
    },

    /// The remote session could not be established or was rejected.
    #[error("authentication failed for {user}@{host}: {message}")]
    Authentication {
        /// Remote host.
        host: String,
        /// Remote user name.
        user: String,
        /// Description of the failure.
        message: String,
    },

    /// The remote configuration is incomplete or invalid.
    #[error("invalid remote configuration: {0}")]
    InvalidConfig(String),
}
