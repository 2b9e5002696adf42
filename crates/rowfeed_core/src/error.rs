//! Error types for RowFeed core.

use rowfeed_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in RowFeed core operations.
///
/// Every variant is fatal to the current call. Assertion-style failures
/// (an unknown key, mismatching fields) are not errors; they are reported
/// through [`crate::ValidationOutcome`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// The format or engine configuration is invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// The directory source failed.
    #[error("transport error: {0}")]
    Transport(#[from] StorageError),

    /// A line could not be split into the declared fields.
    #[error("parse error in {file} at byte {offset}: {message}")]
    Parse {
        /// File the line came from.
        file: String,
        /// Byte offset of the line within the file.
        offset: u64,
        /// Description of the problem.
        message: String,
    },

    /// The directory holds more than one in-progress file.
    #[error("more than one open file in watched directory: {first} and {second}")]
    AmbiguousOpenFile {
        /// First open file, in name order.
        first: String,
        /// Second open file, in name order.
        second: String,
    },

    /// A finalized file does not start with the bytes already consumed.
    #[error("rollover of {open} into {closed} does not preserve the consumed prefix")]
    RolloverMismatch {
        /// The vanished open file.
        open: String,
        /// The closed file that was expected to continue it.
        closed: String,
    },

    /// A validation query or row map does not fit the format.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Description of the problem.
        message: String,
    },

    /// The poll preceding a validation observed no new bytes.
    #[error("no new data since the previous poll")]
    NoNewData,

    /// The engine has been closed.
    #[error("engine is closed")]
    Closed,
}

impl CoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Returns true for errors raised while validating configuration.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
