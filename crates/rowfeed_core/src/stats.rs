//! Engine statistics.
//!
//! ```rust,ignore
//! let stats = engine.stats();
//! println!("Polls: {}", stats.polls);
//! println!("Rows ingested: {}", stats.rows_ingested);
//! ```

use serde::Serialize;

/// Counters accumulated over the lifetime of an engine.
///
/// All values are monotonically increasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    /// Polls performed.
    pub polls: u64,
    /// Polls that produced no bytes.
    pub empty_polls: u64,
    /// Change units read.
    pub units: u64,
    /// Bytes read from the watched directory.
    pub bytes_read: u64,
    /// Rollovers resolved.
    pub rollovers: u64,
    /// Rows added to the index.
    pub rows_ingested: u64,
    /// Rows that replaced an earlier row with the same key.
    pub rows_replaced: u64,
    /// Lines rejected by the parser.
    pub parse_errors: u64,
    /// Validations answered.
    pub validations: u64,
    /// Rows written by `add`.
    pub rows_written: u64,
}

impl FeedStats {
    /// Creates zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
