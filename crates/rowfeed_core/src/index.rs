//! Row index keyed by the row-key field.

use crate::row::Row;
use std::collections::HashMap;

/// Accumulated rows, keyed by the value of the row-key field.
///
/// `RowIndex` is a hash index for exact-match lookups. It only grows: a
/// row whose key is already present replaces the earlier row (last write
/// wins), and nothing is ever removed for the lifetime of the engine.
///
/// # Example
///
/// ```rust
/// use rowfeed_core::{Row, RowIndex};
///
/// let mut index = RowIndex::new("Id");
/// let row: Row = [("Id", "7"), ("Name", "bob")].into_iter().collect();
/// index.insert(row).unwrap();
///
/// assert_eq!(index.get("7").unwrap().get("Name"), Some("bob"));
/// ```
#[derive(Debug, Clone)]
pub struct RowIndex {
    key_field: String,
    rows: HashMap<String, Row>,
    replaced: u64,
}

impl RowIndex {
    /// Creates an empty index keyed by `key_field`.
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            rows: HashMap::new(),
            replaced: 0,
        }
    }

    /// Returns the name of the key field.
    #[must_use]
    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Inserts `row` under its key value, returning the row it replaced.
    ///
    /// Rows without the key field are ignored and returned unchanged in
    /// `Err`.
    pub fn insert(&mut self, row: Row) -> Result<Option<Row>, Row> {
        let Some(key) = row.get(&self.key_field).map(str::to_owned) else {
            return Err(row);
        };
        let previous = self.rows.insert(key, row);
        if previous.is_some() {
            self.replaced += 1;
        }
        Ok(previous)
    }

    /// Returns the row for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Row> {
        self.rows.get(key)
    }

    /// Returns true if a row for `key` has been ingested.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if nothing has been ingested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of inserts that replaced an existing row.
    #[must_use]
    pub fn replaced(&self) -> u64 {
        self.replaced
    }

    /// Returns all keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.rows.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
