//! Cross-crate integration test helpers.
//!
//! Provides a harness that plays the writer side of a watched directory
//! and checks the engine's view of it.

use crate::fixtures::{user_format, MemoryDir, OPEN_FILE};
use crate::generators::delimited_line;
use rowfeed_core::{Engine, EngineConfig, Row, ValidationOutcome, ValidationQuery};
use std::collections::BTreeMap;

/// A test harness for integration testing.
///
/// Rows written through the harness are tracked so that every one of them
/// can later be validated against the engine.
pub struct FeedHarness {
    /// The shared in-memory directory.
    pub dir: MemoryDir,
    /// The engine under test.
    pub engine: Engine,
    rows: BTreeMap<String, Row>,
    rollovers: usize,
}

impl FeedHarness {
    /// Creates a harness over an empty directory using the user-table format.
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// Creates a harness with `configure` applied to the engine config.
    pub fn with_config(configure: impl FnOnce(EngineConfig) -> EngineConfig) -> Self {
        let dir = MemoryDir::new();
        let engine = dir.engine_with(user_format(), configure);
        Self {
            dir,
            engine,
            rows: BTreeMap::new(),
            rollovers: 0,
        }
    }

    /// Appends `row` to the open file and tracks it.
    pub fn write(&mut self, row: Row) {
        self.dir.append_open(delimited_line(&row).as_bytes());
        let key = row.get("UserId").expect("row has a key").to_string();
        self.rows.insert(key, row);
    }

    /// Finalizes the open file under a fresh sequential name.
    pub fn roll_over(&mut self) {
        self.rollovers += 1;
        self.dir.roll_over(&format!("{:06}.csv", self.rollovers));
    }

    /// Returns true if the open file exists.
    pub fn has_open_file(&self) -> bool {
        self.dir.tree.contents(self.dir.file(OPEN_FILE)).is_some()
    }

    /// Validates one tracked row with every field.
    pub fn validate(&mut self, key: &str) -> ValidationOutcome {
        let row = self.rows.get(key).expect("row is tracked");
        let query: ValidationQuery = row.iter().collect();
        self.engine.validate(&query).expect("Failed to validate")
    }

    /// Polls, then asserts that every tracked row validates.
    pub fn verify_all(&mut self) {
        self.engine.poll().expect("Failed to poll");
        let keys: Vec<String> = self.rows.keys().cloned().collect();
        for key in keys {
            let outcome = self.validate(&key);
            assert!(outcome.is_success(), "row {key} did not validate: {outcome:?}");
        }
        assert_eq!(self.engine.index().len(), self.rows.len());
    }

    /// Number of tracked rows.
    pub fn tracked_count(&self) -> usize {
        self.rows.len()
    }
}

impl Default for FeedHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, role: &str) -> Row {
        [
            ("UserId", key),
            ("Name", "n"),
            ("FirstName", "f"),
            ("LastName", "l"),
            ("Group", "g"),
            ("Role", role),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn harness_tracks_rows_across_rollovers() {
        let mut harness = FeedHarness::new();
        harness.write(row("a", "r"));
        harness.engine.poll().unwrap();
        harness.write(row("b", "r"));
        harness.roll_over();
        harness.write(row("c", "r"));
        harness.roll_over();

        assert!(!harness.has_open_file());
        harness.verify_all();
        assert_eq!(harness.tracked_count(), 3);
    }

    #[test]
    fn rewritten_key_validates_latest_row() {
        let mut harness = FeedHarness::new();
        harness.write(row("a", "old"));
        harness.write(row("a", "new"));
        harness.verify_all();
        assert_eq!(harness.tracked_count(), 1);
    }
}
