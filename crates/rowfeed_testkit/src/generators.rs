//! Property-based test generators using proptest.
//!
//! Provides strategies for generating rows and the ways a writer may
//! deliver them to a watched directory.

use proptest::prelude::*;
use rowfeed_core::Row;

/// Strategy for a field value that is safe in a comma-delimited line.
pub fn field_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 _.@-]{0,12}").expect("Invalid regex")
}

/// Strategy for a user-table row with the given key.
pub fn user_row_strategy(key: String) -> impl Strategy<Value = Row> {
    prop::collection::vec(field_value_strategy(), 5).prop_map(move |values| {
        let mut row = Row::new();
        row.push("UserId", key.clone());
        for (name, value) in ["Name", "FirstName", "LastName", "Group", "Role"]
            .into_iter()
            .zip(values)
        {
            row.push(name, value);
        }
        row
    })
}

/// Strategy for between `min` and `max` user rows with distinct keys.
pub fn user_rows_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Row>> {
    (min..max).prop_flat_map(|count| {
        (0..count)
            .map(|i| user_row_strategy(format!("user-{i}")))
            .collect::<Vec<_>>()
    })
}

/// Strategy for arbitrary appended content, including bytes that are not
/// valid UTF-8 and lines without a terminator.
pub fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for cut points splitting `len` bytes into growth steps.
///
/// The points are sorted, may repeat, and lie within `0..=len`.
pub fn split_points_strategy(len: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..=len, 0..8).prop_map(|mut points| {
        points.sort_unstable();
        points
    })
}

/// Strategy for content together with a way to split it into steps.
pub fn growth_strategy() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    content_strategy().prop_flat_map(|content| {
        let len = content.len();
        (Just(content), split_points_strategy(len))
    })
}

/// Splits `content` at `points` into consecutive chunks.
pub fn split_at_points<'a>(content: &'a [u8], points: &[usize]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::with_capacity(points.len() + 1);
    let mut start = 0;
    for &point in points {
        chunks.push(&content[start..point]);
        start = point;
    }
    chunks.push(&content[start..]);
    chunks
}

/// Formats a row as a comma-delimited line.
pub fn delimited_line(row: &Row) -> String {
    let values: Vec<&str> = row.iter().map(|(_, value)| value).collect();
    format!("{}\n", values.join(","))
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_covers_content() {
        let expected: Vec<&[u8]> = vec![b"", b"ab", b"", b"cde", b"f"];
        assert_eq!(split_at_points(b"abcdef", &[0, 2, 2, 5]), expected);
    }

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn chunks_concatenate_to_content((content, points) in growth_strategy()) {
            let joined: Vec<u8> = split_at_points(&content, &points).concat();
            prop_assert_eq!(joined, content);
        }

        #[test]
        fn generated_values_never_contain_delimiters(value in field_value_strategy()) {
            prop_assert!(!value.contains(','));
            prop_assert!(!value.contains('\n'));
        }

        #[test]
        fn user_rows_have_distinct_keys(rows in user_rows_strategy(1, 10)) {
            let mut keys: Vec<&str> = rows.iter().filter_map(|row| row.get("UserId")).collect();
            let count = keys.len();
            keys.sort_unstable();
            keys.dedup();
            prop_assert_eq!(keys.len(), count);
            prop_assert!(rows.iter().all(|row| row.len() == 6));
        }
    }
}
