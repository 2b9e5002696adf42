//! Comparing expected field values against indexed rows.

use crate::error::{CoreError, CoreResult};
use crate::format::FormatSpec;
use crate::index::RowIndex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Expected field values for one row, including the row key.
///
/// Fields are compared in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationQuery {
    fields: Vec<(String, String)>,
}

impl ValidationQuery {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an expected field value.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Returns the expected value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over `(name, expected)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns true if no fields were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for ValidationQuery
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// One field whose indexed value differs from the expected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMismatch {
    /// Field name.
    pub field: String,
    /// Expected value.
    pub expected: String,
    /// Indexed value.
    pub actual: String,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} expected:<{}> but was:<{}>",
            self.field, self.expected, self.actual
        )
    }
}

/// Result of a validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// Every expected field matched.
    Success,
    /// No row with the requested key has ever been ingested.
    NoMatchingKey {
        /// The requested key value.
        key: String,
    },
    /// The row exists but some fields differ.
    FieldMismatch {
        /// Every mismatching field, in query order.
        mismatches: Vec<FieldMismatch>,
    },
}

impl ValidationOutcome {
    /// Returns true for [`ValidationOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Converts the outcome into a `Result` for use with `?`.
    ///
    /// # Errors
    ///
    /// Returns the failure for any outcome other than success.
    pub fn into_result(self) -> Result<(), ValidationFailure> {
        match self {
            Self::Success => Ok(()),
            Self::NoMatchingKey { key } => Err(ValidationFailure::NoMatchingKey { key }),
            Self::FieldMismatch { mismatches } => Err(ValidationFailure::FieldMismatch(mismatches)),
        }
    }
}

/// An assertion-style validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// No row with the requested key has ever been ingested.
    #[error("no row found with key <{key}>")]
    NoMatchingKey {
        /// The requested key value.
        key: String,
    },
    /// Some fields differ.
    #[error("{}", render_mismatches(.0))]
    FieldMismatch(Vec<FieldMismatch>),
}

fn render_mismatches(mismatches: &[FieldMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checks `query` against `format`, returning the key value it names.
///
/// # Errors
///
/// Returns [`CoreError::InvalidQuery`] if the query lacks the row key,
/// names an undeclared field, or names a field twice.
pub fn query_key<'q>(query: &'q ValidationQuery, format: &FormatSpec) -> CoreResult<&'q str> {
    let mut seen: Vec<&str> = Vec::new();
    for (name, _) in query.iter() {
        if !format.has_field(name) {
            return Err(CoreError::invalid_query(format!(
                "field '{name}' is not declared"
            )));
        }
        if seen.contains(&name) {
            return Err(CoreError::invalid_query(format!(
                "field '{name}' is given twice"
            )));
        }
        seen.push(name);
    }

    query.get(format.row_key()).ok_or_else(|| {
        CoreError::invalid_query(format!("row key '{}' is missing", format.row_key()))
    })
}

/// Resolves the query's key in `index` and diffs the remaining fields.
///
/// # Errors
///
/// Returns [`CoreError::InvalidQuery`] if the query does not fit `format`.
pub fn validate(
    index: &RowIndex,
    format: &FormatSpec,
    query: &ValidationQuery,
) -> CoreResult<ValidationOutcome> {
    let key = query_key(query, format)?;
    let Some(row) = index.get(key) else {
        return Ok(ValidationOutcome::NoMatchingKey {
            key: key.to_string(),
        });
    };

    let mismatches: Vec<FieldMismatch> = query
        .iter()
        .filter(|(name, _)| *name != format.row_key())
        .filter_map(|(name, expected)| {
            let actual = row.get(name).unwrap_or_default();
            (actual != expected).then(|| FieldMismatch {
                field: name.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        })
        .collect();

    if mismatches.is_empty() {
        Ok(ValidationOutcome::Success)
    } else {
        Ok(ValidationOutcome::FieldMismatch { mismatches })
    }
}
