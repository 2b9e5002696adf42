//! Synthesizing rows into new files.

use crate::error::{CoreError, CoreResult};
use crate::format::{FormatSpec, Layout};
use crate::row::Row;
use rowfeed_storage::DirectorySource;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Formats one line from `fields`, without a line terminator.
///
/// Fixed-width values are left-justified and padded with spaces to their
/// width; longer values are written unchanged and logged, since they shift
/// every later field when the line is read back. Delimited values are joined
/// with the delimiter. Declared fields missing from `fields` are written
/// as empty values.
///
/// # Errors
///
/// Returns [`CoreError::InvalidQuery`] if `fields` names an undeclared field.
pub fn format_row(format: &FormatSpec, fields: &Row) -> CoreResult<String> {
    if let Some((name, _)) = fields.iter().find(|(name, _)| !format.has_field(name)) {
        return Err(CoreError::invalid_query(format!(
            "field '{name}' is not declared"
        )));
    }

    let values = format
        .fields()
        .iter()
        .map(|field| (field, fields.get(&field.name).unwrap_or_default()));

    for name in over_width(format, fields) {
        warn!(field = name, "value is wider than its field and will shift later fields");
    }

    let line = match format.layout() {
        Layout::FixedWidth => values
            .map(|(field, value)| format!("{value:<width$}", width = field.width.unwrap_or(0)))
            .collect::<String>(),
        Layout::Delimited(delimiter) => values
            .map(|(_, value)| value)
            .collect::<Vec<_>>()
            .join(delimiter),
    };
    Ok(line)
}

/// Names of fixed-width fields whose value in `fields` exceeds the width.
fn over_width<'a>(format: &'a FormatSpec, fields: &Row) -> Vec<&'a str> {
    format
        .fields()
        .iter()
        .filter(|field| {
            field.width.is_some_and(|width| {
                fields
                    .get(&field.name)
                    .is_some_and(|value| value.chars().count() > width)
            })
        })
        .map(|field| field.name.as_str())
        .collect()
}

/// Generates a fresh closed-file name.
#[must_use]
pub fn new_file_name(format: &FormatSpec) -> String {
    format!("{}{}", Uuid::new_v4().simple(), format.closed_suffix())
}

/// Writes `fields` as a single-row file in `dir`.
///
/// Every call creates a brand-new file; nothing is ever appended.
///
/// # Errors
///
/// Returns an error if the row does not fit the format or the file cannot
/// be created.
pub fn write_row(
    source: &dyn DirectorySource,
    dir: &Path,
    format: &FormatSpec,
    fields: &Row,
) -> CoreResult<PathBuf> {
    let line = format_row(format, fields)?;
    let path = dir.join(new_file_name(format));
    source.create(&path, line.as_bytes())?;
    info!(path = %path.display(), bytes = line.len(), "row written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowfeed_storage::InMemoryDirectory;

    fn fixed() -> FormatSpec {
        FormatSpec::builder()
            .fields("Id(4),Name(6),Flag(1)")
            .row_key("Id")
            .closed_suffix(".dat")
            .build()
            .unwrap()
    }

    fn delimited() -> FormatSpec {
        FormatSpec::builder()
            .fields("Id,Name,Flag")
            .delimiter("::")
            .row_key("Id")
            .build()
            .unwrap()
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().copied().collect()
    }

    #[test]
    fn fixed_width_pads_to_width() {
        let line = format_row(&fixed(), &row(&[("Id", "7"), ("Name", "bob"), ("Flag", "Y")])).unwrap();
        assert_eq!(line, "7   bob   Y");
    }

    #[test]
    fn fixed_width_keeps_long_values() {
        let line = format_row(&fixed(), &row(&[("Id", "12345"), ("Name", "al"), ("Flag", "N")])).unwrap();
        assert_eq!(line, "12345al    N");
    }

    #[test]
    fn over_width_values_are_detected() {
        let format = fixed();
        let long = row(&[("Id", "12345"), ("Name", "al"), ("Flag", "NO")]);
        assert_eq!(over_width(&format, &long), vec!["Id", "Flag"]);
        assert!(over_width(&format, &row(&[("Id", "1234")])).is_empty());
        assert!(over_width(&delimited(), &row(&[("Id", "12345")])).is_empty());
    }

    #[test]
    fn over_width_value_shifts_fields_read_back() {
        let format = fixed();
        let line = format_row(&format, &row(&[("Id", "12345"), ("Name", "al"), ("Flag", "N")])).unwrap();
        let read = crate::parser::parse_line(&line, &format).unwrap();
        assert_eq!(read.get("Id"), Some("1234"));
        assert_eq!(read.get("Name"), Some("5al   "));
    }

    #[test]
    fn fixed_width_uses_declared_order_and_fills_missing() {
        let line = format_row(&fixed(), &row(&[("Flag", "Y"), ("Id", "1")])).unwrap();
        assert_eq!(line, "1         Y");
    }

    #[test]
    fn delimited_joins_raw_values() {
        let line = format_row(&delimited(), &row(&[("Id", " 7"), ("Name", "bob"), ("Flag", "")])).unwrap();
        assert_eq!(line, " 7::bob::");
    }

    #[test]
    fn undeclared_field_is_rejected() {
        let result = format_row(&delimited(), &row(&[("Id", "1"), ("Email", "x")]));
        assert!(matches!(result, Err(CoreError::InvalidQuery { .. })));
    }

    #[test]
    fn file_names_are_unique_and_closed() {
        let a = new_file_name(&fixed());
        let b = new_file_name(&fixed());
        assert_ne!(a, b);
        assert!(a.ends_with(".dat"));
    }

    #[test]
    fn write_creates_one_file_per_row() {
        let tree = InMemoryDirectory::with_dirs(["/in"]);
        let format = delimited();

        let first = write_row(&tree, Path::new("/in"), &format, &row(&[("Id", "1")])).unwrap();
        let second = write_row(&tree, Path::new("/in"), &format, &row(&[("Id", "2")])).unwrap();

        assert_ne!(first, second);
        assert_eq!(tree.file_names("/in").len(), 2);
        assert_eq!(tree.contents(&first).unwrap(), b"1::::");
        assert_eq!(tree.contents(&second).unwrap(), b"2::::");
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let tree = InMemoryDirectory::new();
        let result = write_row(&tree, Path::new("/in"), &delimited(), &row(&[("Id", "1")]));
        assert!(matches!(result, Err(CoreError::Transport(_))));
    }
}
