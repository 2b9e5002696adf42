//! Splitting change units into rows.
//!
//! Each [`ChangeUnit`] is parsed on its own: its bytes are cut on the line
//! terminator (a trailing empty segment is dropped) and every line is cut
//! into the declared fields. A line that does not fit becomes a
//! [`LineError`] and parsing continues with the next line.

use crate::change_feed::ChangeUnit;
use crate::format::{FormatSpec, Layout};
use crate::row::Row;
use serde::Serialize;
use tracing::warn;

/// A line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineError {
    /// File the line came from.
    pub file: String,
    /// Byte offset of the line within that file.
    pub offset: u64,
    /// The line, lossily decoded.
    pub line: String,
    /// Why it was rejected.
    pub message: String,
}

/// Rows and rejected lines of one change unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUnit {
    /// Rows in line order.
    pub rows: Vec<Row>,
    /// Rejected lines in line order.
    pub errors: Vec<LineError>,
}

/// Cuts `bytes` on `terminator`, returning each line with its offset.
///
/// A final segment without terminator is a line; a final empty segment is
/// not.
#[must_use]
pub fn split_lines<'a>(bytes: &'a [u8], terminator: &[u8]) -> Vec<(usize, &'a [u8])> {
    let mut lines = Vec::new();
    if terminator.is_empty() {
        if !bytes.is_empty() {
            lines.push((0, bytes));
        }
        return lines;
    }

    let mut start = 0;
    let mut i = 0;
    while i + terminator.len() <= bytes.len() {
        if &bytes[i..i + terminator.len()] == terminator {
            lines.push((start, &bytes[start..i]));
            i += terminator.len();
            start = i;
        } else {
            i += 1;
        }
    }
    if start < bytes.len() {
        lines.push((start, &bytes[start..]));
    }
    lines
}

/// Cuts one line into the fields of `format`.
///
/// # Errors
///
/// Returns a description of the problem if the line does not yield the
/// declared number of fields.
pub fn parse_line(line: &str, format: &FormatSpec) -> Result<Row, String> {
    match format.layout() {
        Layout::FixedWidth => {
            let total = format.total_width().unwrap_or(0);
            let len = line.chars().count();
            if len < total {
                return Err(format!(
                    "line has {len} characters, expected at least {total}"
                ));
            }

            let mut row = Row::new();
            let mut rest = line;
            for field in format.fields() {
                let width = field.width.unwrap_or(0);
                let cut = rest
                    .char_indices()
                    .nth(width)
                    .map_or(rest.len(), |(idx, _)| idx);
                row.push(field.name.clone(), &rest[..cut]);
                rest = &rest[cut..];
            }
            if !rest.is_empty() {
                warn!(
                    extra = rest.chars().count(),
                    ignored = rest,
                    "characters past the total width ignored"
                );
            }
            Ok(row)
        }
        Layout::Delimited(delimiter) => {
            let values: Vec<&str> = line.split(delimiter.as_str()).collect();
            if values.len() != format.fields().len() {
                return Err(format!(
                    "expected {} fields, found {}",
                    format.fields().len(),
                    values.len()
                ));
            }
            Ok(format
                .fields()
                .iter()
                .zip(values)
                .map(|(field, value)| (field.name.clone(), value))
                .collect())
        }
    }
}

/// Parses every line of `unit`.
#[must_use]
pub fn parse_unit(unit: &ChangeUnit, format: &FormatSpec) -> ParsedUnit {
    let mut parsed = ParsedUnit::default();
    for (offset, bytes) in split_lines(&unit.bytes, format.line_terminator().as_bytes()) {
        let offset = unit.start + offset as u64;
        let result = std::str::from_utf8(bytes)
            .map_err(|e| format!("line is not valid UTF-8: {e}"))
            .and_then(|line| parse_line(line, format));

        match result {
            Ok(row) => parsed.rows.push(row),
            Err(message) => parsed.errors.push(LineError {
                file: unit.file.clone(),
                offset,
                line: String::from_utf8_lossy(bytes).into_owned(),
                message,
            }),
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_feed::UnitReason;
    use crate::classifier::FileKind;

    fn delimited() -> FormatSpec {
        FormatSpec::builder()
            .fields("Id,Name,Group")
            .delimiter("|")
            .row_key("Id")
            .build()
            .unwrap()
    }

    fn fixed() -> FormatSpec {
        FormatSpec::builder()
            .fields("Id(3),Name(5)")
            .row_key("Id")
            .build()
            .unwrap()
    }

    fn unit(bytes: &[u8], start: u64) -> ChangeUnit {
        ChangeUnit {
            file: "cur.tmp".into(),
            kind: FileKind::Open,
            start,
            end: start + bytes.len() as u64,
            reason: UnitReason::Growth,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn split_drops_trailing_empty_segment() {
        let lines = split_lines(b"a\nbb\n", b"\n");
        assert_eq!(lines, vec![(0, &b"a"[..]), (2, &b"bb"[..])]);
    }

    #[test]
    fn split_keeps_unterminated_last_line() {
        let lines = split_lines(b"a\r\nb", b"\r\n");
        assert_eq!(lines, vec![(0, &b"a"[..]), (3, &b"b"[..])]);
    }

    #[test]
    fn split_keeps_inner_empty_lines() {
        let lines = split_lines(b"a\n\nb\n", b"\n");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].1.is_empty());
    }

    #[test]
    fn delimited_values_are_verbatim() {
        let row = parse_line("7| bob |admins", &delimited()).unwrap();
        assert_eq!(row.get("Id"), Some("7"));
        assert_eq!(row.get("Name"), Some(" bob "));
        assert_eq!(row.get("Group"), Some("admins"));
    }

    #[test]
    fn delimited_field_count_must_match() {
        assert!(parse_line("7|bob", &delimited()).is_err());
        assert!(parse_line("7|bob|a|b", &delimited()).is_err());
    }

    #[test]
    fn fixed_width_keeps_padding() {
        let row = parse_line("01 bob  ", &fixed()).unwrap();
        assert_eq!(row.get("Id"), Some("01 "));
        assert_eq!(row.get("Name"), Some("bob  "));
    }

    #[test]
    fn fixed_width_counts_characters() {
        let row = parse_line("1  zoë  ", &fixed()).unwrap();
        assert_eq!(row.get("Name"), Some("zoë  "));
    }

    #[test]
    fn fixed_width_short_line_is_rejected() {
        assert!(parse_line("01 bo", &fixed()).is_err());
    }

    #[test]
    fn fixed_width_ignores_trailing_characters() {
        let row = parse_line("01 bob  extra", &fixed()).unwrap();
        assert_eq!(row.get("Name"), Some("bob  "));
    }

    #[test]
    fn bad_lines_do_not_stop_the_unit() {
        let parsed = parse_unit(&unit(b"1|a|g\nbroken\n2|b|g\n", 100), &delimited());
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].offset, 106);
        assert_eq!(parsed.errors[0].line, "broken");
    }

    #[test]
    fn invalid_utf8_is_a_line_error() {
        let parsed = parse_unit(&unit(b"1|a|g\n\xff|b|g\n", 0), &delimited());
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].message.contains("UTF-8"));
    }
}
