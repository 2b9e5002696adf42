//! Textual row format.
//!
//! A [`FormatSpec`] describes how rows look on disk: the ordered fields, how
//! a line is cut into them ([`Layout`]), which field is the row key, and
//! which file suffixes mark in-progress and finalized files.
//!
//! Field definitions use a compact textual form:
//!
//! ```text
//! UserId,Name,Group            delimited layout
//! UserId(10),Name(20),Group(8) fixed-width layout
//! ```
//!
//! All fields must use the same form.

use crate::error::{CoreError, CoreResult};

/// Default suffix of the in-progress file.
pub const DEFAULT_OPEN_SUFFIX: &str = ".tmp";
/// Default suffix of finalized files.
pub const DEFAULT_CLOSED_SUFFIX: &str = ".csv";
/// Default line terminator.
pub const DEFAULT_LINE_TERMINATOR: &str = "\n";

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Width in characters, for fixed-width layouts.
    pub width: Option<usize>,
}

impl FieldSpec {
    /// Parses one definition, `Name` or `Name(width)`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for empty names, unbalanced
    /// parentheses or a width that is not a positive integer.
    pub fn parse(definition: &str) -> CoreResult<Self> {
        let definition = definition.trim();
        let (name, width) = match definition.find('(') {
            Some(open) => {
                let Some(inner) = definition[open + 1..].strip_suffix(')') else {
                    return Err(CoreError::configuration(format!(
                        "field definition '{definition}' is missing ')'"
                    )));
                };
                let width: usize = inner.trim().parse().map_err(|_| {
                    CoreError::configuration(format!(
                        "field definition '{definition}' has an invalid width"
                    ))
                })?;
                if width == 0 {
                    return Err(CoreError::configuration(format!(
                        "field definition '{definition}' has a zero width"
                    )));
                }
                (definition[..open].trim(), Some(width))
            }
            None => (definition, None),
        };

        if name.is_empty() {
            return Err(CoreError::configuration(format!(
                "field definition '{definition}' has an empty name"
            )));
        }
        if name.contains(')') {
            return Err(CoreError::configuration(format!(
                "field definition '{definition}' is malformed"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            width,
        })
    }
}

/// How a line is cut into fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Every field occupies its declared width.
    FixedWidth,
    /// Fields are separated by a delimiter.
    Delimited(String),
}

/// Immutable description of the row format and file naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    fields: Vec<FieldSpec>,
    layout: Layout,
    row_key: String,
    open_suffix: String,
    closed_suffix: String,
    line_terminator: String,
}

impl FormatSpec {
    /// Starts building a format.
    #[must_use]
    pub fn builder() -> FormatSpecBuilder {
        FormatSpecBuilder::default()
    }

    /// Parses a comma-separated list of field definitions.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any definition is malformed.
    pub fn parse_fields(definitions: &str) -> CoreResult<Vec<FieldSpec>> {
        definitions
            .split(',')
            .filter(|definition| !definition.trim().is_empty())
            .map(FieldSpec::parse)
            .collect()
    }

    /// Returns the declared fields in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Returns the layout.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the name of the row-key field.
    #[must_use]
    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    /// Returns the suffix of the in-progress file.
    #[must_use]
    pub fn open_suffix(&self) -> &str {
        &self.open_suffix
    }

    /// Returns the suffix of finalized files.
    #[must_use]
    pub fn closed_suffix(&self) -> &str {
        &self.closed_suffix
    }

    /// Returns the line terminator.
    #[must_use]
    pub fn line_terminator(&self) -> &str {
        &self.line_terminator
    }

    /// Returns true if `name` is a declared field.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Returns the position of the field called `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Sum of all widths, for fixed-width layouts.
    #[must_use]
    pub fn total_width(&self) -> Option<usize> {
        match self.layout {
            Layout::FixedWidth => Some(self.fields.iter().filter_map(|f| f.width).sum()),
            Layout::Delimited(_) => None,
        }
    }
}

/// Builder for [`FormatSpec`].
#[derive(Debug, Clone, Default)]
pub struct FormatSpecBuilder {
    fields: Vec<FieldSpec>,
    field_definitions: Option<String>,
    delimiter: Option<String>,
    row_key: Option<String>,
    open_suffix: Option<String>,
    closed_suffix: Option<String>,
    line_terminator: Option<String>,
}

impl FormatSpecBuilder {
    /// Sets the fields from their textual definitions.
    #[must_use]
    pub fn fields(mut self, definitions: impl Into<String>) -> Self {
        self.field_definitions = Some(definitions.into());
        self
    }

    /// Appends a delimited field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            width: None,
        });
        self
    }

    /// Appends a fixed-width field.
    #[must_use]
    pub fn fixed_field(mut self, name: impl Into<String>, width: usize) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            width: Some(width),
        });
        self
    }

    /// Sets the delimiter of a delimited layout.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Sets the row-key field.
    #[must_use]
    pub fn row_key(mut self, name: impl Into<String>) -> Self {
        self.row_key = Some(name.into());
        self
    }

    /// Sets the suffix of the in-progress file.
    #[must_use]
    pub fn open_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.open_suffix = Some(suffix.into());
        self
    }

    /// Sets the suffix of finalized files.
    #[must_use]
    pub fn closed_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.closed_suffix = Some(suffix.into());
        self
    }

    /// Sets the line terminator.
    #[must_use]
    pub fn line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = Some(terminator.into());
        self
    }

    /// Validates the settings and builds the format.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - No fields are declared, or a name is empty or repeated
    /// - Widths are given for some fields but not others
    /// - Both widths and a delimiter are given, or neither is
    /// - The row key is unset or names an undeclared field
    /// - A suffix or the line terminator is empty, or both suffixes are equal
    pub fn build(self) -> CoreResult<FormatSpec> {
        let mut fields = self.fields;
        if let Some(definitions) = &self.field_definitions {
            fields.extend(FormatSpec::parse_fields(definitions)?);
        }

        if fields.is_empty() {
            return Err(CoreError::configuration("no fields declared"));
        }
        for (i, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(CoreError::configuration("field name is empty"));
            }
            if field.width == Some(0) {
                return Err(CoreError::configuration(format!(
                    "field '{}' has a zero width",
                    field.name
                )));
            }
            if fields[..i].iter().any(|other| other.name == field.name) {
                return Err(CoreError::configuration(format!(
                    "field '{}' is declared twice",
                    field.name
                )));
            }
        }

        let fixed = fields.iter().filter(|f| f.width.is_some()).count();
        let layout = if fixed == fields.len() {
            if self.delimiter.is_some() {
                return Err(CoreError::configuration(
                    "a delimiter cannot be combined with field widths",
                ));
            }
            Layout::FixedWidth
        } else if fixed == 0 {
            match self.delimiter {
                Some(delimiter) if !delimiter.is_empty() => Layout::Delimited(delimiter),
                _ => {
                    return Err(CoreError::configuration(
                        "either a delimiter or field widths must be set",
                    ))
                }
            }
        } else {
            return Err(CoreError::configuration(
                "all fields must declare a width, or none",
            ));
        };

        let row_key = self
            .row_key
            .ok_or_else(|| CoreError::configuration("row key field is not set"))?;
        if !fields.iter().any(|field| field.name == row_key) {
            return Err(CoreError::configuration(format!(
                "row key '{row_key}' is not a declared field"
            )));
        }

        let open_suffix = self
            .open_suffix
            .unwrap_or_else(|| DEFAULT_OPEN_SUFFIX.to_string());
        let closed_suffix = self
            .closed_suffix
            .unwrap_or_else(|| DEFAULT_CLOSED_SUFFIX.to_string());
        if open_suffix.is_empty() || closed_suffix.is_empty() {
            return Err(CoreError::configuration("file suffixes must not be empty"));
        }
        if open_suffix == closed_suffix {
            return Err(CoreError::configuration(
                "open and closed suffixes must differ",
            ));
        }

        let line_terminator = self
            .line_terminator
            .unwrap_or_else(|| DEFAULT_LINE_TERMINATOR.to_string());
        if line_terminator.is_empty() {
            return Err(CoreError::configuration("line terminator must not be empty"));
        }

        Ok(FormatSpec {
            fields,
            layout,
            row_key,
            open_suffix,
            closed_suffix,
            line_terminator,
        })
    }
}
