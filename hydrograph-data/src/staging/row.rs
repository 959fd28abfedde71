//! Delimited row codec shared by the writer, the reconciliation pass and the
//! SQLite loader.
//!
//! Rows follow the PostgreSQL `COPY` text format with `|` as delimiter and
//! the empty string as null marker. Backslash, the delimiter, newline and
//! carriage return are backslash-escaped inside fields.

use std::{
    borrow::Cow,
    io::{self, Write},
};

use hydrograph_core::OsmId;

/// Field delimiter of every staged table.
pub const DELIMITER: char = '|';

/// Text standing for SQL `NULL`.
pub const NULL_MARKER: &str = "";

/// A single staged field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    /// An identifier, written in decimal.
    Id(OsmId),
    /// Free text, escaped on write.
    Text(&'a str),
    /// SQL `NULL`.
    Null,
}

impl<'a> From<Option<&'a str>> for Field<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(Self::Null, Self::Text)
    }
}

/// Write one newline-terminated row.
pub fn write_row<W: Write>(out: &mut W, fields: &[Field<'_>]) -> io::Result<()> {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            write!(out, "{DELIMITER}")?;
        }
        match field {
            Field::Id(id) => write!(out, "{id}")?,
            Field::Text(text) => out.write_all(escape_field(text).as_bytes())?,
            Field::Null => out.write_all(NULL_MARKER.as_bytes())?,
        }
    }
    out.write_all(b"\n")
}

/// Escape `value` for inclusion in a staged row.
///
/// # Examples
/// ```
/// use hydrograph_data::staging::row::escape_field;
///
/// assert_eq!(escape_field("Seine"), "Seine");
/// assert_eq!(escape_field("A|B"), r"A\|B");
/// ```
#[must_use]
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', DELIMITER, '\n', '\r']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 4);
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str(r"\\"),
            DELIMITER => {
                escaped.push('\\');
                escaped.push(DELIMITER);
            }
            '\n' => escaped.push_str(r"\n"),
            '\r' => escaped.push_str(r"\r"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Split a staged row into fields, undoing escapes.
///
/// A field whose raw text equals `null_marker` decodes as `None`.
///
/// # Examples
/// ```
/// use hydrograph_data::staging::row::split_row;
///
/// let fields = split_row(r"100|Pont\|Neuf|river|", '|', "");
/// assert_eq!(
///     fields,
///     vec![Some("100".into()), Some("Pont|Neuf".into()), Some("river".into()), None]
/// );
/// ```
#[must_use]
pub fn split_row(line: &str, delimiter: char, null_marker: &str) -> Vec<Option<String>> {
    let mut fields = Vec::new();
    let mut raw_start = 0;
    let mut value = String::new();
    let mut chars = line.char_indices();

    while let Some((index, ch)) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, escaped)) => value.push(escaped),
                None => value.push('\\'),
            }
        } else if ch == delimiter {
            let raw = line.get(raw_start..index).unwrap_or_default();
            fields.push(decode(raw, std::mem::take(&mut value), null_marker));
            raw_start = index + ch.len_utf8();
        } else {
            value.push(ch);
        }
    }
    let raw = line.get(raw_start..).unwrap_or_default();
    fields.push(decode(raw, value, null_marker));
    fields
}

/// Identifier in the first field of a staged row, if it parses.
#[must_use]
pub fn leading_id(line: &str) -> Option<OsmId> {
    let head = line.split(DELIMITER).next()?;
    head.trim().parse().ok()
}

fn decode(raw: &str, value: String, null_marker: &str) -> Option<String> {
    (raw != null_marker).then_some(value)
}
