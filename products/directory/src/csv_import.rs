//! Comma-delimited member lists to candidate records.
//!
//! The format is deliberately plain: the first line names the columns, every
//! other non-blank line holds values in the same positions, and there is no
//! quoting or escaping. `departmentId`, `locationId` and `managerId` are
//! coerced to integers (empty means null); every other column stays text.
//! Empty cells trailing past the last named column, as left by a final comma,
//! are ignored in the header and in rows. Line numbers count from the first
//! line of the input, blank lines included.

use std::fmt;

use serde::{Serialize, Serializer, ser::SerializeMap};
use tracing::debug;

use crate::{error::ParseError, model::RecordId};

/// Columns coerced to a nullable integer.
pub const ID_FIELDS: [&str; 3] = ["departmentId", "locationId", "managerId"];

/// What to do with a row whose value count differs from the header count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnMismatch {
    /// Missing trailing values become null; surplus values are dropped.
    #[default]
    PadWithNull,
    RejectRow,
}

/// What to do with non-numeric text in an id column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InvalidId {
    #[default]
    RejectRow,
    /// Keep the raw text and let the server refuse it.
    PassThrough,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub column_mismatch: ColumnMismatch,
    pub invalid_id: InvalidId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Id(RecordId),
    Null,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<RecordId> {
        match self {
            FieldValue::Id(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(value) => serializer.serialize_str(value),
            FieldValue::Id(value) => serializer.serialize_i64(*value),
            FieldValue::Null => serializer.serialize_none(),
        }
    }
}

/// A parsed but unvalidated row, keyed by header name in header order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateRecord {
    line: usize,
    fields: Vec<(String, FieldValue)>,
}

impl CandidateRecord {
    pub fn new(line: usize, fields: Vec<(String, FieldValue)>) -> Self {
        Self { line, fields }
    }

    /// 1-based line number in the source text.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for CandidateRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RowRejection {
    #[serde(rename_all = "camelCase")]
    ColumnCount { expected: usize, found: usize },
    #[serde(rename_all = "camelCase")]
    InvalidId { field: String, value: String },
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::ColumnCount { expected, found } => {
                write!(f, "expected {expected} values, found {found}")
            }
            RowRejection::InvalidId { field, value } => {
                write!(f, "`{value}` is not a valid {field}")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: RowRejection,
}

/// Result of parsing, before anything is sent anywhere.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedBatch {
    pub headers: Vec<String>,
    pub candidates: Vec<CandidateRecord>,
    pub rejected: Vec<RejectedRow>,
}

/// What an import reports back. `imported` counts rows parsed and submitted,
/// not rows the server ended up storing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub rejected: Vec<RejectedRow>,
}

pub fn parse_members(text: &str, options: &ImportOptions) -> Result<ParsedBatch, ParseError> {
    let mut lines = text
        .split('\n')
        .map(str::trim)
        .enumerate()
        .skip_while(|(_, line)| line.is_empty());
    let headers = match lines.next() {
        Some((_, header_line)) => parse_headers(header_line)?,
        None => return Err(ParseError::Empty),
    };

    let mut batch = ParsedBatch {
        headers,
        ..Default::default()
    };
    for (index, line) in lines {
        if line.is_empty() {
            continue;
        }
        match parse_row(index + 1, line, &batch.headers, options) {
            Ok(candidate) => batch.candidates.push(candidate),
            Err(rejected) => {
                debug!(line = rejected.line, reason = %rejected.reason, "csv row rejected");
                batch.rejected.push(rejected);
            }
        }
    }
    Ok(batch)
}

fn parse_headers(line: &str) -> Result<Vec<String>, ParseError> {
    let mut cells: Vec<&str> = line.split(',').map(str::trim).collect();
    while cells.len() > 1 && cells.last().is_some_and(|cell| cell.is_empty()) {
        cells.pop();
    }

    let mut headers: Vec<String> = Vec::new();
    for (column, name) in cells.into_iter().enumerate() {
        if name.is_empty() {
            return Err(ParseError::BlankHeader { column: column + 1 });
        }
        if headers.iter().any(|existing| existing == name) {
            return Err(ParseError::DuplicateHeader {
                name: name.to_string(),
            });
        }
        headers.push(name.to_string());
    }
    Ok(headers)
}

fn parse_row(
    line_no: usize,
    line: &str,
    headers: &[String],
    options: &ImportOptions,
) -> Result<CandidateRecord, RejectedRow> {
    let mut values: Vec<&str> = line.split(',').map(str::trim).collect();
    while values.len() > headers.len() && values.last().is_some_and(|value| value.is_empty()) {
        values.pop();
    }
    if values.len() != headers.len() {
        match options.column_mismatch {
            ColumnMismatch::RejectRow => {
                return Err(RejectedRow {
                    line: line_no,
                    reason: RowRejection::ColumnCount {
                        expected: headers.len(),
                        found: values.len(),
                    },
                });
            }
            ColumnMismatch::PadWithNull if values.len() > headers.len() => {
                debug!(
                    line = line_no,
                    dropped = values.len() - headers.len(),
                    "ignoring surplus csv values"
                );
            }
            ColumnMismatch::PadWithNull => {}
        }
    }

    let mut fields = Vec::with_capacity(headers.len());
    for (position, name) in headers.iter().enumerate() {
        let value = match values.get(position) {
            None => FieldValue::Null,
            Some(raw) if ID_FIELDS.contains(&name.as_str()) => {
                coerce_id(line_no, name, raw, options.invalid_id)?
            }
            Some(raw) => FieldValue::Text((*raw).to_string()),
        };
        fields.push((name.clone(), value));
    }
    Ok(CandidateRecord::new(line_no, fields))
}

fn coerce_id(
    line_no: usize,
    field: &str,
    raw: &str,
    policy: InvalidId,
) -> Result<FieldValue, RejectedRow> {
    if raw.is_empty() {
        return Ok(FieldValue::Null);
    }
    match raw.parse::<RecordId>() {
        Ok(id) => Ok(FieldValue::Id(id)),
        Err(_) => match policy {
            InvalidId::PassThrough => Ok(FieldValue::Text(raw.to_string())),
            InvalidId::RejectRow => Err(RejectedRow {
                line: line_no,
                reason: RowRejection::InvalidId {
                    field: field.to_string(),
                    value: raw.to_string(),
                },
            }),
        },
    }
}
