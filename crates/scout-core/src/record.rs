//! Typed record model produced for each discovered patent.
//!
//! One [`PatentRecord`] is assembled per item. Text panes that report an
//! error are stored as empty strings; tabular panes that report an error are
//! stored as `None`.

use crate::error::ScoutError;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Visible label text of a result-list entry, used as its dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Create a fingerprint from an entry's label text.
    ///
    /// # Errors
    /// Returns error if the label is blank.
    pub fn new(label: impl Into<String>) -> Result<Self, ScoutError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ScoutError::Validation(
                "result entry has no label text".to_string(),
            ));
        }
        Ok(Self(label))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Labels span several lines; the first one is the publication summary.
        write!(f, "{}", self.0.lines().next().unwrap_or_default())
    }
}

/// Absolute URL of an item's detail view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetailAddress(String);

impl DetailAddress {
    /// Wrap an absolute URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DetailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered column names of a tabular pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet(Vec<String>);

impl FieldSet {
    /// Create a field set.
    ///
    /// # Errors
    /// Returns error if there are no columns.
    pub fn new(fields: Vec<String>) -> Result<Self, ScoutError> {
        if fields.is_empty() {
            return Err(ScoutError::Validation(
                "a field set needs at least one column".to_string(),
            ));
        }
        Ok(Self(fields))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed field set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column names in declared order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

/// One row of a tabular pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// 1-based position in the table
    pub index: usize,
    /// `(field, text)` pairs in field-set order
    pub values: Vec<(String, String)>,
}

impl TableRow {
    /// Text of the given column.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, text)| text.as_str())
    }
}

impl Serialize for TableRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, text) in &self.values {
            map.serialize_entry(field, text)?;
        }
        map.end()
    }
}

/// A tabular pane chunked into rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Rows in source order, indexed from 1; serialized as a map keyed by index
    #[serde(serialize_with = "rows_by_index")]
    pub rows: Vec<TableRow>,
    /// Trailing cells that did not fill a complete row
    #[serde(skip_serializing_if = "is_zero")]
    pub dropped_cells: usize,
}

fn rows_by_index<S: Serializer>(rows: &[TableRow], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(rows.iter().map(|row| (row.index, row)))
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Table {
    /// Number of complete rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the pane had no complete row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row by 1-based index.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&TableRow> {
        index.checked_sub(1).and_then(|i| self.rows.get(i))
    }
}

/// Classification block of the bibliographic data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classifications {
    /// International patent classification
    pub ipc: String,
    /// Cooperative patent classification
    pub cpc: String,
    /// Priority numbers
    pub priorities: String,
    /// Application number
    pub application: String,
    /// Publication number(s)
    pub publication: String,
    /// Also published as
    pub published_as: String,
}

/// Bibliographic block of a patent record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bibliographic {
    /// Applicants
    pub applicants: String,
    /// Inventors
    pub inventors: String,
    /// Abstract text
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Classification numbers
    pub classifications: Classifications,
}

/// Claims block. `tree` is only read when `original` has content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Claims {
    /// Claims as published
    pub original: String,
    /// Claims tree view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<String>,
}

impl Claims {
    /// Build a claims block, dropping `tree` when `original` is empty.
    #[must_use]
    pub fn new(original: String, tree: Option<String>) -> Self {
        let tree = if original.is_empty() { None } else { tree };
        Self { original, tree }
    }
}

/// Fully assembled output for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatentRecord {
    /// Publication number
    pub number: String,
    /// Title
    pub title: String,
    /// Bibliographic data
    pub bibliographic: Bibliographic,
    /// Description text
    pub description: String,
    /// Claims
    pub claims: Claims,
    /// Cited documents, `None` if the pane reported an error
    pub citations: Option<Table>,
    /// Legal events, `None` if the pane reported an error
    pub legal_events: Option<Table>,
    /// Simple patent family, `None` if the pane reported an error
    pub family: Option<Table>,
    /// Detail view the record was read from
    pub source_url: DetailAddress,
    /// When extraction finished
    pub extracted_at: DateTime<Utc>,
}
