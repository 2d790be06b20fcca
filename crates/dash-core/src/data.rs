//! Tabular data model shared by every dashboard component

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::StateError;

/// A single scalar cell.
///
/// Serialized untagged so a preview row reads as plain JSON
/// (`{"Region": "US", "Sales": 10, "Note": null}`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell; text is parsed leniently (surrounding
    /// whitespace ignored).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Bool(_) | CellValue::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// String coercion used by search, category matching and option derivation.
/// Null renders as the empty string. Numbers use the shortest round-trip
/// form, switching to exponent notation (`1e+21`, `1.5e-7`) outside
/// `1e-6..1e21`.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write_number(f, *n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n == 0.0 {
        return f.write_str("0");
    }
    if n.is_infinite() {
        return f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }

    let magnitude = n.abs();
    if magnitude.is_nan() || (1e-6..1e21).contains(&magnitude) {
        return write!(f, "{}", n);
    }

    let exponent = format!("{:e}", n);
    match exponent.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => write!(f, "{}e+{}", mantissa, exp),
        _ => f.write_str(&exponent),
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// One record: column name to cell, in column order.
pub type Row = IndexMap<String, CellValue>;

/// String form of `row[column]`; a missing cell coerces like null.
pub fn cell_text(row: &Row, column: &str) -> String {
    row.get(column).map(|v| v.to_string()).unwrap_or_default()
}

/// An ingested tabular dataset.
///
/// `rows` is a preview subset bounded at ingestion time, `row_count` is the
/// size of the full dataset. Instances are immutable; a refresh replaces the
/// whole source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDataSource")]
pub struct DataSource {
    id: String,
    name: String,
    row_count: usize,
    columns: Vec<String>,
    rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_column: Option<String>,
}

/// Persisted shape of a [`DataSource`]; converted through the constructors
/// so a reloaded snapshot gets the same column checks as a fresh one.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataSource {
    id: String,
    name: String,
    row_count: usize,
    columns: Vec<String>,
    rows: Vec<Row>,
    #[serde(default)]
    date_column: Option<String>,
}

impl TryFrom<RawDataSource> for DataSource {
    type Error = StateError;

    fn try_from(raw: RawDataSource) -> Result<Self, Self::Error> {
        let source = DataSource::new(raw.id, raw.name, raw.columns, raw.rows)?
            .with_row_count(raw.row_count);
        match raw.date_column {
            Some(column) => source.with_date_column(column),
            None => Ok(source),
        }
    }
}

impl DataSource {
    /// Create a data source, rejecting duplicate column names.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Row>,
    ) -> Result<Self, StateError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(StateError::DuplicateColumn(column.clone()));
            }
        }

        Ok(Self {
            id: id.into(),
            name: name.into(),
            row_count: rows.len(),
            columns,
            rows,
            date_column: None,
        })
    }

    /// Record the size of the full dataset when `rows` is only a preview.
    pub fn with_row_count(mut self, row_count: usize) -> Self {
        self.row_count = row_count;
        self
    }

    /// Designate the column used by the date-range filter.
    pub fn with_date_column(mut self, column: impl Into<String>) -> Result<Self, StateError> {
        let column = column.into();
        if !self.has_column(&column) {
            return Err(StateError::UnknownColumn(column));
        }
        self.date_column = Some(column);
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn date_column(&self) -> Option<&str> {
        self.date_column.as_deref()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}
