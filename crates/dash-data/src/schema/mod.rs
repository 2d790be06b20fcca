use dash_core::{CellValue, DataSource, Row};
use std::collections::HashSet;

use crate::dates::parse_datetime;

/// Column profiler for analyzing sampled rows and classifying columns
pub struct ColumnProfiler {
    sample_size: usize,
}

/// Detected kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Boolean,
    Integer,
    Float,
    Date,
    Text,
    /// Every sampled cell was null
    Empty,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

/// Statistics about a column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub null_count: usize,
    pub distinct_count: usize,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl ColumnProfiler {
    /// Create a new column profiler
    pub fn new() -> Self {
        Self {
            sample_size: 1000,
        }
    }

    /// Set the sample size for detection
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    /// Profile every column of a data source
    pub fn profile(&self, source: &DataSource) -> Vec<ColumnProfile> {
        self.profile_rows(source.columns(), source.rows())
    }

    /// Profile `columns` over the first sampled `rows`
    pub fn profile_rows(&self, columns: &[String], rows: &[Row]) -> Vec<ColumnProfile> {
        let sample = &rows[..rows.len().min(self.sample_size)];
        columns
            .iter()
            .map(|column| self.analyze_column(column, sample))
            .collect()
    }

    /// First column whose sampled values all parse as dates
    pub fn suggest_date_column(profiles: &[ColumnProfile]) -> Option<String> {
        profiles
            .iter()
            .find(|p| p.kind == ColumnKind::Date)
            .map(|p| p.name.clone())
    }

    /// Columns suitable for numeric range filters
    pub fn numeric_columns(profiles: &[ColumnProfile]) -> Vec<String> {
        profiles
            .iter()
            .filter(|p| p.kind.is_numeric())
            .map(|p| p.name.clone())
            .collect()
    }

    /// Analyze a single column
    fn analyze_column(&self, column: &str, sample: &[Row]) -> ColumnProfile {
        let mut null_count = 0;
        let mut distinct = HashSet::new();
        let mut is_bool = true;
        let mut is_int = true;
        let mut is_float = true;
        let mut is_date = true;
        let mut min_value: Option<f64> = None;
        let mut max_value: Option<f64> = None;

        for row in sample {
            let cell = row.get(column).unwrap_or(&CellValue::Null);
            if cell.is_null() {
                null_count += 1;
                continue;
            }
            distinct.insert(cell.to_string());

            // Type checks
            let number = cell.as_f64().filter(|n| n.is_finite());
            if is_bool && !looks_like_bool(cell) {
                is_bool = false;
            }
            if is_float && number.is_none() {
                is_float = false;
            }
            if is_int && !number.map_or(false, |n| n.fract() == 0.0) {
                is_int = false;
            }
            if is_date && !looks_like_date(cell) {
                is_date = false;
            }

            if let Some(n) = number {
                min_value = Some(min_value.map_or(n, |m| m.min(n)));
                max_value = Some(max_value.map_or(n, |m| m.max(n)));
            }
        }

        // Determine kind
        let kind = if distinct.is_empty() {
            ColumnKind::Empty
        } else if is_bool {
            ColumnKind::Boolean
        } else if is_int {
            ColumnKind::Integer
        } else if is_float {
            ColumnKind::Float
        } else if is_date {
            ColumnKind::Date
        } else {
            ColumnKind::Text
        };

        let numeric = kind.is_numeric();
        ColumnProfile {
            name: column.to_string(),
            kind,
            null_count,
            distinct_count: distinct.len(),
            min_value: min_value.filter(|_| numeric),
            max_value: max_value.filter(|_| numeric),
        }
    }
}

impl Default for ColumnProfiler {
    fn default() -> Self {
        Self::new()
    }
}

fn looks_like_bool(cell: &CellValue) -> bool {
    match cell {
        CellValue::Bool(_) => true,
        CellValue::Text(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "false"),
        _ => false,
    }
}

/// Text that parses as a date. Bare numbers are not treated as dates here
/// even though the date filter accepts them as epoch milliseconds.
fn looks_like_date(cell: &CellValue) -> bool {
    match cell {
        CellValue::Text(s) => s.trim().parse::<f64>().is_err() && parse_datetime(s).is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[(&str, CellValue)]]) -> Vec<Row> {
        data.iter()
            .map(|r| r.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
            .collect()
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_kinds_detected() {
        let sample = rows(&[
            &[
                ("id", CellValue::from(1i64)),
                ("price", CellValue::from(2.5)),
                ("active", CellValue::from("true")),
                ("when", CellValue::from("2024-01-01")),
                ("name", CellValue::from("a")),
                ("blank", CellValue::Null),
            ],
            &[
                ("id", CellValue::from("2")),
                ("price", CellValue::from(3i64)),
                ("active", CellValue::Bool(false)),
                ("when", CellValue::from("2024-01-02 10:00:00")),
                ("name", CellValue::from("b")),
                ("blank", CellValue::Null),
            ],
        ]);
        let cols = columns(&["id", "price", "active", "when", "name", "blank", "absent"]);
        let profiles = ColumnProfiler::new().profile_rows(&cols, &sample);
        let kinds: Vec<_> = profiles.iter().map(|p| p.kind).collect();

        assert_eq!(
            kinds,
            vec![
                ColumnKind::Integer,
                ColumnKind::Float,
                ColumnKind::Boolean,
                ColumnKind::Date,
                ColumnKind::Text,
                ColumnKind::Empty,
                ColumnKind::Empty,
            ]
        );
        assert_eq!(profiles[1].min_value, Some(2.5));
        assert_eq!(profiles[1].max_value, Some(3.0));
        assert_eq!(profiles[5].null_count, 2);
    }

    #[test]
    fn test_suggestions() {
        let sample = rows(&[&[
            ("Region", CellValue::from("US")),
            ("Sales", CellValue::from(10i64)),
            ("Sale_Date", CellValue::from("2024-01-01")),
        ]]);
        let profiles =
            ColumnProfiler::new().profile_rows(&columns(&["Region", "Sales", "Sale_Date"]), &sample);

        assert_eq!(
            ColumnProfiler::suggest_date_column(&profiles).as_deref(),
            Some("Sale_Date")
        );
        assert_eq!(ColumnProfiler::numeric_columns(&profiles), vec!["Sales"]);
    }

    #[test]
    fn test_mixed_column_is_text() {
        let sample = rows(&[
            &[("mixed", CellValue::from(1i64))],
            &[("mixed", CellValue::from("2024-01-01"))],
        ]);
        let profiles = ColumnProfiler::new().profile_rows(&columns(&["mixed"]), &sample);
        assert_eq!(profiles[0].kind, ColumnKind::Text);
        assert_eq!(profiles[0].min_value, None);
    }
}
