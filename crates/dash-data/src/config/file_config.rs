//! Per-file CSV loading configuration

use std::collections::HashSet;
use std::path::PathBuf;

use dash_core::CellValue;
use serde::{Deserialize, Serialize};

use super::null_handling::NullConfig;

/// Rows kept in a data source's preview
pub const DEFAULT_PREVIEW_LIMIT: usize = 500;

/// Rows profiled when guessing the date column
pub const DEFAULT_PROFILE_SAMPLE: usize = 1000;

/// Configuration for loading one CSV file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Path to the file
    pub path: PathBuf,

    /// Header line number (0-indexed)
    pub header_line: usize,

    /// Field delimiter
    pub delimiter: u8,

    /// Null handling configuration
    pub null_config: NullConfig,

    /// Rows kept as the preview; the total row count is always exact
    pub preview_limit: usize,

    /// Rows sampled by the profiler
    pub sample_size: usize,

    /// Date column override; guessed from the data when unset
    pub date_column: Option<String>,

    /// Stable id, so re-reading the same file replaces the old source
    pub source_id: Option<String>,

    /// Columns kept as text even when their cells look numeric
    pub text_columns: HashSet<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            header_line: 0,
            delimiter: b',',
            null_config: NullConfig::default(),
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            sample_size: DEFAULT_PROFILE_SAMPLE,
            date_column: None,
            source_id: None,
            text_columns: HashSet::new(),
        }
    }
}

impl FileConfig {
    /// Create a new file configuration
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = Some(column.into());
        self
    }

    pub fn with_null_config(mut self, null_config: NullConfig) -> Self {
        self.null_config = null_config;
        self
    }

    pub fn with_source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    /// Get the file name
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Convert a raw CSV field into a cell
    pub fn infer_cell(&self, column: &str, raw: &str) -> CellValue {
        if self.null_config.is_null(raw) {
            return CellValue::Null;
        }
        if self.text_columns.contains(column) {
            return CellValue::Text(raw.to_string());
        }

        let trimmed = raw.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return CellValue::Number(n as f64);
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
        match trimmed.to_lowercase().as_str() {
            "true" => CellValue::Bool(true),
            "false" => CellValue::Bool(false),
            _ => CellValue::Text(raw.to_string()),
        }
    }
}
