//! Category option derivation
//!
//! Decides which columns get a multi-select filter. A column qualifies when
//! the number of distinct values in a sampled prefix of rows is strictly
//! between 1 and 30: a single value filters nothing, and 30 or more is
//! better served by free-text search.
//!
//! Only the first `sample_size` rows are inspected, so values that appear
//! later in the preview are not offered.

use dash_core::data::cell_text;
use dash_core::{DataSource, Row};
use indexmap::{IndexMap, IndexSet};

/// Rows inspected per column
pub const DEFAULT_SAMPLE_ROWS: usize = 200;

/// Exclusive upper bound on distinct values for a category column
pub const MAX_CATEGORY_VALUES: usize = 30;

/// Column name to its distinct values, in first-seen order
pub type CategoryOptions = IndexMap<String, Vec<String>>;

/// Derives [`CategoryOptions`] from a sampled prefix of rows
#[derive(Debug, Clone)]
pub struct CategoryOptionDeriver {
    sample_size: usize,
}

impl CategoryOptionDeriver {
    pub fn new() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_ROWS,
        }
    }

    /// Set the number of rows inspected per column
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    pub fn derive(&self, source: &DataSource) -> CategoryOptions {
        self.derive_rows(source.rows(), source.columns())
    }

    pub fn derive_rows(&self, rows: &[Row], columns: &[String]) -> CategoryOptions {
        let sample = &rows[..rows.len().min(self.sample_size)];

        columns
            .iter()
            .filter_map(|column| {
                let mut distinct = IndexSet::new();
                for row in sample {
                    distinct.insert(cell_text(row, column));
                    // Reaching the limit rules the column out
                    if distinct.len() >= MAX_CATEGORY_VALUES {
                        return None;
                    }
                }

                if distinct.len() > 1 {
                    Some((column.clone(), distinct.into_iter().collect::<Vec<_>>()))
                } else {
                    None
                }
            })
            .collect()
    }
}

impl Default for CategoryOptionDeriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Category options for a data source with the default sample size
pub fn category_options(source: &DataSource) -> CategoryOptions {
    CategoryOptionDeriver::new().derive(source)
}
