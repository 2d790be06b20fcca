//! Row filtering
//!
//! [`apply_filters`] narrows a row set by the shared [`FilterState`]. The
//! stages are independent predicates AND-ed together, so their order only
//! affects how much work later stages do:
//!
//! 1. search: any listed column contains the trimmed term, case-insensitively
//! 2. date range: the date column falls inside the inclusive window; a row
//!    whose date cell is missing or unparseable is excluded while a range is set
//! 3. categories: the cell's string form is one of the selected values
//! 4. numeric ranges: the cell is numeric and inside the inclusive window

use dash_core::data::cell_text;
use dash_core::{CellValue, DataSource, FilterState, Row};
use tracing::debug;

use crate::dates::cell_datetime;

/// Apply `filters` to `rows`, returning the rows that pass every stage.
///
/// `columns` are the columns searched by the free-text stage; `date_column`
/// is the column the date stage reads. When no date column is given the
/// date stage is skipped. The input is never modified.
pub fn apply_filters(
    rows: &[Row],
    filters: &FilterState,
    columns: &[String],
    date_column: Option<&str>,
) -> Vec<Row> {
    let mut filtered: Vec<&Row> = rows.iter().collect();

    if let Some(term) = filters.search_term() {
        filtered.retain(|row| matches_search(row, columns, &term));
        debug!("Search '{}' kept {} rows", term, filtered.len());
    }

    if !filters.date_range.is_unbounded() {
        match date_column {
            Some(column) => {
                let range = filters.date_range;
                filtered.retain(|row| {
                    row.get(column)
                        .and_then(cell_datetime)
                        .map_or(false, |dt| range.contains(dt))
                });
                debug!("Date range on '{}' kept {} rows", column, filtered.len());
            }
            None => debug!("Date range set but no date column configured, skipping"),
        }
    }

    for (column, allowed) in filters.active_categories() {
        filtered.retain(|row| allowed.contains(&cell_text(row, column)));
        debug!("Category '{}' kept {} rows", column, filtered.len());
    }

    for (column, range) in &filters.numeric_ranges {
        filtered.retain(|row| {
            row.get(column)
                .and_then(CellValue::as_f64)
                .map_or(false, |v| range.contains(v))
        });
        debug!("Range on '{}' kept {} rows", column, filtered.len());
    }

    filtered.into_iter().cloned().collect()
}

/// Filter a data source's preview rows using its own columns and date column
pub fn filter_source(source: &DataSource, filters: &FilterState) -> Vec<Row> {
    apply_filters(source.rows(), filters, source.columns(), source.date_column())
}

fn matches_search(row: &Row, columns: &[String], term: &str) -> bool {
    columns
        .iter()
        .any(|column| cell_text(row, column).to_lowercase().contains(term))
}
