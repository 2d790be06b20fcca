//! Shared filter context
//!
//! One [`FilterStore`] exists per dashboard. Every surface that narrows the
//! visible rows (search box, date pickers, category multi-selects, range
//! sliders) writes through it; consumers read a [`FilterState`] snapshot and
//! hand it to the row filter.

use std::sync::Arc;

use chrono::NaiveDateTime;
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::events::{events::FiltersChanged, EventBus};
use crate::StateError;

/// Inclusive date-time window; a missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, value: NaiveDateTime) -> bool {
        self.start.map_or(true, |start| value >= start) && self.end.map_or(true, |end| value <= end)
    }

    fn validate(&self) -> Result<(), StateError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => {
                Err(StateError::InvalidDateRange { start, end })
            }
            _ => Ok(()),
        }
    }
}

/// Inclusive numeric window for one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// The combined filters applied to rows before charting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Free-text search, stored verbatim
    pub search: String,

    pub date_range: DateRange,

    /// Allowed values per column. Never holds an empty set.
    pub categories: IndexMap<String, IndexSet<String>>,

    pub numeric_ranges: IndexMap<String, NumericRange>,
}

impl FilterState {
    /// True when applying this state keeps every row
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none()
            && self.date_range.is_unbounded()
            && self.categories.values().all(|s| s.is_empty())
            && self.numeric_ranges.is_empty()
    }

    /// Trimmed, lowercased search term, if any
    pub fn search_term(&self) -> Option<String> {
        let trimmed = self.search.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }

    /// Category selections that actually restrict rows
    pub fn active_categories(&self) -> impl Iterator<Item = (&String, &IndexSet<String>)> {
        self.categories.iter().filter(|(_, values)| !values.is_empty())
    }
}

/// Shared, clonable handle over the dashboard's filter state
#[derive(Clone, Default)]
pub struct FilterStore {
    state: Arc<RwLock<FilterState>>,

    /// Columns of the bound data source, when one is bound
    columns: Arc<RwLock<Option<Vec<String>>>>,

    event_bus: Option<Arc<EventBus>>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `FiltersChanged` on the given bus after every mutation
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Copy of the current filter state
    pub fn snapshot(&self) -> FilterState {
        self.state.read().clone()
    }

    /// Replace the search term. Trimming happens when filters are applied.
    pub fn set_search(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|state| state.search = text);
    }

    /// Replace the whole date range
    pub fn set_date_range(&self, range: DateRange) -> Result<(), StateError> {
        range.validate()?;
        self.update(|state| state.date_range = range);
        Ok(())
    }

    /// Replace the selected values for `column`. An empty selection removes
    /// the column's restriction entirely.
    pub fn set_category<I, S>(&self, column: &str, values: I) -> Result<(), StateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check_column(column)?;
        let values: IndexSet<String> = values.into_iter().map(Into::into).collect();

        self.update(|state| {
            if values.is_empty() {
                state.categories.shift_remove(column);
            } else {
                state.categories.insert(column.to_string(), values);
            }
        });
        Ok(())
    }

    /// Replace the numeric range for `column`
    pub fn set_numeric_range(&self, column: &str, min: f64, max: f64) -> Result<(), StateError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(StateError::InvalidNumericRange {
                column: column.to_string(),
                min,
                max,
            });
        }
        self.check_column(column)?;

        self.update(|state| {
            state
                .numeric_ranges
                .insert(column.to_string(), NumericRange::new(min, max));
        });
        Ok(())
    }

    /// Remove the numeric range for `column`
    pub fn clear_numeric_range(&self, column: &str) {
        self.update(|state| {
            state.numeric_ranges.shift_remove(column);
        });
    }

    /// Reset every filter to its default in one update
    pub fn clear_filters(&self) {
        self.update(|state| *state = FilterState::default());
    }

    /// Bind to a data source's columns. Selections on columns that are not
    /// part of the new list are dropped.
    pub fn bind_columns(&self, columns: &[String]) {
        *self.columns.write() = Some(columns.to_vec());

        let stale = {
            let state = self.state.read();
            state
                .categories
                .keys()
                .chain(state.numeric_ranges.keys())
                .any(|c| !columns.contains(c))
        };

        if stale {
            self.update(|state| {
                state.categories.retain(|c, _| columns.contains(c));
                state.numeric_ranges.retain(|c, _| columns.contains(c));
            });
            tracing::debug!("Pruned filters on columns missing from the bound source");
        }
    }

    /// Stop validating column names
    pub fn unbind_columns(&self) {
        *self.columns.write() = None;
    }

    fn check_column(&self, column: &str) -> Result<(), StateError> {
        match self.columns.read().as_ref() {
            Some(columns) if !columns.iter().any(|c| c == column) => {
                tracing::warn!("Rejected filter on unknown column '{}'", column);
                Err(StateError::UnknownColumn(column.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn update(&self, f: impl FnOnce(&mut FilterState)) {
        let snapshot = {
            let mut state = self.state.write();
            f(&mut state);
            state.clone()
        };

        if let Some(bus) = &self.event_bus {
            bus.publish(FiltersChanged { filters: snapshot });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use parking_lot::Mutex;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_search_stored_verbatim() {
        let store = FilterStore::new();
        store.set_search("  Widget ");
        assert_eq!(store.snapshot().search, "  Widget ");
        assert_eq!(store.snapshot().search_term().as_deref(), Some("widget"));
    }

    #[test]
    fn test_empty_category_selection_removes_key() {
        let store = FilterStore::new();
        store.set_category("Region", ["US", "EU"]).unwrap();
        assert_eq!(store.snapshot().categories["Region"].len(), 2);

        store.set_category("Region", Vec::<String>::new()).unwrap();
        assert!(!store.snapshot().categories.contains_key("Region"));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let store = FilterStore::new();
        let err = store
            .set_date_range(DateRange::new(Some(at(2024, 3, 1)), Some(at(2024, 1, 1))))
            .unwrap_err();
        assert!(matches!(err, StateError::InvalidDateRange { .. }));
        assert!(store.snapshot().date_range.is_unbounded());

        store
            .set_date_range(DateRange::new(Some(at(2024, 1, 1)), None))
            .unwrap();
        assert!(store.snapshot().date_range.contains(at(2030, 1, 1)));
    }

    #[test]
    fn test_numeric_range_validation() {
        let store = FilterStore::new();
        assert!(store.set_numeric_range("Sales", 10.0, 1.0).is_err());
        assert!(store.set_numeric_range("Sales", f64::NAN, 1.0).is_err());
        store.set_numeric_range("Sales", 1.0, 1.0).unwrap();
        assert_eq!(
            store.snapshot().numeric_ranges["Sales"],
            NumericRange::new(1.0, 1.0)
        );
    }

    #[test]
    fn test_bound_columns_are_enforced_and_pruned() {
        let store = FilterStore::new();
        store.set_category("Region", ["US"]).unwrap();
        store.set_numeric_range("Legacy", 0.0, 5.0).unwrap();

        store.bind_columns(&["Region".to_string(), "Sales".to_string()]);
        let state = store.snapshot();
        assert!(state.categories.contains_key("Region"));
        assert!(!state.numeric_ranges.contains_key("Legacy"));

        assert_eq!(
            store.set_category("Country", ["FR"]).unwrap_err(),
            StateError::UnknownColumn("Country".into())
        );

        store.unbind_columns();
        assert!(store.set_category("Country", ["FR"]).is_ok());
    }

    #[test]
    fn test_clear_filters_resets_everything() {
        let store = FilterStore::new();
        store.set_search("x");
        store.set_category("Region", ["US"]).unwrap();
        store.set_numeric_range("Sales", 0.0, 1.0).unwrap();
        store
            .set_date_range(DateRange::new(None, Some(at(2024, 1, 1))))
            .unwrap();

        store.clear_filters();
        assert_eq!(store.snapshot(), FilterState::default());
    }

    #[test]
    fn test_clones_share_state_and_publish() {
        let bus = Arc::new(EventBus::new());
        let count = Arc::new(Mutex::new(0usize));
        let sink = count.clone();
        bus.on::<FiltersChanged, _>(move |_| *sink.lock() += 1);

        let store = FilterStore::new().with_event_bus(bus);
        let other = store.clone();
        other.set_search("abc");
        store.clear_filters();

        assert_eq!(store.snapshot().search, "");
        assert_eq!(*count.lock(), 2);
    }
}
