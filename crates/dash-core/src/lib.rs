//! Core state for the dashboard
//!
//! This crate provides the data model, the shared filter context, the
//! visualization store and the plumbing (events, persistence, polling)
//! that the rest of the workspace builds on.

pub mod data;
pub mod events;
pub mod filters;
pub mod persist;
pub mod refresh;
pub mod state;
pub mod visualization;

use chrono::NaiveDateTime;
use thiserror::Error;

// Re-export commonly used types
pub use data::{CellValue, DataSource, Row};
pub use events::EventBus;
pub use filters::{DateRange, FilterState, FilterStore, NumericRange};
pub use persist::{FileStore, KeyValueStore, MemoryStore, PersistError};
pub use refresh::{Fetch, Poller, PollerHandle};
pub use state::DashboardState;
pub use visualization::{
    ChartType, Visualization, VisualizationConfig, VisualizationStore, VisualizationUpdate,
    PALETTE,
};

/// Errors raised by the dashboard stores
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown data source: {0}")]
    UnknownDataSource(String),

    #[error("Unknown visualization: {0}")]
    UnknownVisualization(String),

    #[error("Unknown chart type: {0}")]
    UnknownChartType(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Invalid numeric range for '{column}': {min}..{max}")]
    InvalidNumericRange {
        column: String,
        min: f64,
        max: f64,
    },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Refresh interval must be greater than zero")]
    InvalidInterval,
}
