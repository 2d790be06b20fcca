//! Data handling for the dashboard: row filtering, filter-option
//! derivation, column profiling and ingestion

pub mod config;
pub mod dates;
pub mod filter;
pub mod ingest;
pub mod options;
pub mod schema;
pub mod sources;

use dash_core::StateError;
use tokio::task::JoinError;
use thiserror::Error;

// Re-exports
pub use filter::{apply_filters, filter_source};
pub use ingest::{parse_upload_response, ApiResponse, UploadGate, UploadPayload, UploadTicket};
pub use options::{category_options, CategoryOptionDeriver, CategoryOptions};
pub use schema::{ColumnKind, ColumnProfile, ColumnProfiler};
pub use sources::CsvSource;

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data source: {0}")]
    State(#[from] StateError),

    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("Join error: {0}")]
    Join(#[from] JoinError),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}
