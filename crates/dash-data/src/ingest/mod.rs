//! Upload responses from the dashboard API
//!
//! Every endpoint answers with the same `{success, data, error}` envelope.
//! A successful upload carries an [`UploadPayload`], which becomes a
//! [`DataSource`]. Uploads are serialized by an [`UploadGate`].

use std::sync::atomic::{AtomicBool, Ordering};

use dash_core::{DataSource, Row};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::schema::ColumnProfiler;
use crate::DataError;

/// Response envelope shared by the API endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// The payload of a successful response
    pub fn into_result(self) -> Result<T, DataError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(DataError::UploadRejected(
                "response has no data".to_string(),
            )),
            (false, _) => Err(DataError::UploadRejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

/// Data returned by the upload endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadPayload {
    pub id: String,
    pub name: String,
    /// Size of the full dataset
    pub rows: usize,
    pub columns: Vec<String>,
    /// Bounded subset of the rows
    #[serde(default)]
    pub preview: Vec<Row>,
}

impl UploadPayload {
    pub fn into_data_source(self) -> Result<DataSource, DataError> {
        let profiles = ColumnProfiler::new().profile_rows(&self.columns, &self.preview);
        let date_column = ColumnProfiler::suggest_date_column(&profiles);

        let mut source = DataSource::new(self.id, self.name, self.columns, self.preview)?
            .with_row_count(self.rows);
        if let Some(column) = date_column {
            source = source.with_date_column(column)?;
        }
        Ok(source)
    }
}

/// Decode an upload endpoint response body into a data source
pub fn parse_upload_response(body: &str) -> Result<DataSource, DataError> {
    let response: ApiResponse<UploadPayload> = serde_json::from_str(body)?;
    match response.into_result() {
        Ok(payload) => {
            let source = payload.into_data_source()?;
            info!("Upload accepted: {} ({} rows)", source.name(), source.row_count());
            Ok(source)
        }
        Err(e) => {
            warn!("Upload failed: {}", e);
            Err(e)
        }
    }
}

/// Allows one upload at a time
#[derive(Debug, Default)]
pub struct UploadGate {
    uploading: AtomicBool,
}

/// Held while an upload runs; releases the gate on drop
#[derive(Debug)]
pub struct UploadTicket<'a> {
    gate: &'a UploadGate,
}

impl UploadGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::Acquire)
    }

    /// Start an upload, failing if one is already running
    pub fn try_begin(&self) -> Result<UploadTicket<'_>, DataError> {
        self.uploading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DataError::UploadInProgress)?;
        Ok(UploadTicket { gate: self })
    }
}

impl Drop for UploadTicket<'_> {
    fn drop(&mut self) {
        self.gate.uploading.store(false, Ordering::Release);
    }
}
