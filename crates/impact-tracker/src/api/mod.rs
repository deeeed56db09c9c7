//! Boundary contracts for the five service endpoints.
//!
//! HTTP framing stays outside this crate: these handlers take plain typed
//! input, return serializable views, and expose the status code each
//! outcome maps to. An embedding server wires routes to them the way the
//! desktop shell registers command handlers in the upstream layout.
//!
//! Handlers are organized by domain:
//! - `reports`: single submission and the debug listing
//! - `upload`: bulk CSV upload acceptance
//! - `jobs`: job status polling
//! - `dashboard`: aggregate queries

pub mod dashboard;
pub mod jobs;
pub mod reports;
pub mod upload;

pub use dashboard::{get_dashboard, DashboardQuery, DashboardView};
pub use jobs::{get_job_status, JobStatusView};
pub use reports::{list_reports, submit_report, ReportListView, SubmitOutcome, SubmitReportRequest};
pub use upload::{upload_reports, UploadAccepted};

use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Error half of every handler. `status_code` gives the HTTP mapping so
/// the embedding layer never inspects variants.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body failed field validation; all offending fields listed.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// The uploaded file itself was rejected (extension, size).
    #[error("File validation failed: {0}")]
    InvalidUpload(String),

    /// The uploaded bytes were not valid UTF-8.
    #[error("Invalid file encoding. Please ensure the file is UTF-8 encoded.")]
    InvalidEncoding,

    /// A malformed query parameter set.
    #[error("{0}")]
    InvalidQuery(String),

    /// The job id is not a UUID.
    #[error("Invalid job ID format")]
    InvalidJobId,

    /// No job with the given id.
    #[error("Job not found")]
    JobNotFound,

    /// Storage failure underneath an otherwise valid request.
    #[error("Database error occurred")]
    Database(#[from] crate::db::DatabaseError),

    /// The worker pool refused the task (shutting down).
    #[error("Processing could not be started")]
    Dispatch(#[from] crate::error::WorkerError),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_)
            | ApiError::InvalidUpload(_)
            | ApiError::InvalidEncoding
            | ApiError::InvalidQuery(_)
            | ApiError::InvalidJobId => 400,
            ApiError::JobNotFound => 404,
            ApiError::Database(_) | ApiError::Dispatch(_) => 500,
        }
    }

    /// Field errors for a 400 body, when the variant carries them.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ApiError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

/// Response wrapper for API calls.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            errors: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            errors: None,
        }
    }

    pub fn err(error: &ApiError) -> Self {
        let errors = error.field_errors();
        Self {
            success: false,
            message: Some(error.to_string()),
            data: None,
            errors: if errors.is_empty() {
                None
            } else {
                Some(errors.to_vec())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Validation(vec![]).status_code(), 400);
        assert_eq!(ApiError::InvalidJobId.status_code(), 400);
        assert_eq!(ApiError::InvalidEncoding.status_code(), 400);
        assert_eq!(
            ApiError::InvalidUpload("Only CSV files are allowed".into()).status_code(),
            400
        );
        assert_eq!(ApiError::JobNotFound.status_code(), 404);
    }

    #[test]
    fn test_error_response_carries_field_errors() {
        let error = ApiError::Validation(vec![FieldError::new("month", "bad")]);
        let response: ApiResponse<()> = ApiResponse::err(&error);
        assert!(!response.success);
        assert_eq!(response.errors.as_ref().unwrap().len(), 1);
        assert_eq!(response.errors.unwrap()[0].field, "month");
    }

    #[test]
    fn test_ok_response_serializes_without_errors_key() {
        let response = ApiResponse::ok_with_message("done", 42);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(!json.contains("errors"));
    }
}
