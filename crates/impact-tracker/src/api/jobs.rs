//! Job status polling.

use serde::Serialize;
use uuid::Uuid;

use crate::db::job_repo::{self, ErrorDetail, JobRow, JobStatus};
use crate::db::Database;

use super::ApiError;

/// Full job snapshot for `GET /job-status/{job_id}`.
#[derive(Debug, Serialize)]
pub struct JobStatusView {
    pub id: String,
    pub status: JobStatus,
    pub total_rows: i64,
    pub processed_rows: i64,
    pub successful_rows: i64,
    pub failed_rows: i64,
    pub progress_percentage: f64,
    pub error_details: Vec<ErrorDetail>,
    pub file_name: String,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl From<JobRow> for JobStatusView {
    fn from(job: JobRow) -> Self {
        Self {
            progress_percentage: job.progress_percentage(),
            id: job.id,
            status: job.status,
            total_rows: job.total_rows,
            processed_rows: job.processed_rows,
            successful_rows: job.successful_rows,
            failed_rows: job.failed_rows,
            error_details: job.error_details,
            file_name: job.file_name,
            created_at: job.created_at,
            updated_at: job.updated_at,
            completed_at: job.completed_at,
        }
    }
}

/// Looks up one job. The id must be a well-formed UUID before the store
/// is consulted; a syntactically bad id is the caller's error, not a miss.
pub fn get_job_status(db: &Database, job_id: &str) -> Result<JobStatusView, ApiError> {
    Uuid::parse_str(job_id).map_err(|_| ApiError::InvalidJobId)?;

    match job_repo::find_by_id(db, job_id)? {
        Some(job) => Ok(job.into()),
        None => Err(ApiError::JobNotFound),
    }
}
