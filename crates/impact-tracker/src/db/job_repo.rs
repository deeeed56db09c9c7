//! Job repository — progress/status tracking for bulk ingestion runs.

use chrono::Utc;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Database, DatabaseError};

/// Lifecycle status of an ingestion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    fn parse(s: &str, job_id: &str) -> Self {
        match s {
            "pending" => JobStatus::Pending,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            other => {
                log::warn!(
                    "Unknown job status '{}' for job {}, defaulting to Pending",
                    other,
                    job_id
                );
                JobStatus::Pending
            }
        }
    }

    /// Returns true for completed or failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One recorded ingestion error.
///
/// Row-level entries carry the 1-based data row number and the raw
/// header-to-value map; file-level entries (no header, missing columns,
/// unexpected abort) carry the message alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
    pub error: String,
}

impl ErrorDetail {
    pub fn row_failure(row: u64, data: BTreeMap<String, String>, error: String) -> Self {
        Self {
            row: Some(row),
            data: Some(data),
            error,
        }
    }

    pub fn file_failure(error: String) -> Self {
        Self {
            row: None,
            data: None,
            error,
        }
    }
}

/// A job row from the database.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub status: JobStatus,
    pub total_rows: i64,
    pub processed_rows: i64,
    pub successful_rows: i64,
    pub failed_rows: i64,
    pub error_details: Vec<ErrorDetail>,
    pub file_name: String,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl JobRow {
    /// Creates a fresh pending job for an accepted upload.
    pub fn pending(file_name: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: JobStatus::Pending,
            total_rows: 0,
            processed_rows: 0,
            successful_rows: 0,
            failed_rows: 0,
            error_details: Vec::new(),
            file_name: file_name.to_string(),
            created_at: now.clone(),
            updated_at: now,
            completed_at: None,
        }
    }

    /// Processing progress as a percentage, rounded to 2 decimals.
    /// Defined as 0 when no rows were counted yet.
    pub fn progress_percentage(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        let ratio = self.processed_rows as f64 / self.total_rows as f64;
        (ratio * 100.0 * 100.0).round() / 100.0
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let id: String = row.get("id")?;
        let status_str: String = row.get("status")?;
        let error_details_json: String = row.get("error_details")?;
        // Lenient parse: malformed sidecar JSON degrades to an empty list
        // rather than poisoning the whole row.
        let error_details = serde_json::from_str(&error_details_json).unwrap_or_default();
        Ok(Self {
            status: JobStatus::parse(&status_str, &id),
            id,
            total_rows: row.get("total_rows")?,
            processed_rows: row.get("processed_rows")?,
            successful_rows: row.get("successful_rows")?,
            failed_rows: row.get("failed_rows")?,
            error_details,
            file_name: row.get("file_name")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            completed_at: row.get("completed_at")?,
        })
    }

    fn error_details_json(&self) -> String {
        serde_json::to_string(&self.error_details).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Query filter parameters for job listing.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (id, status, total_rows, processed_rows, successful_rows,
             failed_rows, error_details, file_name, created_at, updated_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                job.id,
                job.status.as_str(),
                job.total_rows,
                job.processed_rows,
                job.successful_rows,
                job.failed_rows,
                job.error_details_json(),
                job.file_name,
                job.created_at,
                job.updated_at,
                job.completed_at,
            ],
        )?;
        Ok(())
    })
}

/// Updates an existing job row. All fields except `id` and `created_at`
/// are overwritten; `updated_at` is stamped here so every persisted
/// progress step carries a fresh timestamp.
pub fn update(db: &Database, job: &mut JobRow) -> Result<(), DatabaseError> {
    job.updated_at = Utc::now().to_rfc3339();
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE jobs SET status=?2, total_rows=?3, processed_rows=?4,
             successful_rows=?5, failed_rows=?6, error_details=?7, file_name=?8,
             updated_at=?9, completed_at=?10
             WHERE id=?1",
            params![
                job.id,
                job.status.as_str(),
                job.total_rows,
                job.processed_rows,
                job.successful_rows,
                job.failed_rows,
                job.error_details_json(),
                job.file_name,
                job.updated_at,
                job.completed_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Queries jobs newest-first with an optional status filter,
/// returning (rows, total_count).
pub fn query(db: &Database, filter: &JobFilter) -> Result<(Vec<JobRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.as_str().to_string()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM jobs {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM jobs {} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<JobRow> = stmt
            .query_map(params_ref.as_slice(), JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &Database, status: JobStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
