//! Bulk CSV upload acceptance.

use serde::Serialize;
use tracing::warn;

use crate::db::job_repo::{self, ErrorDetail, JobRow, JobStatus};
use crate::db::Database;
use crate::worker::{IngestTask, WorkerPool};

use super::ApiError;

/// Default upload cap: 10 MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Response for an accepted upload: poll `job_id` for the outcome.
#[derive(Debug, Serialize)]
pub struct UploadAccepted {
    pub job_id: String,
    pub message: String,
}

impl UploadAccepted {
    pub fn status_code(&self) -> u16 {
        202
    }
}

/// Accepts a CSV upload: validates the file itself (never its rows),
/// persists a pending job, and hands the content to the worker pool.
///
/// The caller gets its job id back immediately; row-level outcomes are
/// only ever visible through polling.
pub fn upload_reports(
    db: &Database,
    pool: &WorkerPool,
    file_name: &str,
    bytes: &[u8],
    max_upload_bytes: u64,
) -> Result<UploadAccepted, ApiError> {
    if !file_name.ends_with(".csv") {
        return Err(ApiError::InvalidUpload(
            "Only CSV files are allowed".to_string(),
        ));
    }
    if bytes.len() as u64 > max_upload_bytes {
        return Err(ApiError::InvalidUpload(format!(
            "File size cannot exceed {}MB",
            max_upload_bytes / (1024 * 1024)
        )));
    }
    let file_content = std::str::from_utf8(bytes).map_err(|_| ApiError::InvalidEncoding)?;

    let job = JobRow::pending(file_name);
    job_repo::insert(db, &job)?;

    let task = IngestTask {
        job_id: job.id.clone(),
        file_content: file_content.to_string(),
    };
    if let Err(e) = pool.submit(task) {
        // The accepted job must not sit pending forever if dispatch is
        // impossible; mark it failed before reporting the refusal.
        let mut failed = job;
        failed.status = JobStatus::Failed;
        failed.error_details = vec![ErrorDetail::file_failure(format!(
            "Unexpected error: {}",
            e
        ))];
        if let Err(update_err) = job_repo::update(db, &mut failed) {
            warn!(
                "Failed to mark undispatched job {} as failed: {}",
                failed.id, update_err
            );
        }
        return Err(ApiError::Dispatch(e));
    }

    Ok(UploadAccepted {
        job_id: job.id,
        message: "File uploaded successfully. Processing started.".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::job_repo::JobStatus;
    use std::time::{Duration, Instant};

    fn setup() -> (Database, WorkerPool) {
        let db = Database::open_in_memory().unwrap();
        let pool = WorkerPool::new(db.clone(), 2);
        (db, pool)
    }

    fn wait_for_terminal(db: &Database, job_id: &str) -> JobRow {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let job = job_repo::find_by_id(db, job_id).unwrap().unwrap();
            if job.status.is_terminal() {
                return job;
            }
            assert!(Instant::now() < deadline, "job {} never finished", job_id);
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_accepts_csv_and_creates_pending_job() {
        let (db, pool) = setup();
        let accepted = upload_reports(
            &db,
            &pool,
            "reports.csv",
            b"ngo_id,month,people_helped,events_conducted,funds_utilized\n\
              NGO_001,2024-01,100,5,1000.00\n",
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .unwrap();

        assert_eq!(accepted.status_code(), 202);
        assert_eq!(accepted.message, "File uploaded successfully. Processing started.");

        let done = wait_for_terminal(&db, &accepted.job_id);
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.file_name, "reports.csv");

        pool.shutdown();
        pool.wait();
    }

    #[test]
    fn test_rejects_non_csv_extension() {
        let (db, pool) = setup();
        let err = upload_reports(&db, &pool, "reports.xlsx", b"x", DEFAULT_MAX_UPLOAD_BYTES)
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("Only CSV files are allowed"));

        pool.shutdown();
        pool.wait();
    }

    #[test]
    fn test_rejects_oversized_file() {
        let (db, pool) = setup();
        let err = upload_reports(&db, &pool, "big.csv", &[b'a'; 32], 16).unwrap_err();
        assert_eq!(err.status_code(), 400);

        // No job was left behind for a rejected upload.
        let (_, total) = job_repo::query(&db, &Default::default()).unwrap();
        assert_eq!(total, 0);

        pool.shutdown();
        pool.wait();
    }

    #[test]
    fn test_rejects_non_utf8_bytes() {
        let (db, pool) = setup();
        let err = upload_reports(
            &db,
            &pool,
            "latin1.csv",
            &[0xFF, 0xFE, 0x41],
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("UTF-8"));

        pool.shutdown();
        pool.wait();
    }

    #[test]
    fn test_dispatch_failure_marks_job_failed() {
        let (db, pool) = setup();
        pool.shutdown();

        let err = upload_reports(
            &db,
            &pool,
            "reports.csv",
            b"ngo_id,month,people_helped,events_conducted,funds_utilized\n",
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 500);

        let (rows, total) = job_repo::query(&db, &Default::default()).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].status, JobStatus::Failed);
        assert!(rows[0].error_details[0].error.starts_with("Unexpected error:"));

        pool.wait();
    }
}
