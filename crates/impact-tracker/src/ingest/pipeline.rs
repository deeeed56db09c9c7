use std::collections::BTreeMap;

use chrono::Utc;
use csv::ReaderBuilder;
use tracing::{debug, info_span, warn};

use crate::db::job_repo::{self, ErrorDetail, JobRow, JobStatus};
use crate::db::{report_repo, Database};

use super::error::IngestError;
use super::progress::{ProgressEvent, ProgressReporter};
use super::row;

/// Column names every uploaded file must carry. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "ngo_id",
    "month",
    "people_helped",
    "events_conducted",
    "funds_utilized",
];

/// Background pipeline for one bulk CSV upload.
///
/// Owns nothing but a database handle; a worker can keep one instance and
/// feed it job after job. The job record is persisted after every row, so
/// a concurrent poller always observes a consistent snapshot of progress.
pub struct IngestPipeline {
    db: Database,
}

impl IngestPipeline {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Runs ingestion for one uploaded file.
    ///
    /// Never surfaces an error to the caller: every outcome, including an
    /// unexpected abort, lands on the job record for pollers to read.
    pub fn run(&self, job_id: &str, file_content: &str, progress: &dyn ProgressReporter) {
        let _span = info_span!("ingest", job_id = %job_id).entered();

        if let Err(e) = self.run_inner(job_id, file_content, progress) {
            warn!("Ingestion for job {} aborted: {}", job_id, e);
            self.mark_failed_best_effort(job_id, format!("Unexpected error: {}", e), progress);
        }
    }

    fn run_inner(
        &self,
        job_id: &str,
        file_content: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<(), IngestError> {
        let Some(mut job) = job_repo::find_by_id(&self.db, job_id)? else {
            // Job was deleted between accept and dispatch; nothing to report.
            debug!("Job {} no longer exists, skipping", job_id);
            return Ok(());
        };

        job.status = JobStatus::Processing;
        job_repo::update(&self.db, &mut job)?;
        progress.report(ProgressEvent::Started);

        if file_content.trim().is_empty() {
            return self.fail_job(
                &mut job,
                "Empty CSV file or no headers found".to_string(),
                progress,
            );
        }

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(file_content.as_bytes());
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h.as_str() == **col))
            .copied()
            .collect();
        if !missing.is_empty() {
            return self.fail_job(
                &mut job,
                format!("Missing required columns: {}", missing.join(", ")),
                progress,
            );
        }

        let records = reader
            .records()
            .collect::<Result<Vec<_>, csv::Error>>()?;
        job.total_rows = records.len() as i64;
        job_repo::update(&self.db, &mut job)?;

        if records.is_empty() {
            return self.complete_job(&mut job, progress);
        }

        // Counters rebuild from zero so a redelivered job overwrites its
        // previous run instead of double-counting.
        job.processed_rows = 0;
        job.successful_rows = 0;
        job.failed_rows = 0;
        job.error_details = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            let row_number = idx as u64 + 1;
            // Short rows leave columns absent; fields beyond the header
            // are dropped.
            let raw: BTreeMap<String, String> = headers
                .iter()
                .cloned()
                .zip(record.iter().map(|field| field.to_string()))
                .collect();

            let outcome = match row::validate_row(&raw) {
                Ok(validated) => report_repo::upsert(&self.db, &validated)
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match outcome {
                Ok(()) => job.successful_rows += 1,
                Err(message) => {
                    job.failed_rows += 1;
                    job.error_details
                        .push(ErrorDetail::row_failure(row_number, raw, message));
                }
            }

            // Persisting after every row keeps progress observable mid-run.
            job.processed_rows = row_number as i64;
            job_repo::update(&self.db, &mut job)?;
            progress.report(ProgressEvent::Row {
                total: job.total_rows,
                processed: job.processed_rows,
                successful: job.successful_rows,
                failed: job.failed_rows,
            });
        }

        self.complete_job(&mut job, progress)
    }

    /// Terminates the job as completed. Row failures are data errors, not
    /// job failures: a fully failed batch still completes.
    fn complete_job(
        &self,
        job: &mut JobRow,
        progress: &dyn ProgressReporter,
    ) -> Result<(), IngestError> {
        job.status = JobStatus::Completed;
        job.completed_at = Some(Utc::now().to_rfc3339());
        job_repo::update(&self.db, job)?;
        progress.report(ProgressEvent::Completed {
            total: job.total_rows,
            successful: job.successful_rows,
            failed: job.failed_rows,
        });
        Ok(())
    }

    /// Terminates the job as failed with a file-level error.
    fn fail_job(
        &self,
        job: &mut JobRow,
        error: String,
        progress: &dyn ProgressReporter,
    ) -> Result<(), IngestError> {
        job.status = JobStatus::Failed;
        job.error_details = vec![ErrorDetail::file_failure(error.clone())];
        job_repo::update(&self.db, job)?;
        progress.report(ProgressEvent::Failed { error });
        Ok(())
    }

    /// Last-resort failure marking after an unexpected abort. Storage
    /// errors here are logged and swallowed; there is nobody left to
    /// propagate them to.
    fn mark_failed_best_effort(
        &self,
        job_id: &str,
        error: String,
        progress: &dyn ProgressReporter,
    ) {
        match job_repo::find_by_id(&self.db, job_id) {
            Ok(Some(mut job)) => {
                job.status = JobStatus::Failed;
                job.error_details = vec![ErrorDetail::file_failure(error.clone())];
                if let Err(e) = job_repo::update(&self.db, &mut job) {
                    warn!("Failed to mark job {} as failed: {}", job_id, e);
                }
                progress.report(ProgressEvent::Failed { error });
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to load job {} for failure marking: {}", job_id, e),
        }
    }
}
