use std::sync::Arc;

use tokio::sync::broadcast;

use crate::broadcast::job_progress::JobProgressEvent;
use crate::db::job_repo::JobStatus;

/// Events emitted by the pipeline after each persisted step.
pub enum ProgressEvent {
    Started,
    Row {
        total: i64,
        processed: i64,
        successful: i64,
        failed: i64,
    },
    Completed {
        total: i64,
        successful: i64,
        failed: i64,
    },
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Bridges pipeline events onto the job progress broadcast channel.
pub struct BroadcastProgress {
    job_id: String,
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl BroadcastProgress {
    pub fn new(job_id: &str, sender: Arc<broadcast::Sender<JobProgressEvent>>) -> Self {
        Self {
            job_id: job_id.to_string(),
            sender,
        }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        let out = match event {
            ProgressEvent::Started => JobProgressEvent::new(&self.job_id, JobStatus::Processing),
            ProgressEvent::Row {
                total,
                processed,
                successful,
                failed,
            } => {
                let mut out = JobProgressEvent::new(&self.job_id, JobStatus::Processing);
                out.total_rows = total;
                out.processed_rows = processed;
                out.successful_rows = successful;
                out.failed_rows = failed;
                out
            }
            ProgressEvent::Completed {
                total,
                successful,
                failed,
            } => {
                let mut out = JobProgressEvent::new(&self.job_id, JobStatus::Completed);
                out.total_rows = total;
                out.processed_rows = total;
                out.successful_rows = successful;
                out.failed_rows = failed;
                out
            }
            ProgressEvent::Failed { error } => {
                let mut out = JobProgressEvent::new(&self.job_id, JobStatus::Failed);
                out.error = Some(error);
                out
            }
        };
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(out);
    }
}
