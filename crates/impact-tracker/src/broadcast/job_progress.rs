//! Job progress broadcaster for real-time ingestion status streaming.
//!
//! Polling the jobs table is the contractual way to observe progress; this
//! channel is a push-based supplement for embedders that stream updates
//! (SSE, websockets) without polling loops.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::db::job_repo::JobStatus;

/// Snapshot of a job's progress counters at one persisted step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressEvent {
    /// Unique job identifier.
    pub job_id: String,
    /// Overall job status.
    pub status: JobStatus,
    /// Total data rows in the file (0 until counted).
    pub total_rows: i64,
    /// Rows processed so far.
    pub processed_rows: i64,
    /// Rows upserted successfully.
    pub successful_rows: i64,
    /// Rows rejected or failed on write.
    pub failed_rows: i64,
    /// File-level error message (set on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Timestamp of this event.
    pub timestamp: DateTime<Utc>,
}

impl JobProgressEvent {
    /// Creates an event with zeroed counters for the given status.
    pub fn new(job_id: &str, status: JobStatus) -> Self {
        Self {
            job_id: job_id.to_string(),
            status,
            total_rows: 0,
            processed_rows: 0,
            successful_rows: 0,
            failed_rows: 0,
            error: None,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcasts job progress events for streaming.
#[derive(Clone)]
pub struct JobProgressBroadcaster {
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl JobProgressBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends a progress event to all subscribers.
    pub fn send(&self, event: JobProgressEvent) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(event);
    }

    /// Creates a new subscriber for progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.sender.subscribe()
    }

    /// Gets the inner sender for handing to worker pools.
    pub fn sender(&self) -> Arc<broadcast::Sender<JobProgressEvent>> {
        Arc::clone(&self.sender)
    }
}

impl Default for JobProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcaster_creation() {
        let broadcaster = JobProgressBroadcaster::new(10);
        let _rx = broadcaster.subscribe();
    }

    #[test]
    fn test_send_receive() {
        let broadcaster = JobProgressBroadcaster::new(10);
        let mut rx = broadcaster.subscribe();

        let mut event = JobProgressEvent::new("job-1", JobStatus::Processing);
        event.total_rows = 4;
        event.processed_rows = 2;
        event.successful_rows = 1;
        event.failed_rows = 1;
        broadcaster.send(event);

        let received = rx.try_recv().unwrap();
        assert_eq!(received.job_id, "job-1");
        assert_eq!(received.status, JobStatus::Processing);
        assert_eq!(received.processed_rows, 2);
        assert_eq!(received.successful_rows + received.failed_rows, 2);
    }

    #[test]
    fn test_send_without_receivers_is_fine() {
        let broadcaster = JobProgressBroadcaster::new(10);
        broadcaster.send(JobProgressEvent::new("job-1", JobStatus::Completed));
    }
}
