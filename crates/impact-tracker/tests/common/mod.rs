//! Test harness for isolated end-to-end runs.
//!
//! `TestService` wires the pieces an embedding server would: an in-memory
//! database, a worker pool, and a progress broadcaster. Outcomes are
//! observed the way real callers observe them, by polling job status.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use impact_tracker::api::jobs::{get_job_status, JobStatusView};
use impact_tracker::api::upload::{upload_reports, UploadAccepted, DEFAULT_MAX_UPLOAD_BYTES};
use impact_tracker::{Database, JobProgressBroadcaster, WorkerPool};

pub struct TestService {
    pub db: Database,
    pub pool: WorkerPool,
    pub broadcaster: JobProgressBroadcaster,
}

impl TestService {
    pub fn start() -> Self {
        let db = Database::open_in_memory().expect("open in-memory DB");
        let broadcaster = JobProgressBroadcaster::new(1024);
        let pool =
            WorkerPool::with_progress_sender(db.clone(), 2, Some(broadcaster.sender()));
        Self {
            db,
            pool,
            broadcaster,
        }
    }

    /// Uploads CSV content and returns the accepted job handle.
    pub fn upload(&self, file_name: &str, content: &str) -> UploadAccepted {
        upload_reports(
            &self.db,
            &self.pool,
            file_name,
            content.as_bytes(),
            DEFAULT_MAX_UPLOAD_BYTES,
        )
        .expect("upload accepted")
    }

    /// Polls job status until the job reaches a terminal state.
    pub fn wait_for_job(&self, job_id: &str) -> JobStatusView {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let view = get_job_status(&self.db, job_id).expect("job exists");
            if view.status.is_terminal() {
                return view;
            }
            assert!(
                Instant::now() < deadline,
                "job {} did not finish in time",
                job_id
            );
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    pub fn finish(self) {
        self.pool.shutdown();
        self.pool.wait();
    }
}

/// A well-formed CSV with the standard header and the given data lines.
pub fn csv_with_rows(rows: &[&str]) -> String {
    let mut out =
        String::from("ngo_id,month,people_helped,events_conducted,funds_utilized\n");
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}
