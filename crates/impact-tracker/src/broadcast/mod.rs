//! Broadcast channels for observing ingestion progress in real time.

pub mod job_progress;

pub use job_progress::{JobProgressBroadcaster, JobProgressEvent};
