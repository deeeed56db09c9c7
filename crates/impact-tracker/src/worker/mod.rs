//! Background execution of ingestion jobs.

pub mod pool;

pub use pool::{IngestTask, WorkerPool};
