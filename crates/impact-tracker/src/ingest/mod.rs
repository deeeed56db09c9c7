//! Bulk CSV ingestion: row validation and the background pipeline.

pub mod error;
pub mod pipeline;
pub mod progress;
pub mod row;

pub use error::IngestError;
pub use pipeline::{IngestPipeline, REQUIRED_COLUMNS};
pub use progress::{BroadcastProgress, NoopProgress, ProgressEvent, ProgressReporter};
pub use row::{validate_row, RowError};
