use thiserror::Error;

/// Errors that abort an ingestion run before its rows are exhausted.
///
/// These never reach the uploader: the pipeline's outer catch converts them
/// into a failed job record, since the caller already received its job id
/// and observes outcomes by polling.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Database(#[from] crate::db::DatabaseError),
}
