pub mod api;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod month;
pub mod worker;

pub use broadcast::{JobProgressBroadcaster, JobProgressEvent};
pub use config::{load_config, ServiceConfig};
pub use db::Database;
pub use error::{ConfigError, ImpactError, Result, WorkerError};
pub use ingest::{IngestPipeline, RowError};
pub use worker::{IngestTask, WorkerPool};
