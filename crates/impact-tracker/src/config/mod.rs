//! Service configuration.
//!
//! A small JSON file with defaults for every field, so an empty `{}` is a
//! valid config. Loaded once at startup by the embedding binary.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::api::upload::DEFAULT_MAX_UPLOAD_BYTES;
use crate::error::ConfigError;

/// Runtime configuration for the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Where the SQLite database lives.
    pub database_path: PathBuf,
    /// Upload size cap in bytes.
    pub max_upload_bytes: u64,
    /// Ingest worker thread count.
    pub worker_count: usize,
    /// Capacity of the progress broadcast channel.
    pub progress_channel_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/impact-tracker.db"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            worker_count: num_cpus::get(),
            progress_channel_capacity: 100,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &ServiceConfig) -> Result<(), ConfigError> {
    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }
    if config.max_upload_bytes == 0 {
        return Err(ConfigError::Validation {
            message: "max_upload_bytes must be at least 1".to_string(),
        });
    }
    if config.progress_channel_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "progress_channel_capacity must be at least 1".to_string(),
        });
    }
    Ok(())
}
