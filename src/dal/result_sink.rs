use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::catalog::HarvestResult;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to serialize harvest result")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persists the locators, in order, under `destination`.
    async fn write(&self, result: &HarvestResult, destination: &str) -> Result<PathBuf, SinkError>;
}

/// Writes a pretty-printed JSON array of locator strings into `directory`.
pub struct JsonFileSink {
    directory: PathBuf,
}

impl JsonFileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        JsonFileSink {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn write(&self, result: &HarvestResult, destination: &str) -> Result<PathBuf, SinkError> {
        let body = serde_json::to_string_pretty(&result.locators())?;
        let target = self.directory.join(destination);

        // Written beside the target first so a failed write never leaves a
        // truncated file under the real name.
        let staging = self
            .directory
            .join(format!(".{}.{}.tmp", destination, Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&staging, body).await {
            return Err(io_error(&staging, e));
        }
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            _ = tokio::fs::remove_file(&staging).await;
            return Err(io_error(&target, e));
        }

        log::info!(
            "Wrote {} locators to {}",
            result.len(),
            target.display()
        );
        Ok(target)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SinkError {
    SinkError::Io {
        path: path.to_path_buf(),
        source,
    }
}
