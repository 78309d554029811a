use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::domain::catalog::{DownloadLocator, HarvestResult};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("`{locator}` names no file to store it under")]
    NoFileName { locator: String },

    #[error("`{locator}` answered {status}")]
    Status { locator: String, status: StatusCode },

    #[error("request for bundle failed")]
    Request(#[from] reqwest::Error),

    #[error("failed to store {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait BundleTransfer: Send + Sync {
    /// Copies the bundle behind `locator` into storage and returns where it landed.
    async fn transfer(&self, locator: &DownloadLocator) -> Result<PathBuf, TransferError>;
}

/// Outcome of moving every harvested bundle, one entry per locator.
#[derive(Debug, Default)]
pub struct TransferReport {
    pub stored: Vec<(DownloadLocator, PathBuf)>,
    pub failed: Vec<(DownloadLocator, TransferError)>,
}

impl TransferReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Transfers the locators in row order. A failed locator is recorded and the
/// rest still go through.
pub async fn transfer_all<T: BundleTransfer + ?Sized>(
    transfer: &T,
    result: &HarvestResult,
) -> TransferReport {
    let mut report = TransferReport::default();

    for locator in result.locators() {
        match transfer.transfer(locator).await {
            Ok(path) => {
                log::info!("Stored {}", path.display());
                report.stored.push((locator.clone(), path));
            }
            Err(e) => {
                log::error!("Failed to transfer {}: {}", locator, e);
                report.failed.push((locator.clone(), e));
            }
        }
    }

    report
}

/// Streams bundles over HTTP into `directory/prefix/<file name>`.
pub struct HttpBundleTransfer {
    client: Client,
    directory: PathBuf,
    prefix: String,
}

impl HttpBundleTransfer {
    pub fn new(directory: impl Into<PathBuf>, prefix: &str) -> Self {
        Self::with_client(Client::new(), directory, prefix)
    }

    pub fn with_client(client: Client, directory: impl Into<PathBuf>, prefix: &str) -> Self {
        HttpBundleTransfer {
            client,
            directory: directory.into(),
            prefix: prefix.to_string(),
        }
    }

    fn target_dir(&self) -> PathBuf {
        if self.prefix.is_empty() {
            self.directory.clone()
        } else {
            self.directory.join(&self.prefix)
        }
    }
}

#[async_trait]
impl BundleTransfer for HttpBundleTransfer {
    async fn transfer(&self, locator: &DownloadLocator) -> Result<PathBuf, TransferError> {
        let file_name = locator
            .file_name()
            .ok_or_else(|| TransferError::NoFileName {
                locator: locator.to_string(),
            })?;

        let mut response = self.client.get(locator.as_str()).send().await?;
        if !response.status().is_success() {
            return Err(TransferError::Status {
                locator: locator.to_string(),
                status: response.status(),
            });
        }

        let dir = self.target_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&dir, e))?;

        let target = dir.join(&file_name);
        let staging = dir.join(format!(".{}.{}.part", file_name, Uuid::new_v4()));

        let mut progress = Progress::new(&file_name, response.content_length());
        let copied = async {
            let mut file = tokio::fs::File::create(&staging)
                .await
                .map_err(|e| io_error(&staging, e))?;
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| io_error(&staging, e))?;
                progress.advance(chunk.len() as u64);
            }
            file.flush().await.map_err(|e| io_error(&staging, e))?;
            Ok::<_, TransferError>(())
        }
        .await;

        if let Err(e) = copied {
            _ = tokio::fs::remove_file(&staging).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            _ = tokio::fs::remove_file(&staging).await;
            return Err(io_error(&target, e));
        }

        progress.finish();
        Ok(target)
    }
}

/// Logs a line every tenth of the advertised length, or only the final
/// count when the server sends no Content-Length.
struct Progress<'a> {
    name: &'a str,
    total: Option<u64>,
    received: u64,
    last_decile: u64,
}

impl<'a> Progress<'a> {
    fn new(name: &'a str, total: Option<u64>) -> Self {
        match total {
            Some(total) => log::info!("Transferring {} ({} bytes)", name, total),
            None => log::info!("Transferring {} (size unknown)", name),
        }
        Progress {
            name,
            total,
            received: 0,
            last_decile: 0,
        }
    }

    fn advance(&mut self, bytes: u64) {
        self.received += bytes;
        if let Some(decile) = self.decile() {
            if decile > self.last_decile {
                self.last_decile = decile;
                log::info!(
                    "{}: {}% ({}/{} bytes)",
                    self.name,
                    decile * 10,
                    self.received,
                    self.total.unwrap_or_default()
                );
            }
        }
    }

    fn decile(&self) -> Option<u64> {
        match self.total {
            Some(0) | None => None,
            Some(total) => Some((self.received.min(total) * 10) / total),
        }
    }

    fn finish(&self) {
        log::info!("{}: done, {} bytes", self.name, self.received);
    }
}

fn io_error(path: &Path, source: std::io::Error) -> TransferError {
    TransferError::Io {
        path: path.to_path_buf(),
        source,
    }
}
