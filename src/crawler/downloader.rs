//! PDF download over HTTP.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, error, info};

pub const USER_AGENT: &str = "paperdigest/0.1 (research paper reader)";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
enum DownloadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches PDFs and writes them to disk.
#[derive(Clone)]
pub struct PdfDownloader {
    client: Client,
}

impl PdfDownloader {
    /// Create a downloader whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }

    /// Download `url` to `dest`.
    ///
    /// Returns true only when the whole body was written. Failures are
    /// logged, never raised.
    pub async fn download(&self, url: &str, dest: &Path) -> bool {
        match self.fetch_to(url, dest).await {
            Ok(bytes) => {
                info!(
                    "PDF downloaded successfully as '{}' ({} bytes)",
                    dest.display(),
                    bytes
                );
                true
            }
            Err(e) => {
                error!("Failed to download PDF for '{}'. Error: {}", dest.display(), e);
                false
            }
        }
    }

    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<usize, DownloadError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status));
        }

        let content = response.bytes().await?;
        if let Err(e) = tokio::fs::write(dest, &content).await {
            let _ = tokio::fs::remove_file(dest).await;
            return Err(e.into());
        }
        Ok(content.len())
    }
}
