//! Remote asset fetcher
//!
//! Downloads a URL to a local path under a timeout and a byte limit. The
//! destination path is chosen (and registered for cleanup) by the caller, so
//! a partial file left by a failed download is still removed.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Fetch failure
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },

    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("asset exceeds the {limit} byte download limit")]
    TooLarge { limit: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to write asset: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// True when the caller supplied a URL that could never be fetched
    pub fn is_malformed_url(&self) -> bool {
        matches!(self, Self::InvalidUrl { .. })
    }
}

/// Service trait for materializing a remote asset on local disk
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Downloads `url` into `dest`, returning the number of bytes written
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// [`ResourceFetcher`] over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests are bounded by `timeout` end to end
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self::with_client(client, max_bytes))
    }

    /// Creates a fetcher with a custom HTTP client
    pub fn with_client(client: Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }

    fn map_error(url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let parsed = parse_url(url)?;
        debug!("Fetching {} -> {}", parsed, dest.display());

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| Self::map_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await.map_err(|e| Self::map_error(url, e))? {
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        info!("Fetched {} ({} bytes)", url, written);
        Ok(written)
    }
}

/// Accepts only absolute http and https URLs
pub fn parse_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {:?}", other),
        }),
    }
}

/// File extension for a downloaded asset, taken from the URL path
pub fn extension_from_url(url: &str, fallback: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            let segment = parsed.path_segments()?.next_back()?.to_string();
            let (_, ext) = segment.rsplit_once('.')?;
            let valid = !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric());
            valid.then(|| ext.to_ascii_lowercase())
        })
        .unwrap_or_else(|| fallback.to_string())
}
