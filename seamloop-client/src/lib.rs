//! Seamloop HTTP Client
//!
//! A typed HTTP client for the Seamloop render service.
//!
//! # Example
//!
//! ```no_run
//! use seamloop_client::SeamloopClient;
//! use seamloop_core::dto::render::RenderRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SeamloopClient::new("http://localhost:8080");
//!
//!     let video = client
//!         .render_bytes(RenderRequest::new("https://cdn.example.com/clip.mp4"))
//!         .await?;
//!
//!     std::fs::write("loop.mp4", &video.bytes)?;
//!     Ok(())
//! }
//! ```

pub mod error;
mod render;

pub use error::{ClientError, Result};
pub use render::RenderedVideo;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Seamloop render service
#[derive(Debug, Clone)]
pub struct SeamloopClient {
    /// Base URL of the service (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl SeamloopClient {
    /// Create a new client
    ///
    /// Renders can take minutes, so the default client has no request
    /// timeout; use [`SeamloopClient::with_client`] to set one.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the service is up
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.check_status(response).await.map(|_| ())
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Returns the response if it succeeded, or the parsed error body
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::from_response(status.as_u16(), &error_text));
        }

        Ok(response)
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        self.check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
