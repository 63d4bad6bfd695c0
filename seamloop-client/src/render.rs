//! Render endpoints

use crate::SeamloopClient;
use crate::error::{ClientError, Result};
use reqwest::header::HeaderMap;
use seamloop_core::dto::render::{
    HEADER_DURATION, HEADER_FADE, HEADER_JOB_ID, HEADER_LOOPS, RenderDescriptor, RenderRequest,
};
use uuid::Uuid;

/// A render returned as bytes
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVideo {
    pub job_id: Option<Uuid>,
    pub duration_seconds: Option<f64>,
    pub loops: Option<u32>,
    pub fade_seconds: Option<f64>,
    pub bytes: Vec<u8>,
}

impl RenderedVideo {
    fn from_parts(headers: &HeaderMap, bytes: Vec<u8>) -> Self {
        fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
        }

        Self {
            job_id: header(headers, HEADER_JOB_ID),
            duration_seconds: header(headers, HEADER_DURATION),
            loops: header(headers, HEADER_LOOPS),
            fade_seconds: header(headers, HEADER_FADE),
            bytes,
        }
    }
}

impl SeamloopClient {
    /// Render a loop and receive the encoded bytes
    pub async fn render_bytes(&self, mut request: RenderRequest) -> Result<RenderedVideo> {
        request.return_url = false;

        let url = format!("{}/render", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let response = self.check_status(response).await?;

        let headers = response.headers().clone();
        let bytes = response.bytes().await?.to_vec();
        tracing::debug!("Received {} bytes from {}", bytes.len(), url);

        Ok(RenderedVideo::from_parts(&headers, bytes))
    }

    /// Render a loop and receive a descriptor of the published copy
    pub async fn render_descriptor(&self, mut request: RenderRequest) -> Result<RenderDescriptor> {
        request.return_url = true;

        let url = format!("{}/render", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;

        self.handle_response(response).await
    }

    /// Download a published render
    pub async fn download(&self, descriptor: &RenderDescriptor) -> Result<Vec<u8>> {
        let response = self.client.get(&descriptor.url).send().await?;
        let response = self.check_status(response).await?;

        let bytes = response.bytes().await?;
        if bytes.len() as u64 != descriptor.bytes {
            return Err(ClientError::ParseError(format!(
                "expected {} bytes, received {}",
                descriptor.bytes,
                bytes.len()
            )));
        }

        Ok(bytes.to_vec())
    }
}
