//! Error types for the Seamloop client

use seamloop_core::dto::error::ErrorBody;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Seamloop client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The service answered with an error body
    #[error("{code} (status {status}): {details}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Stable error code, e.g. `encode_timeout`
        code: String,
        details: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Builds an API error from a failed response body
    ///
    /// Bodies that are not an [`ErrorBody`] keep their raw text as details.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(error) => Self::Api {
                status,
                code: error.error,
                details: error.details,
            },
            Err(_) => Self::Api {
                status,
                code: "unknown".to_string(),
                details: body.to_string(),
            },
        }
    }

    /// Error code reported by the service, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Check if the render exceeded the encode time limit
    ///
    /// Such jobs may succeed when retried with fewer loops or a smaller size.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Api { status, code, .. } => *status == 504 || code == "encode_timeout",
            Self::RequestFailed(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 500)
    }
}
