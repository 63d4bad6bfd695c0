//! API Error Handling
//!
//! Maps pipeline failures to HTTP statuses and the `{error, details}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use seamloop_core::dto::error::ErrorBody;
use seamloop_engine::PipelineError;
use seamloop_engine::error::DETAILS_LIMIT;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Pipeline {
        error: PipelineError,
        /// Bytes of detail exposed in the body
        details_limit: usize,
    },
}

impl ApiError {
    /// Wraps a pipeline failure, exposing at most `details_limit` bytes of detail
    pub fn pipeline(error: PipelineError, details_limit: usize) -> Self {
        match error {
            PipelineError::Validation(msg) => ApiError::Validation(msg),
            error => ApiError::Pipeline {
                error,
                details_limit,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline { error, .. } => pipeline_status(error),
        }
    }
}

fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::EncodeTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        err if err.is_client_fault() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Validation(msg) => ErrorBody::new("validation_error", msg),
            ApiError::Pipeline {
                error,
                details_limit,
            } => {
                if status.is_server_error() {
                    tracing::error!(
                        retryable = error.is_retryable(),
                        "Render failed ({}): {}",
                        error.code(),
                        error
                    );
                } else {
                    tracing::debug!("Render rejected ({}): {}", error.code(), error);
                }
                ErrorBody::new(error.code(), error.details(details_limit))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::pipeline(err, DETAILS_LIMIT)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
