//! Health Check API Handler
//!
//! Liveness only; the media engine is not invoked.

use axum::{http::StatusCode, response::IntoResponse};

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
