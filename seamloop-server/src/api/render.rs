//! Render API Handler

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use seamloop_core::dto::render::{
    HEADER_DURATION, HEADER_FADE, HEADER_JOB_ID, HEADER_LOOPS, RenderRequest,
};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::render_service::{self, Rendered};

/// POST /render
/// Render a seamless loop and return it as bytes or as a descriptor
pub async fn render(
    State(state): State<AppState>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> ApiResult<Rendered> {
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let rendered = render_service::render(&state.pipeline, &state.store, &state.config, request)
        .await
        .map_err(|e| ApiError::pipeline(e, state.pipeline.config().diagnostic_tail_bytes))?;

    Ok(rendered)
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        match self {
            Rendered::Binary {
                job_id,
                bytes,
                schedule,
            } => {
                let headers = [
                    (header::CONTENT_TYPE, "video/mp4".to_string()),
                    (HeaderName::from_static(HEADER_JOB_ID), job_id.to_string()),
                    (
                        HeaderName::from_static(HEADER_DURATION),
                        format!("{:.3}", schedule.total_duration()),
                    ),
                    (
                        HeaderName::from_static(HEADER_LOOPS),
                        schedule.loops().to_string(),
                    ),
                    (
                        HeaderName::from_static(HEADER_FADE),
                        format!("{:.3}", schedule.fade_seconds()),
                    ),
                ];

                let mut response = (StatusCode::OK, bytes).into_response();
                for (name, value) in headers {
                    // Every value above is ASCII
                    if let Ok(value) = HeaderValue::from_str(&value) {
                        response.headers_mut().insert(name, value);
                    }
                }
                response
            }
            Rendered::Descriptor(descriptor) => (StatusCode::OK, Json(descriptor)).into_response(),
        }
    }
}
