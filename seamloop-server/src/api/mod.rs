//! API Module
//!
//! HTTP API layer of the render service.

pub mod error;
pub mod health;
pub mod render;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use seamloop_engine::LoopPipeline;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::store::RenderStore;

/// Shared, read-only state of every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LoopPipeline>,
    pub store: Arc<RenderStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(pipeline: LoopPipeline, store: Arc<RenderStore>, config: ServerConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            store,
            config: Arc::new(config),
        }
    }
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let renders = ServeDir::new(state.store.dir());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/render", post(render::render))
        // Published renders
        .nest_service("/renders", renders)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use seamloop_core::domain::clip::ClipMetadata;
    use seamloop_core::dto::error::ErrorBody;
    use seamloop_core::dto::render::RenderDescriptor;
    use seamloop_engine::EngineConfig;
    use seamloop_engine::fetcher::{FetchError, ResourceFetcher};
    use seamloop_engine::media::{EncodeError, EncodeInvocation, MediaEngine};
    use seamloop_engine::prober::ProbeError;
    use std::path::Path;
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Clone, Copy)]
    enum Encode {
        Succeed,
        TimeOut,
        /// Non-zero exit with this many bytes of diagnostics
        Fail(usize),
    }

    struct FakeEngine {
        encode: Encode,
    }

    #[async_trait]
    impl MediaEngine for FakeEngine {
        async fn probe(&self, _path: &Path) -> Result<ClipMetadata, ProbeError> {
            ClipMetadata::from_duration(5.0).ok_or(ProbeError::NotPositive(5.0))
        }

        async fn encode(&self, invocation: &EncodeInvocation) -> Result<(), EncodeError> {
            std::fs::write(&invocation.output, b"encoded").unwrap();
            match self.encode {
                Encode::Succeed => Ok(()),
                Encode::TimeOut => Err(EncodeError::TimedOut {
                    after: Duration::from_secs(300),
                }),
                Encode::Fail(bytes) => Err(EncodeError::Failed {
                    exit_code: Some(1),
                    diagnostics: "e".repeat(bytes),
                }),
            }
        }
    }

    struct FakeFetcher;

    #[async_trait]
    impl ResourceFetcher for FakeFetcher {
        async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
            seamloop_engine::fetcher::parse_url(url)?;
            std::fs::write(dest, b"media")?;
            Ok(5)
        }
    }

    struct TestApp {
        router: Router,
        work: tempfile::TempDir,
        _renders: tempfile::TempDir,
    }

    fn app(encode: Encode) -> TestApp {
        app_with(encode, |_| {})
    }

    fn app_with(encode: Encode, configure: impl FnOnce(&mut EngineConfig)) -> TestApp {
        let work = tempfile::tempdir().unwrap();
        let renders = tempfile::tempdir().unwrap();

        let mut engine_config = EngineConfig::new(work.path().to_path_buf());
        configure(&mut engine_config);
        let pipeline = LoopPipeline::new(
            Arc::new(engine_config),
            Arc::new(FakeEngine { encode }),
            Arc::new(FakeFetcher),
        );
        let store = Arc::new(
            RenderStore::new(renders.path().to_path_buf(), Duration::from_secs(60)).unwrap(),
        );
        let mut config = ServerConfig::default();
        config.public_url = "https://renders.example.com".to_string();

        TestApp {
            router: create_router(AppState::new(pipeline, store, config)),
            work,
            _renders: renders,
        }
    }

    fn post_render(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/render")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn error_body(response: axum::response::Response) -> ErrorBody {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Encode::Succeed);
        let response = app
            .router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_render_binary() {
        let app = app(Encode::Succeed);
        let response = app
            .router
            .clone()
            .oneshot(post_render(serde_json::json!({
                "sourceUrl": "https://cdn.example.com/clip.mp4"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(headers["x-seamloop-loops"], "3");
        assert_eq!(headers["x-seamloop-fade"], "0.350");
        assert_eq!(headers["x-seamloop-duration"], "14.300");
        assert!(headers.contains_key("x-seamloop-job-id"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"encoded");
        assert_eq!(std::fs::read_dir(app.work.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_render_descriptor_then_download() {
        let app = app(Encode::Succeed);
        let response = app
            .router
            .clone()
            .oneshot(post_render(serde_json::json!({
                "sourceUrl": "https://cdn.example.com/clip.mp4",
                "loops": 20,
                "returnUrl": true
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let descriptor: RenderDescriptor = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(descriptor.loops, 10);
        assert_eq!(descriptor.format, "mp4");
        assert_eq!(descriptor.bytes, 7);
        assert_eq!(descriptor.duration_seconds, 46.85);
        assert!(
            descriptor
                .url
                .starts_with("https://renders.example.com/renders/")
        );
        assert_eq!(std::fs::read_dir(app.work.path()).unwrap().count(), 0);

        let path = format!("/renders/{}.mp4", descriptor.job_id);
        let download = app
            .router
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(download.status(), StatusCode::OK);
        let body = to_bytes(download.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"encoded");
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let app = app(Encode::Succeed);
        let request = Request::builder()
            .method("POST")
            .uri("/render")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.error, "validation_error");
    }

    #[tokio::test]
    async fn test_missing_source_url_is_validation_error() {
        let app = app(Encode::Succeed);
        let response = app
            .router
            .oneshot(post_render(serde_json::json!({ "loops": 4 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = error_body(response).await;
        assert_eq!(body.error, "validation_error");
        assert!(body.details.contains("sourceUrl"));
    }

    #[tokio::test]
    async fn test_random_music_without_library_is_rejected() {
        let app = app(Encode::Succeed);
        let response = app
            .router
            .oneshot(post_render(serde_json::json!({
                "sourceUrl": "https://cdn.example.com/clip.mp4",
                "randomMusic": true
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.error, "validation_error");
    }

    #[tokio::test]
    async fn test_malformed_source_url_is_bad_request() {
        let app = app(Encode::Succeed);
        let response = app
            .router
            .oneshot(post_render(serde_json::json!({ "sourceUrl": "clip.mp4" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.error, "fetch_failed");
    }

    #[tokio::test]
    async fn test_encode_timeout_is_gateway_timeout() {
        let app = app(Encode::TimeOut);
        let response = app
            .router
            .clone()
            .oneshot(post_render(serde_json::json!({
                "sourceUrl": "https://cdn.example.com/clip.mp4"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(error_body(response).await.error, "encode_timeout");
        assert_eq!(std::fs::read_dir(app.work.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_encode_failure_details_use_configured_tail() {
        let app = app_with(Encode::Fail(4000), |config| {
            config.diagnostic_tail_bytes = 5000;
        });
        let response = app
            .router
            .oneshot(post_render(serde_json::json!({
                "sourceUrl": "https://cdn.example.com/clip.mp4"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = error_body(response).await;
        assert_eq!(body.error, "encode_failed");
        assert_eq!(body.details.len(), 4000);
        assert_eq!(std::fs::read_dir(app.work.path()).unwrap().count(), 0);
    }
}
