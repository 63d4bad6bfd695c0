//! Render request and response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::job::{AudioSource, RenderParams};

pub const DEFAULT_LOOPS: i64 = 3;
pub const DEFAULT_FADE_SECONDS: f64 = 0.35;
pub const DEFAULT_WIDTH: u32 = 1080;
pub const DEFAULT_HEIGHT: u32 = 1920;
pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_MUSIC_VOLUME: f64 = 0.22;

/// Headers carried by a binary render response
pub const HEADER_JOB_ID: &str = "x-seamloop-job-id";
pub const HEADER_DURATION: &str = "x-seamloop-duration";
pub const HEADER_LOOPS: &str = "x-seamloop-loops";
pub const HEADER_FADE: &str = "x-seamloop-fade";

const MIN_DIMENSION: u32 = 16;
const MAX_DIMENSION: u32 = 4096;
const MAX_FPS: u32 = 120;

/// Request body of `POST /render`
///
/// Every field except `sourceUrl` is optional. `loops` and `fadeSeconds` are
/// clamped later by the planner rather than rejected here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loops: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_volume: Option<f64>,
    /// Pick background music from the server's library when no `audioUrl` is given
    #[serde(default)]
    pub random_music: bool,
    /// Respond with a [`RenderDescriptor`] instead of the media bytes
    #[serde(default)]
    pub return_url: bool,
}

/// How the render is handed back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// `video/mp4` body
    Binary,
    /// JSON [`RenderDescriptor`] pointing at a published copy
    Descriptor,
}

/// Request rejected before reaching the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidRequest(pub String);

impl RenderRequest {
    /// Creates a request for `source_url` with every other field defaulted
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: Some(source_url.into()),
            ..Self::default()
        }
    }

    /// Validates the request and fills in defaults
    pub fn into_params(self) -> Result<(RenderParams, ResponseMode), InvalidRequest> {
        let source_url = self
            .source_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| InvalidRequest("sourceUrl is required".to_string()))?;

        let fade_seconds = self.fade_seconds.unwrap_or(DEFAULT_FADE_SECONDS);
        if !fade_seconds.is_finite() {
            return Err(InvalidRequest("fadeSeconds must be a finite number".to_string()));
        }

        let music_volume = self.music_volume.unwrap_or(DEFAULT_MUSIC_VOLUME);
        if !music_volume.is_finite() {
            return Err(InvalidRequest("musicVolume must be a finite number".to_string()));
        }

        let width = validate_dimension("width", self.width.unwrap_or(DEFAULT_WIDTH))?;
        let height = validate_dimension("height", self.height.unwrap_or(DEFAULT_HEIGHT))?;

        let fps = self.fps.unwrap_or(DEFAULT_FPS);
        if fps == 0 || fps > MAX_FPS {
            return Err(InvalidRequest(format!(
                "fps must be between 1 and {}, got {}",
                MAX_FPS, fps
            )));
        }

        let audio_url = self
            .audio_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        let audio = match (audio_url, self.random_music) {
            (Some(url), _) => AudioSource::Url(url),
            (None, true) => AudioSource::Library,
            (None, false) => AudioSource::None,
        };

        let params = RenderParams {
            source_url,
            loops: self.loops.unwrap_or(DEFAULT_LOOPS),
            fade_seconds,
            width,
            height,
            fps,
            audio,
            music_volume,
        };

        let mode = if self.return_url {
            ResponseMode::Descriptor
        } else {
            ResponseMode::Binary
        };

        Ok((params, mode))
    }
}

fn validate_dimension(name: &str, value: u32) -> Result<u32, InvalidRequest> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        return Err(InvalidRequest(format!(
            "{} must be between {} and {}, got {}",
            name, MIN_DIMENSION, MAX_DIMENSION, value
        )));
    }

    // yuv420p subsamples chroma 2x2
    if value % 2 != 0 {
        return Err(InvalidRequest(format!("{} must be even, got {}", name, value)));
    }

    Ok(value)
}

/// Response body of `POST /render` when `returnUrl` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderDescriptor {
    pub job_id: Uuid,
    /// Where the render can be downloaded until `expires_at`
    pub url: String,
    pub duration_seconds: f64,
    pub format: String,
    pub bytes: u64,
    pub loops: u32,
    pub fade_seconds: f64,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_applied() {
        let (params, mode) = RenderRequest::new("https://cdn.example.com/a.mp4")
            .into_params()
            .unwrap();

        assert_eq!(params.source_url, "https://cdn.example.com/a.mp4");
        assert_eq!(params.loops, DEFAULT_LOOPS);
        assert_eq!(params.fade_seconds, DEFAULT_FADE_SECONDS);
        assert_eq!((params.width, params.height, params.fps), (1080, 1920, 30));
        assert_eq!(params.audio, AudioSource::None);
        assert_eq!(params.music_volume, DEFAULT_MUSIC_VOLUME);
        assert_eq!(mode, ResponseMode::Binary);
    }

    #[test]
    fn test_parses_camel_case_body() {
        let body = serde_json::json!({
            "sourceUrl": "https://cdn.example.com/a.mp4",
            "loops": 20,
            "fadeSeconds": 0.5,
            "width": 720,
            "height": 1280,
            "fps": 25,
            "audioUrl": "https://cdn.example.com/song.mp3",
            "musicVolume": 0.4,
            "returnUrl": true
        });
        let request: RenderRequest = serde_json::from_value(body).unwrap();
        let (params, mode) = request.into_params().unwrap();

        assert_eq!(params.loops, 20);
        assert_eq!((params.width, params.height, params.fps), (720, 1280, 25));
        assert_eq!(
            params.audio,
            AudioSource::Url("https://cdn.example.com/song.mp3".to_string())
        );
        assert_eq!(mode, ResponseMode::Descriptor);
    }

    #[test]
    fn test_missing_source_url_is_rejected() {
        assert!(RenderRequest::default().into_params().is_err());
        assert!(RenderRequest::new("   ").into_params().is_err());
    }

    #[test]
    fn test_out_of_range_fields_are_rejected() {
        let mut request = RenderRequest::new("https://cdn.example.com/a.mp4");
        request.width = Some(1081);
        assert!(request.clone().into_params().is_err());

        request.width = Some(8);
        assert!(request.clone().into_params().is_err());

        request.width = None;
        request.fps = Some(0);
        assert!(request.clone().into_params().is_err());

        request.fps = None;
        request.fade_seconds = Some(f64::INFINITY);
        assert!(request.into_params().is_err());
    }

    #[test]
    fn test_blank_audio_url_is_absent() {
        let mut request = RenderRequest::new("https://cdn.example.com/a.mp4");
        request.audio_url = Some(" ".to_string());
        let (params, _) = request.into_params().unwrap();
        assert_eq!(params.audio, AudioSource::None);
    }

    #[test]
    fn test_random_music_selects_library() {
        let mut request = RenderRequest::new("https://cdn.example.com/a.mp4");
        request.random_music = true;
        let (params, _) = request.into_params().unwrap();
        assert_eq!(params.audio, AudioSource::Library);
    }

    #[test]
    fn test_request_serializes_without_unset_fields() {
        let value = serde_json::to_value(RenderRequest::new("https://x/a.mp4")).unwrap();
        assert_eq!(value["sourceUrl"], "https://x/a.mp4");
        assert!(value.get("loops").is_none());
        assert_eq!(value["returnUrl"], false);
    }
}
