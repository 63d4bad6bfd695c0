//! Engine configuration
//!
//! Defines all configurable parameters of the render pipeline: engine
//! binaries, working directories, timeouts, admission limits, planner clamps
//! and encoder settings. Built once and shared read-only by every job.

use std::path::PathBuf;
use std::time::Duration;

use seamloop_core::planner::PlannerLimits;

/// Engine configuration
///
/// Timeouts are independent: a slow download never eats into the encode
/// budget, and the probe has its own short limit.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Encoder binary (e.g., "ffmpeg" or an absolute path)
    pub ffmpeg_bin: String,

    /// Inspection binary used for duration probes
    pub ffprobe_bin: String,

    /// Directory holding per-job ephemeral files
    pub work_dir: PathBuf,

    /// Local background-music library, if any
    pub music_dir: Option<PathBuf>,

    /// Maximum time for one remote download
    pub fetch_timeout: Duration,

    /// Maximum size of one remote download
    pub max_download_bytes: u64,

    /// Maximum time for one duration probe
    pub probe_timeout: Duration,

    /// Maximum wall-clock time for one encode
    pub encode_timeout: Duration,

    /// Jobs allowed to run at once; others wait for a permit
    pub max_concurrent_jobs: usize,

    /// Clamp bounds for loops and fade
    pub limits: PlannerLimits,

    /// Background music fade-in, seconds
    pub audio_fade_in: f64,

    /// Background music fade-out, seconds
    pub audio_fade_out: f64,

    /// Bytes of encoder stderr kept for error reports
    pub diagnostic_tail_bytes: usize,

    pub video_codec: String,
    pub preset: String,
    pub crf: u32,
}

impl EngineConfig {
    /// Creates a configuration with defaults rooted at `work_dir`
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            work_dir,
            music_dir: None,
            fetch_timeout: Duration::from_secs(30),
            max_download_bytes: 200 * 1024 * 1024,
            probe_timeout: Duration::from_secs(15),
            encode_timeout: Duration::from_secs(300), // 5 minutes
            max_concurrent_jobs: 2,
            limits: PlannerLimits::default(),
            audio_fade_in: 0.5,
            audio_fade_out: 1.0,
            diagnostic_tail_bytes: 2000,
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 20,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Every variable is optional and falls back to its default:
    /// - SEAMLOOP_FFMPEG, SEAMLOOP_FFPROBE
    /// - SEAMLOOP_WORK_DIR, SEAMLOOP_MUSIC_DIR
    /// - SEAMLOOP_FETCH_TIMEOUT, SEAMLOOP_PROBE_TIMEOUT, SEAMLOOP_ENCODE_TIMEOUT (seconds)
    /// - SEAMLOOP_MAX_DOWNLOAD_BYTES, SEAMLOOP_MAX_CONCURRENT_JOBS
    /// - SEAMLOOP_MAX_LOOPS, SEAMLOOP_MIN_FADE, SEAMLOOP_MAX_FADE
    /// - SEAMLOOP_AUDIO_FADE_IN, SEAMLOOP_AUDIO_FADE_OUT (seconds)
    /// - SEAMLOOP_DIAGNOSTIC_TAIL (bytes)
    /// - SEAMLOOP_VIDEO_CODEC, SEAMLOOP_PRESET, SEAMLOOP_CRF
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ffmpeg_bin: env_string("SEAMLOOP_FFMPEG").unwrap_or(defaults.ffmpeg_bin),
            ffprobe_bin: env_string("SEAMLOOP_FFPROBE").unwrap_or(defaults.ffprobe_bin),
            work_dir: env_string("SEAMLOOP_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            music_dir: env_string("SEAMLOOP_MUSIC_DIR").map(PathBuf::from),
            fetch_timeout: env_secs("SEAMLOOP_FETCH_TIMEOUT").unwrap_or(defaults.fetch_timeout),
            max_download_bytes: env_parse("SEAMLOOP_MAX_DOWNLOAD_BYTES")
                .unwrap_or(defaults.max_download_bytes),
            probe_timeout: env_secs("SEAMLOOP_PROBE_TIMEOUT").unwrap_or(defaults.probe_timeout),
            encode_timeout: env_secs("SEAMLOOP_ENCODE_TIMEOUT")
                .unwrap_or(defaults.encode_timeout),
            max_concurrent_jobs: env_parse("SEAMLOOP_MAX_CONCURRENT_JOBS")
                .unwrap_or(defaults.max_concurrent_jobs),
            limits: PlannerLimits {
                max_loops: env_parse("SEAMLOOP_MAX_LOOPS").unwrap_or(defaults.limits.max_loops),
                min_fade: env_parse("SEAMLOOP_MIN_FADE").unwrap_or(defaults.limits.min_fade),
                max_fade: env_parse("SEAMLOOP_MAX_FADE").unwrap_or(defaults.limits.max_fade),
            },
            audio_fade_in: env_parse("SEAMLOOP_AUDIO_FADE_IN").unwrap_or(defaults.audio_fade_in),
            audio_fade_out: env_parse("SEAMLOOP_AUDIO_FADE_OUT")
                .unwrap_or(defaults.audio_fade_out),
            diagnostic_tail_bytes: env_parse("SEAMLOOP_DIAGNOSTIC_TAIL")
                .unwrap_or(defaults.diagnostic_tail_bytes),
            video_codec: env_string("SEAMLOOP_VIDEO_CODEC").unwrap_or(defaults.video_codec),
            preset: env_string("SEAMLOOP_PRESET").unwrap_or(defaults.preset),
            crf: env_parse("SEAMLOOP_CRF").unwrap_or(defaults.crf),
        }
    }

    /// Sets the music library directory
    pub fn with_music_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.music_dir = Some(dir.into());
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ffmpeg_bin.is_empty() {
            anyhow::bail!("ffmpeg_bin cannot be empty");
        }

        if self.ffprobe_bin.is_empty() {
            anyhow::bail!("ffprobe_bin cannot be empty");
        }

        if self.fetch_timeout.is_zero() {
            anyhow::bail!("fetch_timeout must be greater than 0");
        }

        if self.probe_timeout.is_zero() {
            anyhow::bail!("probe_timeout must be greater than 0");
        }

        if self.encode_timeout.is_zero() {
            anyhow::bail!("encode_timeout must be greater than 0");
        }

        if self.max_download_bytes == 0 {
            anyhow::bail!("max_download_bytes must be greater than 0");
        }

        if self.max_concurrent_jobs == 0 {
            anyhow::bail!("max_concurrent_jobs must be greater than 0");
        }

        if self.diagnostic_tail_bytes == 0 {
            anyhow::bail!("diagnostic_tail_bytes must be greater than 0");
        }

        if !self.audio_fade_in.is_finite() || self.audio_fade_in < 0.0 {
            anyhow::bail!("audio_fade_in must be a non-negative number");
        }

        if !self.audio_fade_out.is_finite() || self.audio_fade_out < 0.0 {
            anyhow::bail!("audio_fade_out must be a non-negative number");
        }

        self.limits.validate()?;

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join("seamloop"))
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|s| s.trim().parse::<T>().ok())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_secs)
}
