//! Duration prober
//!
//! Asks the engine's inspection tool for a file's duration and refuses any
//! answer that is not a finite, strictly positive number of seconds.

use seamloop_core::domain::clip::ClipMetadata;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::EngineConfig;
use crate::process::{self, ProcessError, SupervisedCommand};

/// Probe failure
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe output is not a duration: {0:?}")]
    InvalidOutput(String),

    #[error("probed duration must be positive, got {0}")]
    NotPositive(f64),

    #[error("probe exited with code {exit_code:?}: {diagnostics}")]
    Failed {
        exit_code: Option<i32>,
        diagnostics: String,
    },

    #[error("probe exceeded {0:?}")]
    TimedOut(Duration),

    #[error("failed to start probe: {0}")]
    Spawn(String),
}

/// Measures `path` with the configured ffprobe binary
pub async fn probe_duration(
    config: &EngineConfig,
    path: &Path,
) -> Result<ClipMetadata, ProbeError> {
    let command = probe_command(config, path);

    let output = process::run(&command).await.map_err(|e| match e {
        ProcessError::TimedOut { after, .. } => ProbeError::TimedOut(after),
        other => ProbeError::Spawn(other.to_string()),
    })?;

    if !output.success() {
        return Err(ProbeError::Failed {
            exit_code: output.status.code(),
            diagnostics: output.diagnostics,
        });
    }

    let clip = parse_duration(&output.stdout)?;
    debug!(
        "Probed {}: {:.3}s",
        path.display(),
        clip.duration_seconds()
    );
    Ok(clip)
}

/// Builds the inspection command for `path`
pub fn probe_command(config: &EngineConfig, path: &Path) -> SupervisedCommand {
    SupervisedCommand::new(&config.ffprobe_bin, config.probe_timeout)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path.to_string_lossy())
        .capture_stdout()
        .tail_limit(config.diagnostic_tail_bytes)
}

/// Parses the first non-empty line of probe output as seconds
pub fn parse_duration(raw: &str) -> Result<ClipMetadata, ProbeError> {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| ProbeError::InvalidOutput(raw.to_string()))?;

    let seconds: f64 = line
        .parse()
        .map_err(|_| ProbeError::InvalidOutput(line.to_string()))?;

    if !seconds.is_finite() {
        return Err(ProbeError::InvalidOutput(line.to_string()));
    }

    ClipMetadata::from_duration(seconds).ok_or(ProbeError::NotPositive(seconds))
}
