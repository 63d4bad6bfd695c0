//! Media engine abstraction
//!
//! The pipeline talks to the external engine only through [`MediaEngine`],
//! so the stages can be exercised without a real encoder installed.

use async_trait::async_trait;
use seamloop_core::domain::clip::ClipMetadata;
use seamloop_core::domain::graph::{InputKind, TransformGraphSpec};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::prober::ProbeError;

/// Service trait for the external media engine
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Measures the duration of a local media file
    async fn probe(&self, path: &Path) -> Result<ClipMetadata, ProbeError>;

    /// Runs one encode; never deletes files
    async fn encode(&self, invocation: &EncodeInvocation) -> Result<(), EncodeError>;
}

/// Everything one encode needs
#[derive(Debug, Clone)]
pub struct EncodeInvocation {
    pub graph: TransformGraphSpec,
    pub source: PathBuf,
    pub audio: Option<PathBuf>,
    pub output: PathBuf,
}

impl EncodeInvocation {
    /// Local file backing an input of the given kind
    pub fn path_for(&self, kind: InputKind) -> Option<&Path> {
        match kind {
            InputKind::SourceClip => Some(self.source.as_path()),
            InputKind::BackgroundAudio => self.audio.as_deref(),
        }
    }
}

/// Encode failure
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("encoder exited with code {exit_code:?}")]
    Failed {
        exit_code: Option<i32>,
        /// Bounded tail of the encoder's stderr
        diagnostics: String,
    },

    #[error("encoder exceeded {after:?}")]
    TimedOut { after: Duration },

    #[error("failed to start encoder: {0}")]
    Spawn(String),

    #[error("graph references a {0:?} input but no file was provided")]
    MissingInput(InputKind),
}
