//! Seamloop Engine
//!
//! Runs the loop composition pipeline for one job at a time per permit:
//! fetch the source clip, probe its duration, plan the crossfade schedule,
//! compile the transform graph, and supervise the external encoder.
//!
//! Architecture:
//! - Configuration: immutable settings loaded from environment or defaults
//! - Fetcher: remote asset download with timeout and size bound
//! - Process: subprocess supervision with wall-clock timeout and stderr tail
//! - FFmpeg: engine invocation contract (probe, filter graph, encode args)
//! - Lifecycle: per-job ephemeral file registry with guaranteed release
//! - Pipeline: stage sequencing under an admission limiter

pub mod config;
pub mod error;
pub mod fetcher;
pub mod ffmpeg;
pub mod lifecycle;
pub mod media;
pub mod music;
pub mod pipeline;
pub mod process;
pub mod prober;

pub use config::EngineConfig;
pub use error::PipelineError;
pub use pipeline::{LoopPipeline, RenderOutcome};
