//! Crossfade schedule types

use serde::Serialize;

/// Crossfade schedule for one job
///
/// Produced by [`crate::planner::plan`] and immutable afterwards. It fully
/// determines the transform graph built by the compiler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSchedule {
    clip_duration: f64,
    loops: u32,
    fade_seconds: f64,
    offsets: Vec<f64>,
    total_duration: f64,
}

impl LoopSchedule {
    pub(crate) fn new(
        clip_duration: f64,
        loops: u32,
        fade_seconds: f64,
        offsets: Vec<f64>,
        total_duration: f64,
    ) -> Self {
        Self {
            clip_duration,
            loops,
            fade_seconds,
            offsets,
            total_duration,
        }
    }

    /// Duration of one repetition of the source clip
    pub fn clip_duration(&self) -> f64 {
        self.clip_duration
    }

    /// Number of repetitions stitched together
    pub fn loops(&self) -> u32 {
        self.loops
    }

    /// Effective crossfade duration after clamping
    pub fn fade_seconds(&self) -> f64 {
        self.fade_seconds
    }

    /// Transition start times on the stitched timeline, one per transition
    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// Length of the composed output
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }
}
