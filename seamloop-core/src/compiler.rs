//! Transform graph compiler
//!
//! Translates a [`LoopSchedule`] into a [`TransformGraphSpec`]: one
//! normalization node per repetition, a pairwise chain of crossfades, and an
//! optional background-audio node. The schedule is only read.

use crate::domain::graph::{
    AUDIO_OUTPUT_LABEL, AudioNode, CrossfadeNode, InputKind, InputRef, NormalizeNode,
    PIXEL_FORMAT, TransformGraphSpec, VIDEO_OUTPUT_LABEL,
};
use crate::domain::schedule::LoopSchedule;

/// Target geometry and frame rate of the render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Background audio mixing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioMix {
    /// Requested volume factor, clamped to [0, 1]
    pub volume: f64,
    pub fade_in: f64,
    pub fade_out: f64,
}

/// Builds the transform graph for `schedule`
///
/// The source clip is referenced `schedule.loops()` times, followed by the
/// audio asset once when `audio` is given. Without audio the graph carries
/// no audio stream at all, so the clips' own audio is dropped.
pub fn compile(
    schedule: &LoopSchedule,
    output: &OutputFormat,
    audio: Option<&AudioMix>,
) -> TransformGraphSpec {
    let loops = schedule.loops() as usize;

    let mut inputs: Vec<InputRef> = (0..loops)
        .map(|_| InputRef {
            kind: InputKind::SourceClip,
            loop_forever: false,
        })
        .collect();

    let normalize: Vec<NormalizeNode> = (0..loops)
        .map(|i| NormalizeNode {
            input: i,
            width: output.width,
            height: output.height,
            fps: output.fps,
            pixel_format: PIXEL_FORMAT,
            output: format!("v{}", i),
        })
        .collect();

    let mut crossfades = Vec::with_capacity(schedule.offsets().len());
    let mut running = normalize[0].output.clone();

    for (i, offset) in schedule.offsets().iter().enumerate() {
        let is_last = i + 1 == schedule.offsets().len();
        let label = if is_last {
            VIDEO_OUTPUT_LABEL.to_string()
        } else {
            format!("x{}", i + 1)
        };

        crossfades.push(CrossfadeNode {
            left: running,
            right: normalize[i + 1].output.clone(),
            duration: schedule.fade_seconds(),
            offset: *offset,
            output: label.clone(),
        });

        running = label;
    }

    let total = schedule.total_duration();
    let audio = audio.map(|mix| {
        inputs.push(InputRef {
            kind: InputKind::BackgroundAudio,
            loop_forever: true,
        });

        let fade_in = clamp_fade(mix.fade_in, total);
        let fade_out = clamp_fade(mix.fade_out, total);

        AudioNode {
            input: inputs.len() - 1,
            trim_duration: total,
            volume: clamp_volume(mix.volume),
            fade_in,
            fade_out,
            fade_out_start: total - fade_out,
            output: AUDIO_OUTPUT_LABEL.to_string(),
        }
    });

    TransformGraphSpec {
        inputs,
        normalize,
        crossfades,
        audio,
        video_output: running,
        output_duration: total,
        fps: output.fps,
    }
}

/// Clamps a volume factor to [0, 1]; non-finite input mutes
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// A fade longer than half the render would overlap its counterpart.
fn clamp_fade(fade: f64, total: f64) -> f64 {
    if fade.is_finite() {
        fade.clamp(0.0, total / 2.0)
    } else {
        0.0
    }
}
