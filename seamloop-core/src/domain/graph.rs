//! Transform graph types
//!
//! A structured description of the media operations the external engine
//! performs in one invocation. It is built by [`crate::compiler::compile`]
//! and serialized only at the execution boundary.

/// Pixel format every repetition is normalized to
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Label of the composed video stream
pub const VIDEO_OUTPUT_LABEL: &str = "vout";

/// Label of the mixed background audio stream
pub const AUDIO_OUTPUT_LABEL: &str = "aout";

/// What an engine input refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// The downloaded source clip
    SourceClip,
    /// The background audio asset
    BackgroundAudio,
}

/// One positional input of the engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRef {
    pub kind: InputKind,
    /// Whether the engine should loop this input indefinitely
    pub loop_forever: bool,
}

/// Per-repetition normalization: scale, frame rate, pixel format, timestamp reset
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeNode {
    /// Index into [`TransformGraphSpec::inputs`]
    pub input: usize,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub pixel_format: &'static str,
    pub output: String,
}

/// Crossfade from `left` into `right`
#[derive(Debug, Clone, PartialEq)]
pub struct CrossfadeNode {
    pub left: String,
    pub right: String,
    pub duration: f64,
    /// Seconds from the start of `left` at which the fade begins
    pub offset: f64,
    pub output: String,
}

/// Background audio: loop, trim, timestamp reset, volume, fades
#[derive(Debug, Clone, PartialEq)]
pub struct AudioNode {
    /// Index into [`TransformGraphSpec::inputs`]
    pub input: usize,
    pub trim_duration: f64,
    pub volume: f64,
    pub fade_in: f64,
    pub fade_out: f64,
    pub fade_out_start: f64,
    pub output: String,
}

/// Complete transform graph for one job
#[derive(Debug, Clone, PartialEq)]
pub struct TransformGraphSpec {
    /// Ordered engine inputs
    pub inputs: Vec<InputRef>,
    /// One node per repetition, in input order
    pub normalize: Vec<NormalizeNode>,
    /// Chained transitions, in timeline order
    pub crossfades: Vec<CrossfadeNode>,
    pub audio: Option<AudioNode>,
    /// Label carrying the final composed video
    pub video_output: String,
    /// Explicit output duration passed to the engine
    pub output_duration: f64,
    pub fps: u32,
}

impl TransformGraphSpec {
    /// Whether the graph produces an audio stream
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Number of inputs referring to the source clip
    pub fn clip_input_count(&self) -> usize {
        self.inputs
            .iter()
            .filter(|input| input.kind == InputKind::SourceClip)
            .count()
    }
}
