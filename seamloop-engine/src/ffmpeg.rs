//! FFmpeg invocation
//!
//! Serializes a [`TransformGraphSpec`] into a `-filter_complex` string and
//! builds the full encoder argument list. This is the only place the graph
//! becomes text; every number in it is formatted by [`secs`] so the
//! transition offsets and the `-t` duration agree.

use async_trait::async_trait;
use seamloop_core::domain::clip::ClipMetadata;
use seamloop_core::domain::graph::{PIXEL_FORMAT, TransformGraphSpec};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::media::{EncodeError, EncodeInvocation, MediaEngine};
use crate::process::{self, ProcessError, SupervisedCommand};
use crate::prober::{self, ProbeError};

/// Formats seconds for the engine, millisecond precision
pub fn secs(value: f64) -> String {
    format!("{:.3}", value)
}

/// Renders the graph as a single `-filter_complex` argument
pub fn filter_complex(graph: &TransformGraphSpec) -> String {
    let mut chains = Vec::with_capacity(
        graph.normalize.len() + graph.crossfades.len() + usize::from(graph.has_audio()),
    );

    for node in &graph.normalize {
        chains.push(format!(
            "[{}:v]scale={}:{},setsar=1,fps={},format={},setpts=PTS-STARTPTS[{}]",
            node.input, node.width, node.height, node.fps, node.pixel_format, node.output
        ));
    }

    for node in &graph.crossfades {
        chains.push(format!(
            "[{}][{}]xfade=transition=fade:duration={}:offset={}[{}]",
            node.left,
            node.right,
            secs(node.duration),
            secs(node.offset),
            node.output
        ));
    }

    if let Some(audio) = &graph.audio {
        let mut filters = vec![
            format!("atrim=duration={}", secs(audio.trim_duration)),
            "asetpts=PTS-STARTPTS".to_string(),
            format!("volume={}", secs(audio.volume)),
        ];
        if audio.fade_in > 0.0 {
            filters.push(format!("afade=t=in:st=0:d={}", secs(audio.fade_in)));
        }
        if audio.fade_out > 0.0 {
            filters.push(format!(
                "afade=t=out:st={}:d={}",
                secs(audio.fade_out_start),
                secs(audio.fade_out)
            ));
        }
        chains.push(format!(
            "[{}:a]{}[{}]",
            audio.input,
            filters.join(","),
            audio.output
        ));
    }

    chains.join(";")
}

/// Builds the complete encoder argument list
pub fn encode_args(
    config: &EngineConfig,
    invocation: &EncodeInvocation,
) -> Result<Vec<String>, EncodeError> {
    let graph = &invocation.graph;
    let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-y", "-loglevel", "error"]
        .into_iter()
        .map(String::from)
        .collect();

    for input in &graph.inputs {
        let path = invocation
            .path_for(input.kind)
            .ok_or(EncodeError::MissingInput(input.kind))?;
        if input.loop_forever {
            args.extend(["-stream_loop".to_string(), "-1".to_string()]);
        }
        args.push("-i".to_string());
        args.push(path.to_string_lossy().into_owned());
    }

    args.push("-filter_complex".to_string());
    args.push(filter_complex(graph));
    args.push("-map".to_string());
    args.push(format!("[{}]", graph.video_output));

    match &graph.audio {
        Some(audio) => {
            args.push("-map".to_string());
            args.push(format!("[{}]", audio.output));
            args.extend(["-c:a", "aac", "-b:a", "192k"].map(String::from));
        }
        None => args.push("-an".to_string()),
    }

    args.extend([
        "-c:v".to_string(),
        config.video_codec.clone(),
        "-preset".to_string(),
        config.preset.clone(),
        "-crf".to_string(),
        config.crf.to_string(),
        "-pix_fmt".to_string(),
        PIXEL_FORMAT.to_string(),
        "-r".to_string(),
        graph.fps.to_string(),
        "-t".to_string(),
        secs(graph.output_duration),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]);
    args.push(invocation.output.to_string_lossy().into_owned());

    Ok(args)
}

/// [`MediaEngine`] backed by the system `ffmpeg` and `ffprobe`
pub struct FfmpegEngine {
    config: Arc<EngineConfig>,
}

impl FfmpegEngine {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    /// Checks that both binaries start and report a version
    pub async fn check_available(&self) -> anyhow::Result<()> {
        for bin in [&self.config.ffmpeg_bin, &self.config.ffprobe_bin] {
            let command = SupervisedCommand::new(bin.as_str(), self.config.probe_timeout)
                .arg("-version")
                .capture_stdout();
            let output = process::run(&command).await?;

            if !output.success() {
                anyhow::bail!("{} -version exited with {}", bin, output.status);
            }

            let version = output.stdout.lines().next().unwrap_or_default();
            info!("{} is available: {}", bin, version.trim());
        }

        Ok(())
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe(&self, path: &Path) -> Result<ClipMetadata, ProbeError> {
        prober::probe_duration(&self.config, path).await
    }

    async fn encode(&self, invocation: &EncodeInvocation) -> Result<(), EncodeError> {
        let args = encode_args(&self.config, invocation)?;
        let command = SupervisedCommand::new(&self.config.ffmpeg_bin, self.config.encode_timeout)
            .args(args)
            .tail_limit(self.config.diagnostic_tail_bytes);

        info!(
            "Encoding {} ({} inputs, {}s)",
            invocation.output.display(),
            invocation.graph.inputs.len(),
            secs(invocation.graph.output_duration)
        );

        let output = process::run(&command).await.map_err(|e| match e {
            ProcessError::TimedOut { after, .. } => EncodeError::TimedOut { after },
            other => EncodeError::Spawn(other.to_string()),
        })?;

        if !output.success() {
            warn!(
                "Encoder exited with {} after {:?}",
                output.status, output.elapsed
            );
            return Err(EncodeError::Failed {
                exit_code: output.status.code(),
                diagnostics: output.diagnostics,
            });
        }

        info!("Encode finished in {:?}", output.elapsed);
        Ok(())
    }
}
