//! Render command handler
//!
//! Sends a render request and either saves the bytes or prints the
//! descriptor of the published copy.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use seamloop_client::{ClientError, SeamloopClient};
use seamloop_core::dto::render::RenderRequest;

/// Arguments of `seamloop render`
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// URL of the source clip
    pub source_url: String,

    /// Repetitions (clamped by the service)
    #[arg(long)]
    pub loops: Option<i64>,

    /// Crossfade seconds (clamped by the service)
    #[arg(long)]
    pub fade: Option<f64>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    #[arg(long)]
    pub fps: Option<u32>,

    /// Background music URL
    #[arg(long)]
    pub audio_url: Option<String>,

    /// Background music volume, 0 to 1
    #[arg(long)]
    pub music_volume: Option<f64>,

    /// Pick background music from the service's library
    #[arg(long)]
    pub random_music: bool,

    /// Write the render to this file
    #[arg(short, long, required_unless_present = "link")]
    pub output: Option<PathBuf>,

    /// Print a download link instead of fetching the bytes
    #[arg(long, conflicts_with = "output")]
    pub link: bool,
}

impl RenderArgs {
    pub fn to_request(&self) -> RenderRequest {
        RenderRequest {
            loops: self.loops,
            fade_seconds: self.fade,
            width: self.width,
            height: self.height,
            fps: self.fps,
            audio_url: self.audio_url.clone(),
            music_volume: self.music_volume,
            random_music: self.random_music,
            return_url: self.link,
            ..RenderRequest::new(&self.source_url)
        }
    }
}

pub async fn handle_render(client: &SeamloopClient, args: RenderArgs) -> Result<()> {
    let request = args.to_request();
    println!("{} {}", "Rendering".bold(), args.source_url.cyan());

    match &args.output {
        Some(path) => {
            let video = client.render_bytes(request).await.map_err(explain)?;
            std::fs::write(path, &video.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            println!(
                "{} Wrote {} ({} bytes)",
                "✓".green(),
                path.display().to_string().cyan(),
                video.bytes.len()
            );
            if let (Some(loops), Some(duration)) = (video.loops, video.duration_seconds) {
                println!("  Loops:    {}", loops);
                println!("  Duration: {:.3}s", duration);
            }
            if let Some(fade) = video.fade_seconds {
                println!("  Fade:     {:.3}s", fade);
            }
            if let Some(job_id) = video.job_id {
                println!("  Job:      {}", job_id.to_string().dimmed());
            }
        }
        _ => {
            let descriptor = client.render_descriptor(request).await.map_err(explain)?;

            println!("{} Render published", "✓".green());
            println!("  URL:      {}", descriptor.url.cyan());
            println!("  Loops:    {}", descriptor.loops);
            println!("  Fade:     {:.3}s", descriptor.fade_seconds);
            println!("  Duration: {:.3}s", descriptor.duration_seconds);
            println!("  Size:     {} bytes", descriptor.bytes);
            println!(
                "  Expires:  {}",
                descriptor
                    .expires_at
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string()
                    .dimmed()
            );
            println!("  Job:      {}", descriptor.job_id.to_string().dimmed());
        }
    }

    Ok(())
}

fn explain(error: ClientError) -> anyhow::Error {
    if error.is_timeout() {
        eprintln!(
            "{}",
            "The render timed out; try fewer loops or a smaller size.".yellow()
        );
    }
    error.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RenderArgs,
    }

    #[test]
    fn test_args_map_to_request() {
        let cli = TestCli::parse_from([
            "seamloop",
            "https://cdn.example.com/clip.mp4",
            "--loops",
            "4",
            "--fade",
            "0.5",
            "--random-music",
            "-o",
            "loop.mp4",
        ]);
        let request = cli.args.to_request();

        assert_eq!(
            request.source_url.as_deref(),
            Some("https://cdn.example.com/clip.mp4")
        );
        assert_eq!(request.loops, Some(4));
        assert_eq!(request.fade_seconds, Some(0.5));
        assert!(request.random_music);
        assert!(!request.return_url);
    }

    #[test]
    fn test_link_requests_descriptor() {
        let cli = TestCli::parse_from(["seamloop", "https://cdn.example.com/clip.mp4", "--link"]);
        assert!(cli.args.to_request().return_url);
    }

    #[test]
    fn test_requires_output_or_link() {
        assert!(TestCli::try_parse_from(["seamloop", "https://cdn.example.com/clip.mp4"]).is_err());
    }
}
