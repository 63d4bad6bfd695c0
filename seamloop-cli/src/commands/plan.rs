//! Plan command handler
//!
//! Runs the schedule planner locally, which is handy for choosing loop and
//! fade values before sending a render.

use anyhow::Result;
use clap::Args;
use colored::*;
use seamloop_core::compiler::{AudioMix, OutputFormat, compile};
use seamloop_core::domain::schedule::LoopSchedule;
use seamloop_core::dto::render::{
    DEFAULT_FADE_SECONDS, DEFAULT_FPS, DEFAULT_HEIGHT, DEFAULT_LOOPS, DEFAULT_MUSIC_VOLUME,
    DEFAULT_WIDTH,
};
use seamloop_core::planner::{PlannerLimits, plan};
use seamloop_engine::EngineConfig;
use seamloop_engine::ffmpeg::filter_complex;

/// Arguments of `seamloop plan`
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Source clip duration in seconds
    #[arg(long)]
    pub duration: f64,

    #[arg(long, default_value_t = DEFAULT_LOOPS, allow_negative_numbers = true)]
    pub loops: i64,

    #[arg(long, default_value_t = DEFAULT_FADE_SECONDS)]
    pub fade: f64,

    /// Upper bound on loops
    #[arg(long, default_value_t = PlannerLimits::default().max_loops)]
    pub max_loops: u32,

    /// Also print the compiled filter graph
    #[arg(long)]
    pub graph: bool,

    /// Include a background-audio node in the graph
    #[arg(long, requires = "graph")]
    pub with_audio: bool,

    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    #[arg(long, default_value_t = DEFAULT_FPS)]
    pub fps: u32,

    /// Print the schedule as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_plan(args: PlanArgs) -> Result<()> {
    let limits = PlannerLimits {
        max_loops: args.max_loops,
        ..PlannerLimits::default()
    };
    limits.validate()?;

    let schedule = plan(args.duration, args.loops, args.fade, &limits)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        print_schedule(&schedule);
    }

    if args.graph {
        let format = OutputFormat {
            width: args.width,
            height: args.height,
            fps: args.fps,
        };
        let defaults = EngineConfig::default();
        let mix = AudioMix {
            volume: DEFAULT_MUSIC_VOLUME,
            fade_in: defaults.audio_fade_in,
            fade_out: defaults.audio_fade_out,
        };
        let graph = compile(&schedule, &format, args.with_audio.then_some(&mix));

        println!();
        println!("{}", "Filter graph:".bold());
        println!("{}", filter_complex(&graph).replace(';', ";\n"));
    }

    Ok(())
}

fn print_schedule(schedule: &LoopSchedule) {
    println!("{}", "Loop schedule:".bold());
    println!("  Clip:     {:.3}s", schedule.clip_duration());
    println!("  Loops:    {}", schedule.loops().to_string().cyan());
    println!("  Fade:     {:.3}s", schedule.fade_seconds());
    println!("  Total:    {:.3}s", schedule.total_duration());

    let offsets: Vec<String> = schedule
        .offsets()
        .iter()
        .map(|offset| format!("{:.3}", offset))
        .collect();
    println!("  Offsets:  {}", offsets.join(", ").dimmed());
}
