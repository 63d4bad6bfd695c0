//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod health;
mod plan;
mod render;

pub use plan::PlanArgs;
pub use render::RenderArgs;

use anyhow::Result;
use clap::Subcommand;
use seamloop_client::SeamloopClient;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check that the render service is up
    Health,
    /// Render a seamless loop from a source clip
    Render(RenderArgs),
    /// Compute a loop schedule offline, without contacting the service
    Plan(PlanArgs),
}

/// Handle a CLI command
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Health => health::handle_health(&client(config)?).await,
        Commands::Render(args) => render::handle_render(&client(config)?, args).await,
        Commands::Plan(args) => plan::handle_plan(args),
    }
}

fn client(config: &Config) -> Result<SeamloopClient> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    Ok(SeamloopClient::with_client(&config.server_url, builder.build()?))
}
