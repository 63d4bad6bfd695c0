//! Seamloop CLI
//!
//! Command-line interface for the Seamloop render service.

mod commands;
mod config;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "seamloop")]
#[command(about = "Seamless video loop renderer", long_about = None)]
struct Cli {
    /// Render service URL
    #[arg(
        long,
        global = true,
        env = "SEAMLOOP_SERVER_URL",
        default_value = "http://localhost:8080"
    )]
    server_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "SEAMLOOP_CLIENT_TIMEOUT")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
        timeout: cli.timeout.map(Duration::from_secs),
    };

    handle_command(cli.command, &config).await
}
