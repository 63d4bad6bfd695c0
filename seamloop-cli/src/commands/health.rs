//! Health command handler

use anyhow::Result;
use colored::*;
use seamloop_client::SeamloopClient;

pub async fn handle_health(client: &SeamloopClient) -> Result<()> {
    match client.health().await {
        Ok(()) => {
            println!("{} {} is up", "✓".green(), client.base_url());
            Ok(())
        }
        Err(e) => {
            println!("{} {} is unreachable", "✗".red(), client.base_url());
            Err(e.into())
        }
    }
}
