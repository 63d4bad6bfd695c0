use std::sync::Arc;

use anyhow::Context;
use seamloop_engine::EngineConfig;
use seamloop_engine::LoopPipeline;
use seamloop_engine::ffmpeg::FfmpegEngine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod service;
pub mod store;

use config::ServerConfig;
use store::RenderStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "seamloop_server=debug,seamloop_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Seamloop server...");

    let engine_config = EngineConfig::from_env();
    engine_config
        .validate()
        .context("Invalid engine configuration")?;

    let config = ServerConfig::from_env();
    config.validate().context("Invalid server configuration")?;

    tracing::info!(
        "Work dir {}, {} concurrent jobs, encode timeout {:?}",
        engine_config.work_dir.display(),
        engine_config.max_concurrent_jobs,
        engine_config.encode_timeout
    );

    let engine_config = Arc::new(engine_config);

    // A missing engine is reported per job rather than refusing to start
    if let Err(e) = FfmpegEngine::new(engine_config.clone())
        .check_available()
        .await
    {
        tracing::warn!("Media engine unavailable: {:#}", e);
    }

    let pipeline =
        LoopPipeline::from_config(engine_config).context("Failed to build render pipeline")?;

    let store = Arc::new(
        RenderStore::new(config.renders_dir.clone(), config.render_retention)
            .with_context(|| format!("Failed to open {}", config.renders_dir.display()))?,
    );
    store.clone().spawn_sweeper(config.sweep_interval);

    let addr = config.bind_addr.clone();
    let app = api::create_router(api::AppState::new(pipeline, store, config));

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
