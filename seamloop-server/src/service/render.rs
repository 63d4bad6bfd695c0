//! Render Service
//!
//! Runs a render request through the pipeline and delivers the output in
//! the requested shape before the job's files are released.

use chrono::Utc;
use seamloop_core::domain::job::Job;
use seamloop_core::domain::schedule::LoopSchedule;
use seamloop_core::dto::render::{RenderDescriptor, RenderRequest, ResponseMode};
use seamloop_engine::{LoopPipeline, PipelineError, RenderOutcome};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::store::RenderStore;

pub const OUTPUT_FORMAT: &str = "mp4";

/// A delivered render
#[derive(Debug)]
pub enum Rendered {
    /// Encoded bytes, read before the job was released
    Binary {
        job_id: Uuid,
        bytes: Vec<u8>,
        schedule: LoopSchedule,
    },
    /// Reference to a copy moved into the render store
    Descriptor(RenderDescriptor),
}

/// Validates `request` and runs it to completion
pub async fn render(
    pipeline: &LoopPipeline,
    store: &RenderStore,
    config: &ServerConfig,
    request: RenderRequest,
) -> Result<Rendered, PipelineError> {
    let (params, mode) = request.into_params()?;
    let job = Job::new(params);

    tracing::info!(
        "Render job {} accepted: {} ({:?})",
        job.id,
        job.params.source_url,
        mode
    );

    match mode {
        ResponseMode::Binary => pipeline.run(job, read_bytes).await,
        ResponseMode::Descriptor => {
            pipeline
                .run(job, |outcome| publish(store, config, outcome))
                .await
        }
    }
}

async fn read_bytes(outcome: RenderOutcome) -> Result<Rendered, PipelineError> {
    let bytes = tokio::fs::read(&outcome.output)
        .await
        .map_err(|e| PipelineError::Delivery(format!("failed to read output: {}", e)))?;

    Ok(Rendered::Binary {
        job_id: outcome.job_id,
        bytes,
        schedule: outcome.schedule,
    })
}

async fn publish(
    store: &RenderStore,
    config: &ServerConfig,
    outcome: RenderOutcome,
) -> Result<Rendered, PipelineError> {
    let published = store
        .publish(&outcome.output, outcome.job_id)
        .await
        .map_err(|e| PipelineError::Delivery(format!("failed to publish output: {}", e)))?;

    let retention = chrono::Duration::from_std(store.retention())
        .map_err(|e| PipelineError::Internal(e.to_string()))?;

    Ok(Rendered::Descriptor(RenderDescriptor {
        job_id: outcome.job_id,
        url: config.render_url(&published.file_name),
        duration_seconds: round_millis(outcome.schedule.total_duration()),
        format: OUTPUT_FORMAT.to_string(),
        bytes: published.bytes,
        loops: outcome.schedule.loops(),
        fade_seconds: round_millis(outcome.schedule.fade_seconds()),
        expires_at: Utc::now() + retention,
    }))
}

/// Rounds seconds to the precision used on the engine command line
pub fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
