//! Loop composition pipeline
//!
//! Sequences one job through fetch, probe, plan, compile and encode, then
//! hands the output to a delivery callback. The job's workspace is released
//! after delivery returns, whatever the outcome.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use seamloop_core::compiler::{AudioMix, OutputFormat, compile};
use seamloop_core::domain::clip::ClipMetadata;
use seamloop_core::domain::job::{AudioSource, Job, JobStatus};
use seamloop_core::domain::schedule::LoopSchedule;
use seamloop_core::planner::plan;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::PipelineError;
use crate::fetcher::{HttpFetcher, ResourceFetcher, extension_from_url};
use crate::ffmpeg::FfmpegEngine;
use crate::lifecycle::JobWorkspace;
use crate::media::{EncodeInvocation, MediaEngine};
use crate::music::MusicLibrary;

/// A finished render, valid until the delivery callback returns
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub job_id: Uuid,
    /// Encoded file inside the job's workspace
    pub output: PathBuf,
    pub clip: ClipMetadata,
    pub schedule: LoopSchedule,
    pub with_audio: bool,
}

/// The render pipeline shared by all requests
pub struct LoopPipeline {
    config: Arc<EngineConfig>,
    engine: Arc<dyn MediaEngine>,
    fetcher: Arc<dyn ResourceFetcher>,
    music: MusicLibrary,
    admission: Arc<Semaphore>,
}

impl LoopPipeline {
    pub fn new(
        config: Arc<EngineConfig>,
        engine: Arc<dyn MediaEngine>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        let music = MusicLibrary::new(config.music_dir.clone());
        let admission = Arc::new(Semaphore::new(config.max_concurrent_jobs));

        Self {
            config,
            engine,
            fetcher,
            music,
            admission,
        }
    }

    /// Builds a pipeline over the system ffmpeg and an HTTP fetcher
    pub fn from_config(config: Arc<EngineConfig>) -> Result<Self, PipelineError> {
        let engine = Arc::new(FfmpegEngine::new(config.clone()));
        let fetcher = Arc::new(HttpFetcher::new(
            config.fetch_timeout,
            config.max_download_bytes,
        )?);

        Ok(Self::new(config, engine, fetcher))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Permits currently free
    pub fn available_permits(&self) -> usize {
        self.admission.available_permits()
    }

    /// Runs `job` and passes the result to `deliver`
    ///
    /// `deliver` must consume the output (read it or move it away) before
    /// returning; every file registered to the job is deleted afterwards.
    pub async fn run<F, Fut, T>(&self, mut job: Job, deliver: F) -> Result<T, PipelineError>
    where
        F: FnOnce(RenderOutcome) -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let library_track = self.resolve_library_track(&job).await?;

        let _permit = self
            .admission
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| PipelineError::Internal(format!("admission closed: {}", e)))?;
        debug!("Job {} admitted", job.id);

        let workspace = JobWorkspace::create(job.id, &self.config.work_dir)
            .await
            .map_err(PipelineError::Workspace)?;

        let result = self
            .execute(&mut job, &workspace, library_track, deliver)
            .await;

        let report = workspace.close().await;
        if report.failed > 0 {
            warn!("Job {} left {} files behind", job.id, report.failed);
        }

        match &result {
            Ok(_) => {
                job.set_status(JobStatus::Succeeded);
                info!(status = ?job.status(), "Job {} finished", job.id);
            }
            Err(e) => {
                job.set_status(match e {
                    PipelineError::EncodeTimeout(_) => JobStatus::TimedOut,
                    _ => JobStatus::Failed,
                });
                warn!(status = ?job.status(), "Job {} finished: {}", job.id, e);
            }
        }

        result
    }

    async fn resolve_library_track(&self, job: &Job) -> Result<Option<PathBuf>, PipelineError> {
        if job.params.audio != AudioSource::Library {
            return Ok(None);
        }

        if !self.music.is_configured() {
            return Err(PipelineError::Validation(
                "randomMusic requested but no music library is configured".to_string(),
            ));
        }

        let track = self
            .music
            .pick()
            .await
            .map_err(|e| PipelineError::Internal(format!("music library unreadable: {}", e)))?
            .ok_or_else(|| PipelineError::Validation("music library is empty".to_string()))?;

        debug!("Job {} picked {}", job.id, track.display());
        Ok(Some(track))
    }

    async fn execute<F, Fut, T>(
        &self,
        job: &mut Job,
        workspace: &JobWorkspace,
        library_track: Option<PathBuf>,
        deliver: F,
    ) -> Result<T, PipelineError>
    where
        F: FnOnce(RenderOutcome) -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let params = job.params.clone();

        transition(job, JobStatus::Fetching);
        let source = workspace.register("source", &extension_from_url(&params.source_url, "media"));
        self.fetcher.fetch(&params.source_url, &source).await?;

        transition(job, JobStatus::Probing);
        let clip = self.engine.probe(&source).await?;

        transition(job, JobStatus::Planning);
        let schedule = plan(
            clip.duration_seconds(),
            params.loops,
            params.fade_seconds,
            &self.config.limits,
        )?;
        info!(
            "Job {}: {} loops, fade {:.3}s, total {:.3}s",
            job.id,
            schedule.loops(),
            schedule.fade_seconds(),
            schedule.total_duration()
        );

        let audio = match &params.audio {
            AudioSource::None => None,
            AudioSource::Url(url) => {
                transition(job, JobStatus::Fetching);
                let path = workspace.register("audio", &extension_from_url(url, "audio"));
                self.fetcher.fetch(url, &path).await?;
                Some(path)
            }
            AudioSource::Library => library_track,
        };

        let mix = AudioMix {
            volume: params.music_volume,
            fade_in: self.config.audio_fade_in,
            fade_out: self.config.audio_fade_out,
        };
        let format = OutputFormat {
            width: params.width,
            height: params.height,
            fps: params.fps,
        };
        let graph = compile(&schedule, &format, audio.as_ref().map(|_| &mix));

        transition(job, JobStatus::Encoding);
        let output = workspace.register("output", "mp4");
        let invocation = EncodeInvocation {
            graph,
            source,
            audio,
            output: output.clone(),
        };
        self.engine.encode(&invocation).await?;

        transition(job, JobStatus::Delivering);
        deliver(RenderOutcome {
            job_id: job.id,
            output,
            clip,
            schedule,
            with_audio: invocation.audio.is_some(),
        })
        .await
    }
}

fn transition(job: &mut Job, status: JobStatus) {
    job.set_status(status);
    debug!("Job {} -> {:?}", job.id, job.status());
}
