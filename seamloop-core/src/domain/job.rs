//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single render request moving through the pipeline
///
/// Created when a request arrives and dropped once its terminal outcome has
/// been delivered. The engine's lifecycle manager tracks the ephemeral files
/// the job owns under the job's id.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub params: RenderParams,
    pub created_at: DateTime<Utc>,
    status: JobStatus,
}

impl Job {
    /// Creates a new job with a fresh id
    pub fn new(params: RenderParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            params,
            created_at: Utc::now(),
            status: JobStatus::Accepted,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Moves the job to `status`
    ///
    /// Terminal states are sticky: once reached, later transitions are ignored.
    pub fn set_status(&mut self, status: JobStatus) {
        if !self.status.is_terminal() {
            self.status = status;
        }
    }
}

/// Validated input parameters of a job
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub source_url: String,
    /// Requested repetitions, clamped by the planner
    pub loops: i64,
    /// Requested crossfade, clamped by the planner
    pub fade_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub audio: AudioSource,
    /// Requested music volume, clamped to [0, 1] by the compiler
    pub music_volume: f64,
}

/// Where the background audio comes from, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// No audio stream; the clip's own audio is discarded
    None,
    /// A remote asset fetched for this job
    Url(String),
    /// A random pick from the local music library
    Library,
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Accepted,
    Fetching,
    Probing,
    Planning,
    Encoding,
    Delivering,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::TimedOut
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RenderParams {
        RenderParams {
            source_url: "https://example.com/clip.mp4".to_string(),
            loops: 3,
            fade_seconds: 0.35,
            width: 1080,
            height: 1920,
            fps: 30,
            audio: AudioSource::None,
            music_volume: 0.22,
        }
    }

    #[test]
    fn test_new_job_is_accepted() {
        let job = Job::new(params());
        assert_eq!(job.status(), JobStatus::Accepted);
    }

    #[test]
    fn test_jobs_get_distinct_ids() {
        assert_ne!(Job::new(params()).id, Job::new(params()).id);
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let mut job = Job::new(params());
        job.set_status(JobStatus::Encoding);
        job.set_status(JobStatus::TimedOut);
        job.set_status(JobStatus::Succeeded);
        assert_eq!(job.status(), JobStatus::TimedOut);
    }
}
