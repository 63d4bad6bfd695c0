//! Job workspace lifecycle
//!
//! Every ephemeral file of a job is registered here when its path is chosen,
//! before anything is written to it. [`JobWorkspace::close`] deletes all of
//! them exactly once off the async executor; dropping the workspace releases
//! it inline, so a cancelled job leaves nothing behind.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};
use uuid::Uuid;

/// Outcome of releasing a workspace
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    /// Files deleted
    pub removed: usize,
    /// Registered paths that were never created or were already moved away
    pub missing: usize,
    /// Deletions that failed for any other reason
    pub failed: usize,
}

/// Per-job registry of ephemeral files
#[derive(Debug)]
pub struct JobWorkspace {
    job_id: Uuid,
    dir: PathBuf,
    resources: Mutex<Vec<PathBuf>>,
    released: AtomicBool,
}

impl JobWorkspace {
    /// Creates the workspace, making sure `base` exists
    pub async fn create(job_id: Uuid, base: &Path) -> io::Result<Self> {
        tokio::fs::create_dir_all(base).await?;

        Ok(Self {
            job_id,
            dir: base.to_path_buf(),
            resources: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
        })
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Chooses a path for a new file and registers it
    ///
    /// The file is named `<job id>-<label>.<ext>` so concurrent jobs sharing
    /// a base directory never collide.
    pub fn register(&self, label: &str, ext: &str) -> PathBuf {
        let path = self.dir.join(format!("{}-{}.{}", self.job_id, label, ext));

        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.clone());

        debug!("Job {} registered {}", self.job_id, path.display());
        path
    }

    /// Snapshot of the registered paths, in registration order
    pub fn resources(&self) -> Vec<PathBuf> {
        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Deletes every registered file
    ///
    /// Runs once; later calls return an empty report. Failures are logged and
    /// counted, never returned.
    pub fn release(&self) -> ReleaseReport {
        let mut report = ReleaseReport::default();

        if self.released.swap(true, Ordering::SeqCst) {
            return report;
        }

        let resources = std::mem::take(
            &mut *self
                .resources
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        for path in resources {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Job {} removed {}", self.job_id, path.display());
                    report.removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => report.missing += 1,
                Err(e) => {
                    warn!(
                        "Job {} failed to remove {}: {}",
                        self.job_id,
                        path.display(),
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        debug!(
            "Job {} released: {} removed, {} missing, {} failed",
            self.job_id, report.removed, report.missing, report.failed
        );
        report
    }
}

impl JobWorkspace {
    /// Releases the workspace on the blocking pool
    pub async fn close(self) -> ReleaseReport {
        let job_id = self.job_id;
        match tokio::task::spawn_blocking(move || self.release()).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Job {} release task failed: {}", job_id, e);
                ReleaseReport::default()
            }
        }
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if !self.is_released() {
            warn!("Job {} workspace dropped before release", self.job_id);
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_names_paths_by_job() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let workspace = JobWorkspace::create(id, dir.path()).await.unwrap();

        let source = workspace.register("source", "mp4");
        assert_eq!(source, dir.path().join(format!("{}-source.mp4", id)));
        assert!(!source.exists());
        assert_eq!(workspace.resources(), vec![source]);
        workspace.release();
    }

    #[tokio::test]
    async fn test_release_removes_written_and_ignores_absent() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = JobWorkspace::create(Uuid::new_v4(), dir.path()).await.unwrap();

        let source = workspace.register("source", "mp4");
        let audio = workspace.register("audio", "mp3");
        let _output = workspace.register("output", "mp4");
        std::fs::write(&source, b"clip").unwrap();
        std::fs::write(&audio, b"song").unwrap();

        let report = workspace.release();
        assert_eq!(
            report,
            ReleaseReport {
                removed: 2,
                missing: 1,
                failed: 0
            }
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_release_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = JobWorkspace::create(Uuid::new_v4(), dir.path()).await.unwrap();
        std::fs::write(workspace.register("source", "mp4"), b"clip").unwrap();

        assert_eq!(workspace.release().removed, 1);
        assert!(workspace.is_released());
        assert_eq!(workspace.release(), ReleaseReport::default());
    }

    #[tokio::test]
    async fn test_drop_releases() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let workspace = JobWorkspace::create(Uuid::new_v4(), dir.path()).await.unwrap();
            let path = workspace.register("output", "mp4");
            std::fs::write(&path, b"partial").unwrap();
            path
        };

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_create_makes_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested").join("work");
        let workspace = JobWorkspace::create(Uuid::new_v4(), &base).await.unwrap();

        assert!(base.is_dir());
        workspace.release();
    }

    #[tokio::test]
    async fn test_close_releases_off_executor() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = JobWorkspace::create(Uuid::new_v4(), dir.path()).await.unwrap();
        let source = workspace.register("source", "mp4");
        std::fs::write(&source, b"clip").unwrap();
        workspace.register("output", "mp4");

        let report = workspace.close().await;
        assert_eq!(
            report,
            ReleaseReport {
                removed: 1,
                missing: 1,
                failed: 0
            }
        );
        assert!(!source.exists());
    }
}
