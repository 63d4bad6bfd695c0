//! Published render store
//!
//! Holds renders returned by URL. Entries expire after the retention window
//! and are removed by a background sweeper; this is a hand-off area, not
//! persistent storage.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A render moved into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRender {
    pub file_name: String,
    pub bytes: u64,
}

#[derive(Debug)]
pub struct RenderStore {
    dir: PathBuf,
    retention: Duration,
}

impl RenderStore {
    /// Opens the store, creating its directory if needed
    pub fn new(dir: PathBuf, retention: Duration) -> io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, retention })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Moves `source` into the store under the job's id
    ///
    /// Falls back to copy and delete when a rename is not possible, e.g.
    /// across filesystems. `source` no longer exists on success.
    pub async fn publish(&self, source: &Path, job_id: Uuid) -> io::Result<PublishedRender> {
        let file_name = format!("{}.mp4", job_id);
        let dest = self.dir.join(&file_name);

        if let Err(e) = tokio::fs::rename(source, &dest).await {
            debug!("Rename into store failed ({}), copying instead", e);

            if let Err(e) = tokio::fs::copy(source, &dest).await {
                let _ = tokio::fs::remove_file(&dest).await;
                return Err(e);
            }
            tokio::fs::remove_file(source).await?;
        }

        let bytes = tokio::fs::metadata(&dest).await?.len();
        info!("Published {} ({} bytes)", file_name, bytes);

        Ok(PublishedRender { file_name, bytes })
    }

    /// Deletes renders older than the retention window
    pub async fn sweep(&self) -> io::Result<usize> {
        let now = SystemTime::now();
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();

            if age >= self.retention {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("Failed to expire {}: {}", entry.path().display(), e),
                }
            }
        }

        if removed > 0 {
            info!("Expired {} published renders", removed);
        }
        Ok(removed)
    }

    /// Sweeps every `interval` until the runtime shuts down
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep().await {
                    warn!("Render sweep failed: {}", e);
                }
            }
        })
    }
}
