//! Background music library
//!
//! A read-only directory of audio tracks. Tracks are picked uniformly at
//! random and are never registered with a job, so they are never deleted.

use rand::seq::SliceRandom;
use std::io;
use std::path::{Path, PathBuf};

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "wav", "ogg", "flac", "opus"];

#[derive(Debug, Clone, Default)]
pub struct MusicLibrary {
    dir: Option<PathBuf>,
}

impl MusicLibrary {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn is_configured(&self) -> bool {
        self.dir.is_some()
    }

    /// Audio files in the library, sorted by path
    pub async fn tracks(&self) -> io::Result<Vec<PathBuf>> {
        let Some(dir) = &self.dir else {
            return Ok(Vec::new());
        };

        let mut tracks = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && is_audio(&path) {
                tracks.push(path);
            }
        }

        tracks.sort();
        Ok(tracks)
    }

    /// Picks one track, or `None` when the library is unset or empty
    pub async fn pick(&self) -> io::Result<Option<PathBuf>> {
        let tracks = self.tracks().await?;
        Ok(tracks.choose(&mut rand::thread_rng()).cloned())
    }
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
