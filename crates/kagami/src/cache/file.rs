use super::{check_key, CacheStorage};
use crate::error::KagamiResult;
use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

static TMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Stores every video in its own directory below `cache_dir`.
pub struct FileCacheStorage {
    cache_dir: PathBuf,
}

impl FileCacheStorage {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn video_dir(&self, video_id: &str) -> KagamiResult<PathBuf> {
        check_key(video_id)?;
        Ok(self.cache_dir.join(video_id))
    }

    fn file_path(&self, video_id: &str, path: &str) -> KagamiResult<PathBuf> {
        check_key(path)?;
        Ok(self.video_dir(video_id)?.join(path))
    }
}

impl CacheStorage for FileCacheStorage {
    async fn read_file(&self, video_id: &str, path: &str) -> KagamiResult<Option<String>> {
        let path = self.file_path(video_id, path)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, video_id: &str, path: &str, content: &str) -> KagamiResult<()> {
        let target = self.file_path(video_id, path)?;
        let video_dir = self.video_dir(video_id)?;
        if !video_dir.exists() {
            tokio::fs::create_dir_all(&video_dir).await?;
        }

        // readers must never observe a half written playlist
        let sequence = TMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let tmp = video_dir.join(format!(".{path}.{sequence}.tmp"));
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &target).await?;
        Ok(())
    }

    async fn delete_all(&self, video_id: &str) -> KagamiResult<()> {
        let video_dir = self.video_dir(video_id)?;
        match tokio::fs::remove_dir_all(&video_dir).await {
            Ok(()) => {
                log::debug!("Removed {}", video_dir.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_video_ids(&self) -> KagamiResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut video_ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => video_ids.push(name),
                Err(name) => log::warn!("Ignoring non UTF-8 cache entry {name:?}"),
            }
        }
        video_ids.sort();
        Ok(video_ids)
    }

    fn location_hint(&self) -> Option<String> {
        Some(self.cache_dir.display().to_string())
    }
}
