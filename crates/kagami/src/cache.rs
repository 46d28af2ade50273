pub mod file;
pub mod memory;
#[cfg(feature = "opendal")]
pub mod opendal;

use crate::error::{KagamiError, KagamiResult};
use std::{future::Future, path::PathBuf, sync::Arc};

/// Per-video file storage for generated playlist bundles.
///
/// Every video id owns a flat namespace of files, eg. `master.m3u8`,
/// `v-137.m3u8` or `metadata.json`.
pub trait CacheStorage: Send + Sync + 'static {
    /// Read a file of a video. Returns `None` if it does not exist.
    fn read_file(
        &self,
        video_id: &str,
        path: &str,
    ) -> impl Future<Output = KagamiResult<Option<String>>> + Send;

    /// Create or replace a file of a video.
    fn write_file(
        &self,
        video_id: &str,
        path: &str,
        content: &str,
    ) -> impl Future<Output = KagamiResult<()>> + Send;

    /// Remove every file of a video. Missing entries are not an error.
    fn delete_all(&self, video_id: &str) -> impl Future<Output = KagamiResult<()>> + Send;

    /// All video ids with at least one stored file.
    fn list_video_ids(&self) -> impl Future<Output = KagamiResult<Vec<String>>> + Send;

    /// Hint a location for the cached files.
    fn location_hint(&self) -> Option<String> {
        None
    }
}

impl<C> CacheStorage for Arc<C>
where
    C: CacheStorage,
{
    fn read_file(
        &self,
        video_id: &str,
        path: &str,
    ) -> impl Future<Output = KagamiResult<Option<String>>> + Send {
        self.as_ref().read_file(video_id, path)
    }

    fn write_file(
        &self,
        video_id: &str,
        path: &str,
        content: &str,
    ) -> impl Future<Output = KagamiResult<()>> + Send {
        self.as_ref().write_file(video_id, path, content)
    }

    fn delete_all(&self, video_id: &str) -> impl Future<Output = KagamiResult<()>> + Send {
        self.as_ref().delete_all(video_id)
    }

    fn list_video_ids(&self) -> impl Future<Output = KagamiResult<Vec<String>>> + Send {
        self.as_ref().list_video_ids()
    }

    fn location_hint(&self) -> Option<String> {
        self.as_ref().location_hint()
    }
}

/// Video ids and file names become path components, only plain names are allowed.
pub(crate) fn check_key(key: &str) -> KagamiResult<()> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\', '\0']) {
        return Err(KagamiError::InvalidCacheKey(key.to_string()));
    }
    Ok(())
}

pub enum KagamiCache {
    Memory(memory::MemoryCacheStorage),
    File(file::FileCacheStorage),
    #[cfg(feature = "opendal")]
    Opendal(opendal::OpendalCacheStorage),
}

impl KagamiCache {
    pub fn memory() -> Self {
        Self::Memory(memory::MemoryCacheStorage::new())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(file::FileCacheStorage::new(path.into()))
    }

    #[cfg(feature = "opendal")]
    pub fn opendal(operator: opendal::Operator, prefix: impl Into<String>) -> Self {
        Self::Opendal(opendal::OpendalCacheStorage::new(operator, prefix))
    }
}

impl CacheStorage for KagamiCache {
    async fn read_file(&self, video_id: &str, path: &str) -> KagamiResult<Option<String>> {
        match self {
            KagamiCache::Memory(cache) => cache.read_file(video_id, path).await,
            KagamiCache::File(cache) => cache.read_file(video_id, path).await,
            #[cfg(feature = "opendal")]
            KagamiCache::Opendal(cache) => cache.read_file(video_id, path).await,
        }
    }

    async fn write_file(&self, video_id: &str, path: &str, content: &str) -> KagamiResult<()> {
        match self {
            KagamiCache::Memory(cache) => cache.write_file(video_id, path, content).await,
            KagamiCache::File(cache) => cache.write_file(video_id, path, content).await,
            #[cfg(feature = "opendal")]
            KagamiCache::Opendal(cache) => cache.write_file(video_id, path, content).await,
        }
    }

    async fn delete_all(&self, video_id: &str) -> KagamiResult<()> {
        match self {
            KagamiCache::Memory(cache) => cache.delete_all(video_id).await,
            KagamiCache::File(cache) => cache.delete_all(video_id).await,
            #[cfg(feature = "opendal")]
            KagamiCache::Opendal(cache) => cache.delete_all(video_id).await,
        }
    }

    async fn list_video_ids(&self) -> KagamiResult<Vec<String>> {
        match self {
            KagamiCache::Memory(cache) => cache.list_video_ids().await,
            KagamiCache::File(cache) => cache.list_video_ids().await,
            #[cfg(feature = "opendal")]
            KagamiCache::Opendal(cache) => cache.list_video_ids().await,
        }
    }

    fn location_hint(&self) -> Option<String> {
        match self {
            KagamiCache::Memory(cache) => cache.location_hint(),
            KagamiCache::File(cache) => cache.location_hint(),
            #[cfg(feature = "opendal")]
            KagamiCache::Opendal(cache) => cache.location_hint(),
        }
    }
}
