use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::{
    cache::CacheStorage,
    error::KagamiResult,
    index::SegmentIndex,
    playlist::{PlaylistBuilder, PlaylistBundle, MASTER_PLAYLIST},
    provider::FormatProvider,
};

pub const METADATA_FILE: &str = "metadata.json";

/// Cached bundles are considered stale this long before the media URLs expire.
pub const DEFAULT_GRACE_MARGIN: Duration = Duration::from_secs(30 * 60);

/// Content of `metadata.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Epoch milliseconds.
    pub expires: i64,
}

impl CacheMetadata {
    pub fn new(expires: DateTime<Utc>) -> Self {
        Self {
            expires: expires.timestamp_millis(),
        }
    }

    /// Whether the entry stays valid for strictly longer than `margin` after `now`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        let margin = i64::try_from(margin.as_millis()).unwrap_or(i64::MAX);
        self.expires.saturating_sub(now.timestamp_millis()) > margin
    }
}

/// Read and decode the metadata of a video.
///
/// Undecodable metadata is reported as missing.
pub(crate) async fn read_metadata<S>(storage: &S, video_id: &str) -> KagamiResult<Option<CacheMetadata>>
where
    S: CacheStorage,
{
    let Some(data) = storage.read_file(video_id, METADATA_FILE).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&data) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(error) => {
            tracing::warn!("Invalid {METADATA_FILE} of {video_id}: {error}");
            Ok(None)
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub grace_margin: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            grace_margin: DEFAULT_GRACE_MARGIN,
        }
    }
}

/// Serves playlist files from the cache, regenerating stale bundles on demand.
///
/// Concurrent requests for the same stale video each regenerate it, the last
/// writer wins.
pub struct CacheOrchestrator<S, P, I> {
    storage: S,
    provider: P,
    builder: PlaylistBuilder<I>,
    config: OrchestratorConfig,
}

impl<S, P, I> CacheOrchestrator<S, P, I>
where
    S: CacheStorage,
    P: FormatProvider,
    I: SegmentIndex,
{
    pub fn new(storage: S, provider: P, builder: PlaylistBuilder<I>) -> Self {
        Self::with_config(storage, provider, builder, OrchestratorConfig::default())
    }

    pub fn with_config(
        storage: S,
        provider: P,
        builder: PlaylistBuilder<I>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            storage,
            provider,
            builder,
            config,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get `path` of `video_id`. `Ok(None)` means the bundle has no such file.
    pub async fn fetch(&self, video_id: &str, path: &str) -> KagamiResult<Option<String>> {
        self.fetch_at(video_id, path, Utc::now()).await
    }

    pub async fn fetch_at(
        &self,
        video_id: &str,
        path: &str,
        now: DateTime<Utc>,
    ) -> KagamiResult<Option<String>> {
        let metadata = read_metadata(&self.storage, video_id).await?;
        if metadata.is_some_and(|metadata| metadata.is_fresh_at(now, self.config.grace_margin)) {
            tracing::debug!("Trying to get local cache of {video_id}/{path}");
            if let Some(data) = self.storage.read_file(video_id, path).await? {
                return Ok(Some(data));
            }
            tracing::info!("{path} is not cached for {video_id}, regenerating.");
        }

        // files of the previous generation must not outlive it
        tracing::info!("Deleting old data of {video_id}.");
        self.storage.delete_all(video_id).await?;

        let bundle = self.regenerate(video_id).await?;
        Ok(bundle.file(path).map(str::to_string))
    }

    /// Build a fresh bundle for `video_id` and persist it.
    pub async fn regenerate(&self, video_id: &str) -> KagamiResult<PlaylistBundle> {
        let formats = self.provider.fetch_formats(video_id).await.inspect_err(|error| {
            tracing::error!("Error while fetching formats of {video_id}: {error}");
        })?;
        let bundle = self.builder.build(&formats).await?;
        self.persist(video_id, &bundle).await?;
        Ok(bundle)
    }

    /// Sub-files first, then the master playlist, then the metadata. An
    /// interrupted write therefore never leaves a fresh-looking entry behind.
    async fn persist(&self, video_id: &str, bundle: &PlaylistBundle) -> KagamiResult<()> {
        try_join_all(
            bundle
                .sub_files
                .iter()
                .map(|(name, content)| self.storage.write_file(video_id, name, content)),
        )
        .await?;
        self.storage
            .write_file(video_id, MASTER_PLAYLIST, &bundle.master)
            .await?;

        if let Some(expires_at) = bundle.expires_at {
            let metadata = serde_json::to_string(&CacheMetadata::new(expires_at))?;
            self.storage
                .write_file(video_id, METADATA_FILE, &metadata)
                .await?;
        }

        tracing::info!(
            "Saved {} file(s) of {video_id} to {}",
            bundle.sub_files.len() + 1,
            self.storage.location_hint().unwrap_or_else(|| "cache".to_string())
        );
        Ok(())
    }

    /// Drop everything cached for `video_id`.
    pub async fn invalidate(&self, video_id: &str) -> KagamiResult<()> {
        self.storage.delete_all(video_id).await
    }
}
