use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::{DateTime, TimeDelta, Utc};
use kagami::{
    cache::{memory::MemoryCacheStorage, CacheStorage, KagamiCache},
    orchestrator::METADATA_FILE,
    CacheMetadata, CacheOrchestrator, ExpirySweeper, FormatDescriptor, FormatProvider, FormatSet,
    HttpClient, KagamiError, KagamiResult, PlaylistBuilder, SegmentIndexExtractor, SweepReport,
};

const VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Serves a fixed format set and counts how often it was asked.
struct CountingProvider {
    set: Option<FormatSet>,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn new(expires_at: Option<DateTime<Utc>>) -> Arc<Self> {
        let video = FormatDescriptor {
            width: Some(1280),
            height: Some(720),
            approx_duration_ms: Some(9_500),
            ..FormatDescriptor::new(
                136,
                r#"video/mp4; codecs="avc1.64001f""#,
                1_000_000,
                "https://media.example.com/136".parse().unwrap(),
            )
        };
        let audio = FormatDescriptor {
            language: Some("en".to_string()),
            ..FormatDescriptor::new(
                140,
                r#"audio/mp4; codecs="mp4a.40.2""#,
                130_000,
                "https://media.example.com/140".parse().unwrap(),
            )
        };

        Arc::new(Self {
            set: Some(FormatSet {
                formats: vec![video, audio],
                expires_at,
                chapters: vec![],
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            set: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FormatProvider for CountingProvider {
    async fn fetch_formats(&self, video_id: &str) -> KagamiResult<FormatSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.set
            .clone()
            .ok_or_else(|| KagamiError::Provider(format!("{video_id} is unavailable")))
    }
}

fn orchestrator<S>(
    storage: S,
    provider: Arc<CountingProvider>,
) -> CacheOrchestrator<S, Arc<CountingProvider>, SegmentIndexExtractor>
where
    S: CacheStorage,
{
    let builder = PlaylistBuilder::new(SegmentIndexExtractor::new(HttpClient::default()));
    CacheOrchestrator::new(storage, provider, builder)
}

async fn store_metadata(storage: &impl CacheStorage, video_id: &str, expires: DateTime<Utc>) {
    let metadata = serde_json::to_string(&CacheMetadata::new(expires)).unwrap();
    storage
        .write_file(video_id, METADATA_FILE, &metadata)
        .await
        .unwrap();
}

#[tokio::test]
async fn fresh_entry_is_served_from_cache() -> anyhow::Result<()> {
    let storage = MemoryCacheStorage::new();
    let now = Utc::now();
    store_metadata(&storage, VIDEO_ID, now + TimeDelta::milliseconds(1_800_001)).await;
    storage
        .write_file(VIDEO_ID, "master.m3u8", "#EXTM3U\ncached")
        .await?;

    let provider = CountingProvider::new(Some(now + TimeDelta::hours(6)));
    let orchestrator = orchestrator(storage, provider.clone());

    let master = orchestrator.fetch_at(VIDEO_ID, "master.m3u8", now).await?;
    assert_eq!(master.as_deref(), Some("#EXTM3U\ncached"));
    assert_eq!(provider.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn stale_entry_is_regenerated() -> anyhow::Result<()> {
    let storage = MemoryCacheStorage::new();
    let now = Utc::now();
    store_metadata(&storage, VIDEO_ID, now + TimeDelta::milliseconds(1_799_999)).await;
    storage
        .write_file(VIDEO_ID, "master.m3u8", "#EXTM3U\ncached")
        .await?;
    storage.write_file(VIDEO_ID, "v-999.m3u8", "#EXTM3U").await?;

    let expires_at = now + TimeDelta::hours(6);
    let provider = CountingProvider::new(Some(expires_at));
    let orchestrator = orchestrator(storage.clone(), provider.clone());

    let master = orchestrator
        .fetch_at(VIDEO_ID, "master.m3u8", now)
        .await?
        .expect("master playlist");
    assert!(master.starts_with("#EXTM3U"));
    assert!(master.contains("#EXT-X-STREAM-INF"));
    assert_eq!(provider.calls(), 1);

    assert_eq!(storage.read_file(VIDEO_ID, "v-999.m3u8").await?, None);
    assert_eq!(
        storage.read_file(VIDEO_ID, "master.m3u8").await?.as_deref(),
        Some(master.as_str())
    );
    let metadata: CacheMetadata = serde_json::from_str(
        &storage
            .read_file(VIDEO_ID, METADATA_FILE)
            .await?
            .expect("metadata"),
    )?;
    assert_eq!(metadata.expires, expires_at.timestamp_millis());

    // Served from the cache from now on.
    let audio = orchestrator.fetch_at(VIDEO_ID, "140.m3u8", now).await?;
    assert!(audio.is_some_and(|playlist| playlist.ends_with("#EXT-X-ENDLIST")));
    assert_eq!(provider.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn fresh_entry_missing_file_is_replaced() -> anyhow::Result<()> {
    let storage = MemoryCacheStorage::new();
    let now = Utc::now();
    store_metadata(&storage, VIDEO_ID, now + TimeDelta::hours(2)).await;
    storage
        .write_file(VIDEO_ID, "master.m3u8", "#EXTM3U\nv-999.m3u8")
        .await?;
    storage.write_file(VIDEO_ID, "v-999.m3u8", "#EXTM3U").await?;

    let provider = CountingProvider::new(Some(now + TimeDelta::hours(6)));
    let orchestrator = orchestrator(storage.clone(), provider.clone());

    let video = orchestrator.fetch_at(VIDEO_ID, "v-136.m3u8", now).await?;
    assert!(video.is_some());
    assert_eq!(provider.calls(), 1);
    assert_eq!(storage.read_file(VIDEO_ID, "v-999.m3u8").await?, None);
    let master = storage
        .read_file(VIDEO_ID, "master.m3u8")
        .await?
        .expect("master playlist");
    assert!(master.contains("v-136.m3u8"));
    assert!(!master.contains("v-999.m3u8"));

    Ok(())
}

#[tokio::test]
async fn unknown_file_is_none() -> anyhow::Result<()> {
    let storage = MemoryCacheStorage::new();
    let provider = CountingProvider::new(Some(Utc::now() + TimeDelta::hours(6)));
    let orchestrator = orchestrator(storage.clone(), provider.clone());

    assert_eq!(orchestrator.fetch(VIDEO_ID, "v-1.m3u8").await?, None);
    assert_eq!(provider.calls(), 1);
    assert!(storage.read_file(VIDEO_ID, "master.m3u8").await?.is_some());
    assert!(storage.read_file(VIDEO_ID, "v-136.m3u8").await?.is_some());

    Ok(())
}

#[tokio::test]
async fn provider_failure_persists_nothing() -> anyhow::Result<()> {
    let storage = MemoryCacheStorage::new();
    let provider = CountingProvider::failing();
    let orchestrator = orchestrator(storage.clone(), provider.clone());

    let result = orchestrator.fetch(VIDEO_ID, "master.m3u8").await;
    assert!(matches!(result, Err(KagamiError::Provider(_))));
    assert_eq!(provider.calls(), 1);
    assert!(storage.list_video_ids().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn missing_expiry_is_never_fresh() -> anyhow::Result<()> {
    let storage = MemoryCacheStorage::new();
    let provider = CountingProvider::new(None);
    let orchestrator = orchestrator(storage.clone(), provider.clone());

    orchestrator.fetch(VIDEO_ID, "master.m3u8").await?;
    assert_eq!(storage.read_file(VIDEO_ID, METADATA_FILE).await?, None);
    orchestrator.fetch(VIDEO_ID, "master.m3u8").await?;
    assert_eq!(provider.calls(), 2);

    Ok(())
}

#[tokio::test]
async fn file_cache_end_to_end() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let provider = CountingProvider::new(Some(Utc::now() + TimeDelta::hours(6)));
    let orchestrator = orchestrator(KagamiCache::file(dir.path()), provider.clone());

    let first = orchestrator.fetch(VIDEO_ID, "master.m3u8").await?;
    let second = orchestrator.fetch(VIDEO_ID, "master.m3u8").await?;
    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(provider.calls(), 1);

    let video_dir = dir.path().join(VIDEO_ID);
    for file in ["master.m3u8", "v-136.m3u8", "140.m3u8", METADATA_FILE] {
        assert!(video_dir.join(file).is_file(), "{file} should exist");
    }

    orchestrator.invalidate(VIDEO_ID).await?;
    assert!(!video_dir.exists());

    Ok(())
}

#[tokio::test]
async fn invalid_video_id_is_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let provider = CountingProvider::new(Some(Utc::now() + TimeDelta::hours(6)));
    let orchestrator = orchestrator(KagamiCache::file(dir.path()), provider.clone());

    let result = orchestrator.fetch("../escape", "master.m3u8").await;
    assert!(matches!(result, Err(KagamiError::InvalidCacheKey(_))));
    assert_eq!(provider.calls(), 0);

    Ok(())
}

/// Memory storage refusing to delete one video.
#[derive(Clone, Default)]
struct StubbornStorage {
    inner: MemoryCacheStorage,
}

impl CacheStorage for StubbornStorage {
    async fn read_file(&self, video_id: &str, path: &str) -> KagamiResult<Option<String>> {
        self.inner.read_file(video_id, path).await
    }

    async fn write_file(&self, video_id: &str, path: &str, content: &str) -> KagamiResult<()> {
        self.inner.write_file(video_id, path, content).await
    }

    async fn delete_all(&self, video_id: &str) -> KagamiResult<()> {
        if video_id == "locked" {
            return Err(std::io::Error::other("permission denied").into());
        }
        self.inner.delete_all(video_id).await
    }

    async fn list_video_ids(&self) -> KagamiResult<Vec<String>> {
        self.inner.list_video_ids().await
    }
}

#[tokio::test]
async fn sweep_continues_after_failure() -> anyhow::Result<()> {
    let storage = StubbornStorage::default();
    let now = Utc::now();
    store_metadata(&storage, "locked", now - TimeDelta::minutes(1)).await;
    store_metadata(&storage, "expired", now - TimeDelta::minutes(1)).await;
    store_metadata(&storage, "fresh", now + TimeDelta::hours(1)).await;

    let report = ExpirySweeper::new(storage.clone()).sweep_at(now).await?;
    assert_eq!(
        report,
        SweepReport {
            deleted: 1,
            kept: 1,
            failed: 1
        }
    );
    assert_eq!(storage.list_video_ids().await?, vec!["fresh", "locked"]);

    Ok(())
}
