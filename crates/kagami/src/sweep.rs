use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;

use crate::{cache::CacheStorage, error::KagamiResult, orchestrator::read_metadata};

#[derive(Debug, Clone, Default)]
pub struct SweepConfig {
    /// Entries expiring within this margin are purged as well.
    pub margin: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: usize,
    pub kept: usize,
    pub failed: usize,
}

/// Purges cached videos whose metadata says they have expired.
///
/// Entries without metadata are left alone, they are only ever removed by
/// the orchestrator when requested.
pub struct ExpirySweeper<S> {
    storage: S,
    config: SweepConfig,
}

impl<S> ExpirySweeper<S>
where
    S: CacheStorage,
{
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, SweepConfig::default())
    }

    pub fn with_config(storage: S, config: SweepConfig) -> Self {
        Self { storage, config }
    }

    pub async fn sweep(&self) -> KagamiResult<SweepReport> {
        self.sweep_at(Utc::now()).await
    }

    /// Check every cached video concurrently. Failing ids are counted and
    /// logged, they never abort the sweep.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> KagamiResult<SweepReport> {
        let video_ids = self.storage.list_video_ids().await?;
        let results = join_all(video_ids.iter().map(|id| self.sweep_one(id, now))).await;

        let mut report = SweepReport::default();
        for (video_id, result) in video_ids.iter().zip(results) {
            match result {
                Ok(true) => report.deleted += 1,
                Ok(false) => report.kept += 1,
                Err(error) => {
                    tracing::warn!("Failed to sweep {video_id}: {error}");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Sweep finished: {} deleted, {} kept, {} failed.",
            report.deleted,
            report.kept,
            report.failed
        );
        Ok(report)
    }

    async fn sweep_one(&self, video_id: &str, now: DateTime<Utc>) -> KagamiResult<bool> {
        let Some(metadata) = read_metadata(&self.storage, video_id).await? else {
            return Ok(false);
        };
        if metadata.is_fresh_at(now, self.config.margin) {
            return Ok(false);
        }

        tracing::debug!("Deleting expired cache of {video_id}.");
        self.storage.delete_all(video_id).await?;
        Ok(true)
    }

    /// Sweep every `interval`, forever. The first sweep runs immediately.
    pub async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(error) = self.sweep().await {
                tracing::error!("Sweep failed: {error}");
            }
        }
    }
}
