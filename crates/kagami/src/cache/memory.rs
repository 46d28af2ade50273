use super::{check_key, CacheStorage};
use crate::error::KagamiResult;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

type Entries = BTreeMap<String, HashMap<String, String>>;

#[derive(Clone, Default)]
pub struct MemoryCacheStorage {
    cache: Arc<Mutex<Entries>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStorage for MemoryCacheStorage {
    async fn read_file(&self, video_id: &str, path: &str) -> KagamiResult<Option<String>> {
        check_key(video_id)?;
        check_key(path)?;

        Ok(self
            .lock()
            .get(video_id)
            .and_then(|files| files.get(path))
            .cloned())
    }

    async fn write_file(&self, video_id: &str, path: &str, content: &str) -> KagamiResult<()> {
        check_key(video_id)?;
        check_key(path)?;

        self.lock()
            .entry(video_id.to_string())
            .or_default()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn delete_all(&self, video_id: &str) -> KagamiResult<()> {
        check_key(video_id)?;

        if self.lock().remove(video_id).is_some() {
            log::debug!("Removed cached files of {video_id}.");
        }
        Ok(())
    }

    async fn list_video_ids(&self) -> KagamiResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}
