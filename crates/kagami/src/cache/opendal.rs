use super::{check_key, CacheStorage};
use crate::error::KagamiResult;

pub use opendal::*;

/// Stores every video below `<prefix>/<video_id>/` of an opendal operator.
pub struct OpendalCacheStorage {
    operator: Operator,
    prefix: String,
}

impl OpendalCacheStorage {
    pub fn new(operator: Operator, prefix: impl Into<String>) -> Self {
        Self {
            operator,
            prefix: prefix.into(),
        }
    }

    fn video_key(&self, video_id: &str) -> KagamiResult<String> {
        check_key(video_id)?;
        let prefix = self.prefix.trim_end_matches('/');
        Ok(format!("{prefix}/{video_id}/"))
    }

    fn file_key(&self, video_id: &str, path: &str) -> KagamiResult<String> {
        check_key(path)?;
        Ok(format!("{}{path}", self.video_key(video_id)?))
    }
}

impl CacheStorage for OpendalCacheStorage {
    async fn read_file(&self, video_id: &str, path: &str) -> KagamiResult<Option<String>> {
        let key = self.file_key(video_id, path)?;
        match self.operator.read(&key).await {
            Ok(buffer) => Ok(Some(String::from_utf8_lossy(&buffer.to_vec()).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, video_id: &str, path: &str, content: &str) -> KagamiResult<()> {
        let key = self.file_key(video_id, path)?;
        self.operator.write(&key, content.to_string()).await?;
        Ok(())
    }

    async fn delete_all(&self, video_id: &str) -> KagamiResult<()> {
        let key = self.video_key(video_id)?;
        self.operator.remove_all(&key).await?;
        tracing::debug!("Removed {key}");
        Ok(())
    }

    async fn list_video_ids(&self) -> KagamiResult<Vec<String>> {
        let prefix = format!("{}/", self.prefix.trim_end_matches('/'));
        let entries = match self.operator.list(&prefix).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut video_ids: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.metadata().is_dir() && entry.path() != prefix)
            .map(|entry| entry.name().trim_end_matches('/').to_string())
            .filter(|name| !name.is_empty())
            .collect();
        video_ids.sort();
        Ok(video_ids)
    }

    fn location_hint(&self) -> Option<String> {
        Some(self.prefix.clone())
    }
}
