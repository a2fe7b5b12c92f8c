use super::{CachedThumbnail, ThumbnailStore};
use crate::traits::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tubely_core::ThumbnailBackend;
use uuid::Uuid;

/// Bounded in-process thumbnail cache.
///
/// Holds at most `capacity` thumbnails and evicts the least recently used.
/// Contents are lost on restart; an evicted thumbnail's locator returns 404.
#[derive(Clone)]
pub struct CacheThumbnailStore {
    entries: Arc<Mutex<LruCache<Uuid, CachedThumbnail>>>,
    public_base_url: String,
}

impl CacheThumbnailStore {
    pub fn new(capacity: usize, public_base_url: &str) -> StorageResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            StorageError::ConfigError("Thumbnail cache capacity must be greater than 0".to_string())
        })?;
        Ok(Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl ThumbnailStore for CacheThumbnailStore {
    async fn persist(
        &self,
        video_id: Uuid,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        let evicted = self.entries.lock().await.push(
            video_id,
            CachedThumbnail {
                data,
                content_type: content_type.to_string(),
            },
        );
        if let Some((evicted_id, _)) = evicted.filter(|(id, _)| *id != video_id) {
            tracing::debug!(evicted_video_id = %evicted_id, "Thumbnail evicted from cache");
        }

        Ok(format!(
            "{}/api/thumbnails/{}",
            self.public_base_url, video_id
        ))
    }

    async fn fetch(&self, video_id: Uuid) -> StorageResult<Option<CachedThumbnail>> {
        Ok(self.entries.lock().await.get(&video_id).cloned())
    }

    fn backend_type(&self) -> ThumbnailBackend {
        ThumbnailBackend::Cache
    }
}
