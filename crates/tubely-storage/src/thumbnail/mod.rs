//! Thumbnail persistence
//!
//! A deployment picks exactly one backend; handlers only see
//! [`ThumbnailStore`].

mod cache;
mod data_url;
mod disk;

pub use cache::CacheThumbnailStore;
pub use data_url::DataUrlThumbnailStore;
pub use disk::DiskThumbnailStore;

use crate::traits::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use tubely_core::ThumbnailBackend;
use uuid::Uuid;

/// Thumbnail bytes held by a backend that serves them itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedThumbnail {
    pub data: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait ThumbnailStore: Send + Sync {
    /// Persist a thumbnail for `video_id` and return the locator to record.
    async fn persist(&self, video_id: Uuid, data: Bytes, content_type: &str)
        -> StorageResult<String>;

    /// Bytes for `video_id` when this backend serves thumbnails itself.
    async fn fetch(&self, _video_id: Uuid) -> StorageResult<Option<CachedThumbnail>> {
        Ok(None)
    }

    /// Drop a thumbnail that is no longer referenced. Locators this backend
    /// did not produce, or does not hold separately, are ignored.
    async fn discard(&self, _locator: &str) -> StorageResult<()> {
        Ok(())
    }

    fn backend_type(&self) -> ThumbnailBackend;
}
