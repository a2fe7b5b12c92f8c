use super::ThumbnailStore;
use crate::traits::StorageResult;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use tubely_core::ThumbnailBackend;
use uuid::Uuid;

/// Inlines thumbnail bytes into the locator itself.
#[derive(Clone, Default)]
pub struct DataUrlThumbnailStore;

impl DataUrlThumbnailStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ThumbnailStore for DataUrlThumbnailStore {
    async fn persist(
        &self,
        _video_id: Uuid,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        Ok(format!("data:{};base64,{}", content_type, STANDARD.encode(&data)))
    }

    fn backend_type(&self) -> ThumbnailBackend {
        ThumbnailBackend::DataUrl
    }
}
