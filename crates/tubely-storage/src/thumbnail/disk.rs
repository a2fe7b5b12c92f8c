use super::ThumbnailStore;
use crate::keys::{extension_for_content_type, random_token};
use crate::traits::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tubely_core::ThumbnailBackend;
use uuid::Uuid;

/// Writes thumbnails as files under the assets root.
///
/// Files get random names so a replaced thumbnail never serves stale bytes
/// from an HTTP cache.
#[derive(Clone)]
pub struct DiskThumbnailStore {
    assets_root: PathBuf,
    public_base_url: String,
}

impl DiskThumbnailStore {
    pub async fn new(assets_root: impl Into<PathBuf>, public_base_url: &str) -> StorageResult<Self> {
        let assets_root = assets_root.into();
        fs::create_dir_all(&assets_root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create assets directory {}: {}",
                assets_root.display(),
                e
            ))
        })?;
        Ok(Self {
            assets_root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    /// File name under the assets root for a locator this store produced.
    fn owned_file_name<'a>(&self, locator: &'a str) -> Option<&'a str> {
        let file_name = locator
            .strip_prefix(self.public_base_url.as_str())?
            .strip_prefix("/assets/")?;
        let plain = !file_name.is_empty()
            && !file_name.contains(['/', '\\'])
            && !file_name.starts_with('.');
        plain.then_some(file_name)
    }
}

#[async_trait]
impl ThumbnailStore for DiskThumbnailStore {
    async fn persist(
        &self,
        video_id: Uuid,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        let file_name = format!(
            "{}.{}",
            random_token(),
            extension_for_content_type(content_type)
        );
        fs::write(self.assets_root.join(&file_name), &data).await?;

        tracing::debug!(
            video_id = %video_id,
            file_name = %file_name,
            size_bytes = data.len(),
            "Thumbnail written to disk"
        );

        Ok(format!("{}/assets/{}", self.public_base_url, file_name))
    }

    async fn discard(&self, locator: &str) -> StorageResult<()> {
        let Some(file_name) = self.owned_file_name(locator) else {
            return Ok(());
        };
        match fs::remove_file(self.assets_root.join(file_name)).await {
            Ok(()) => {
                tracing::debug!(file_name = %file_name, "Replaced thumbnail removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_type(&self) -> ThumbnailBackend {
        ThumbnailBackend::Disk
    }
}
