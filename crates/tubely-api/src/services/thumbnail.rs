//! Thumbnail uploads
//!
//! Thumbnails are small, so the body is buffered in memory (up to the
//! configured ceiling) and handed to the configured [`ThumbnailStore`].

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use tubely_core::{AppError, VideoRecord};
use tubely_db::VideoStore;
use tubely_processing::ContentTypeValidator;
use tubely_storage::{CachedThumbnail, ThumbnailStore};
use uuid::Uuid;

#[derive(Clone)]
pub struct ThumbnailService {
    videos: Arc<dyn VideoStore>,
    store: Arc<dyn ThumbnailStore>,
    validator: ContentTypeValidator,
    max_bytes: u64,
}

impl ThumbnailService {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        store: Arc<dyn ThumbnailStore>,
        validator: ContentTypeValidator,
        max_bytes: u64,
    ) -> Self {
        Self {
            videos,
            store,
            validator,
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    #[tracing::instrument(
        skip(self, body),
        fields(video_id = %video_id, user_id = %user_id, backend = %self.store.backend_type())
    )]
    pub async fn upload<S, E>(
        &self,
        user_id: Uuid,
        video_id: Uuid,
        content_type: Option<&str>,
        body: S,
    ) -> Result<VideoRecord, AppError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let content_type = self.validator.validate(content_type)?;

        let video = self
            .videos
            .get(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;
        if !video.is_owned_by(user_id) {
            return Err(AppError::NotOwner("Not the video owner".to_string()));
        }

        let data = read_limited(body, self.max_bytes).await?;
        let size_bytes = data.len();
        let locator = self.store.persist(video_id, data, &content_type).await?;

        let previous = video.thumbnail_url;
        let video = self
            .videos
            .set_thumbnail_url(video_id, user_id, &locator)
            .await?;

        if let Some(previous) = previous.filter(|p| *p != locator) {
            if let Err(e) = self.store.discard(&previous).await {
                tracing::warn!(error = %e, locator = %previous, "Failed to discard replaced thumbnail");
            }
        }

        tracing::info!(size_bytes = size_bytes, "Thumbnail stored");
        Ok(video)
    }

    /// Bytes for backends that serve thumbnails themselves.
    pub async fn fetch(&self, video_id: Uuid) -> Result<CachedThumbnail, AppError> {
        self.store
            .fetch(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No thumbnail for video {}", video_id)))
    }
}

/// Collect `body`, failing as soon as it grows past `max_bytes`.
async fn read_limited<S, E>(body: S, max_bytes: u64) -> Result<Bytes, AppError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut body = std::pin::pin!(body);
    let mut buf = BytesMut::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload body: {}", e)))?;
        if (buf.len() + chunk.len()) as u64 > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds maximum size of {} bytes",
                max_bytes
            )));
        }
        buf.extend_from_slice(&chunk);
    }

    if buf.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }
    Ok(buf.freeze())
}
