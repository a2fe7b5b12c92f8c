//! Video ingestion pipeline
//!
//! validate → authorize → stage → probe → optimize → upload → commit
//!
//! Each stage owns its [`StagedAsset`] until it hands it on or releases it,
//! and dropping an asset deletes its file, so an error or a cancelled request
//! at any point leaves nothing behind in the staging directory. The video
//! record is only written once the object store has confirmed the upload.

use bytes::Bytes;
use futures::Stream;
use std::fmt::Display;
use std::sync::Arc;
use tubely_core::{AppError, VideoRecord};
use tubely_db::VideoStore;
use tubely_processing::{
    ContainerFormat, ContentTypeValidator, MediaProber, StreamOptimizer, TempStagingStore,
};
use tubely_storage::{RemoteObjectKey, Storage};
use uuid::Uuid;

/// Coordinates one video upload from request body to committed URL.
#[derive(Clone)]
pub struct IngestService {
    videos: Arc<dyn VideoStore>,
    storage: Arc<dyn Storage>,
    staging: TempStagingStore,
    prober: MediaProber,
    optimizer: StreamOptimizer,
    validator: ContentTypeValidator,
    max_bytes: u64,
}

impl IngestService {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        storage: Arc<dyn Storage>,
        staging: TempStagingStore,
        prober: MediaProber,
        optimizer: StreamOptimizer,
        validator: ContentTypeValidator,
        max_bytes: u64,
    ) -> Self {
        Self {
            videos,
            storage,
            staging,
            prober,
            optimizer,
            validator,
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Ingest `body` as the video of `video_id` on behalf of `user_id`.
    ///
    /// The content type is checked before anything else, so a rejected type
    /// causes no store lookup and no disk I/O. Failures are never retried.
    #[tracing::instrument(
        skip(self, body),
        fields(video_id = %video_id, user_id = %user_id, content_type = ?content_type)
    )]
    pub async fn ingest<S, E>(
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
        let start = std::time::Instant::now();

        let content_type = self.validator.validate(content_type)?;
        let format = ContainerFormat::from_content_type(&content_type)
            .map_err(|e| AppError::UnsupportedMediaType(e.to_string()))?;

        let video = self
            .videos
            .get(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;
        if !video.is_owned_by(user_id) {
            return Err(AppError::NotOwner("Not the video owner".to_string()));
        }

        let raw = self.staging.stage(body, self.max_bytes).await?;
        let classification = self.prober.probe(raw.path()).await?;
        let optimized = self.optimizer.optimize(&raw, format).await?;
        raw.release();

        let key = RemoteObjectKey::generate(classification, &content_type);
        self.storage
            .upload_file(optimized.path(), key.as_str(), &content_type)
            .await?;
        let size_bytes = optimized.size_bytes();
        optimized.release();

        let video = self
            .videos
            .set_video_url(video.id, user_id, &self.storage.object_url(key.as_str()))
            .await?;

        tracing::info!(
            key = %key,
            classification = %classification,
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video ingested"
        );

        Ok(video)
    }
}
