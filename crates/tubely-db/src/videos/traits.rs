use async_trait::async_trait;
use tubely_core::{AppError, VideoRecord};
use uuid::Uuid;

/// Persistence for [`VideoRecord`]s.
///
/// Locator commits are single-field, single-record writes. A commit never
/// rewrites fields it does not own, so a thumbnail committed while a video is
/// being ingested survives, and concurrent commits of the same field resolve
/// to whichever lands last.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn create(&self, video: &VideoRecord) -> Result<VideoRecord, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    /// Videos owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError>;

    /// Point the record at its stored video. Only `video_url` and
    /// `updated_at` change. Fails with `NotFound` when no record with this
    /// id and owner exists.
    async fn set_video_url(
        &self,
        id: Uuid,
        user_id: Uuid,
        video_url: &str,
    ) -> Result<VideoRecord, AppError>;

    /// Like [`VideoStore::set_video_url`], for `thumbnail_url`.
    async fn set_thumbnail_url(
        &self,
        id: Uuid,
        user_id: Uuid,
        thumbnail_url: &str,
    ) -> Result<VideoRecord, AppError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
