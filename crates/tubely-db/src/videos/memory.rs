use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tubely_core::{AppError, VideoRecord};
use uuid::Uuid;

use super::traits::VideoStore;

/// Process-local video store.
///
/// Records do not survive a restart. Used when `DATABASE_URL` is unset and
/// by the test suites.
#[derive(Clone, Default)]
pub struct MemoryVideoStore {
    videos: Arc<RwLock<HashMap<Uuid, VideoRecord>>>,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `change` to the owned record under the write lock.
    async fn modify(
        &self,
        id: Uuid,
        user_id: Uuid,
        change: impl FnOnce(&mut VideoRecord),
    ) -> Result<VideoRecord, AppError> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(&id) {
            Some(existing) if existing.user_id == user_id => {
                change(existing);
                existing.updated_at = Utc::now();
                Ok(existing.clone())
            }
            _ => Err(AppError::NotFound("Couldn't find video".to_string())),
        }
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn create(&self, video: &VideoRecord) -> Result<VideoRecord, AppError> {
        let mut videos = self.videos.write().await;
        if videos.contains_key(&video.id) {
            return Err(AppError::BadRequest(format!(
                "Video {} already exists",
                video.id
            )));
        }
        videos.insert(video.id, video.clone());
        Ok(video.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError> {
        let mut videos: Vec<VideoRecord> = self
            .videos
            .read()
            .await
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn set_video_url(
        &self,
        id: Uuid,
        user_id: Uuid,
        video_url: &str,
    ) -> Result<VideoRecord, AppError> {
        self.modify(id, user_id, |video| video.video_url = Some(video_url.to_string()))
            .await
    }

    async fn set_thumbnail_url(
        &self,
        id: Uuid,
        user_id: Uuid,
        thumbnail_url: &str,
    ) -> Result<VideoRecord, AppError> {
        self.modify(id, user_id, |video| {
            video.thumbnail_url = Some(thumbnail_url.to_string())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryVideoStore::new();
        let video = VideoRecord::new(Uuid::new_v4(), "Boots".to_string(), None);
        store.create(&video).await.unwrap();

        let fetched = store.get(video.id).await.unwrap().unwrap();
        assert_eq!(fetched, video);
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = MemoryVideoStore::new();
        let video = VideoRecord::new(Uuid::new_v4(), "Boots".to_string(), None);
        store.create(&video).await.unwrap();
        assert!(store.create(&video).await.is_err());
    }

    #[tokio::test]
    async fn test_set_video_url_sets_locator() {
        let store = MemoryVideoStore::new();
        let video = VideoRecord::new(Uuid::new_v4(), "Boots".to_string(), None);
        store.create(&video).await.unwrap();

        let url = "https://bucket.s3.us-east-2.amazonaws.com/landscape/abc.mp4";
        let updated = store
            .set_video_url(video.id, video.user_id, url)
            .await
            .unwrap();
        assert_eq!(updated.video_url.as_deref(), Some(url));
        assert!(updated.updated_at >= video.updated_at);
    }

    #[tokio::test]
    async fn test_locator_commits_leave_other_fields_alone() {
        let store = MemoryVideoStore::new();
        let video = VideoRecord::new(Uuid::new_v4(), "Boots".to_string(), None);
        store.create(&video).await.unwrap();

        store
            .set_thumbnail_url(video.id, video.user_id, "http://localhost:8091/assets/t.png")
            .await
            .unwrap();
        let updated = store
            .set_video_url(video.id, video.user_id, "https://bucket/landscape/v.mp4")
            .await
            .unwrap();

        assert_eq!(
            updated.thumbnail_url.as_deref(),
            Some("http://localhost:8091/assets/t.png")
        );
        assert_eq!(updated.video_url.as_deref(), Some("https://bucket/landscape/v.mp4"));
        assert_eq!(updated.title, "Boots");

        let updated = store
            .set_thumbnail_url(video.id, video.user_id, "http://localhost:8091/assets/u.png")
            .await
            .unwrap();
        assert_eq!(updated.video_url.as_deref(), Some("https://bucket/landscape/v.mp4"));
    }

    #[tokio::test]
    async fn test_set_locator_requires_matching_owner() {
        let store = MemoryVideoStore::new();
        let video = VideoRecord::new(Uuid::new_v4(), "Boots".to_string(), None);
        store.create(&video).await.unwrap();

        let err = store
            .set_video_url(video.id, Uuid::new_v4(), "https://elsewhere")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = store
            .set_thumbnail_url(Uuid::new_v4(), video.user_id, "https://elsewhere")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let stored = store.get(video.id).await.unwrap().unwrap();
        assert!(stored.video_url.is_none());
        assert!(stored.thumbnail_url.is_none());
    }

    #[tokio::test]
    async fn test_last_commit_wins() {
        let store = MemoryVideoStore::new();
        let video = VideoRecord::new(Uuid::new_v4(), "Boots".to_string(), None);
        store.create(&video).await.unwrap();

        store.set_video_url(video.id, video.user_id, "first").await.unwrap();
        store.set_video_url(video.id, video.user_id, "second").await.unwrap();

        let stored = store.get(video.id).await.unwrap().unwrap();
        assert_eq!(stored.video_url.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_list_by_user_filters_and_orders() {
        let store = MemoryVideoStore::new();
        let owner = Uuid::new_v4();
        let mut older = VideoRecord::new(owner, "older".to_string(), None);
        older.created_at -= chrono::Duration::minutes(5);
        let newer = VideoRecord::new(owner, "newer".to_string(), None);
        let other = VideoRecord::new(Uuid::new_v4(), "other".to_string(), None);
        for v in [&older, &newer, &other] {
            store.create(v).await.unwrap();
        }

        let listed = store.list_by_user(owner).await.unwrap();
        let titles: Vec<&str> = listed.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older"]);
    }
}
