//! Temporary staging of upload bodies
//!
//! Every staged file is owned by exactly one [`StagedAsset`]. The asset
//! removes its file when [`StagedAsset::release`] is called or when it is
//! dropped, so early returns, panics and cancelled requests all clean up.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tubely_core::constants::STAGING_FILE_PREFIX;
use tubely_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Upload exceeds maximum size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Uploaded file is empty")]
    Empty,

    #[error("Failed to read upload body: {0}")]
    Body(String),

    #[error("Staging IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StagingError> for AppError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::TooLarge { limit } => AppError::PayloadTooLarge(format!(
                "File exceeds maximum size of {} bytes",
                limit
            )),
            StagingError::Empty => AppError::BadRequest("Uploaded file is empty".to_string()),
            StagingError::Body(msg) => {
                AppError::BadRequest(format!("Failed to read upload body: {}", msg))
            }
            StagingError::Io(e) => AppError::Staging(e.to_string()),
        }
    }
}

/// Handle to a private temporary file.
#[derive(Debug)]
pub struct StagedAsset {
    path: PathBuf,
    size_bytes: u64,
    released: bool,
}

impl StagedAsset {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            size_bytes: 0,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub(crate) fn set_size_bytes(&mut self, size_bytes: u64) {
        self.size_bytes = size_bytes;
    }

    /// Delete the backing file. Never fails; problems are logged.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Staged file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Staged file already gone")
            }
            Err(e) => tracing::warn!(
                error = %e,
                path = %self.path.display(),
                "Failed to remove staged file"
            ),
        }
    }
}

impl Drop for StagedAsset {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Allocates staged files inside one directory.
#[derive(Debug, Clone)]
pub struct TempStagingStore {
    dir: PathBuf,
}

impl TempStagingStore {
    /// Create the store, creating `dir` if needed. The directory is
    /// canonicalized so staged paths are absolute.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StagingError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: dir.canonicalize()?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Allocate an empty staged file whose name ends with `suffix`.
    pub fn allocate(&self, suffix: &str) -> Result<StagedAsset, StagingError> {
        let (asset, _file) = self.create(suffix)?;
        Ok(asset)
    }

    fn create(&self, suffix: &str) -> Result<(StagedAsset, std::fs::File), StagingError> {
        let named = tempfile::Builder::new()
            .prefix(STAGING_FILE_PREFIX)
            .suffix(suffix)
            .tempfile_in(&self.dir)?;
        let (file, temp_path) = named.into_parts();
        let path = temp_path.keep().map_err(|e| StagingError::Io(e.error))?;
        Ok((StagedAsset::new(path), file))
    }

    /// Copy `body` into a new staged file.
    ///
    /// The copy aborts as soon as more than `max_bytes` have arrived; the
    /// partial file is removed before the error is returned.
    #[tracing::instrument(skip(self, body), fields(staging_dir = %self.dir.display()))]
    pub async fn stage<S, E>(&self, body: S, max_bytes: u64) -> Result<StagedAsset, StagingError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let start = std::time::Instant::now();
        let (mut asset, file) = self.create("")?;
        let mut file = tokio::fs::File::from_std(file);
        let mut body = std::pin::pin!(body);
        let mut written: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| StagingError::Body(e.to_string()))?;
            written += chunk.len() as u64;
            if written > max_bytes {
                tracing::info!(
                    limit_bytes = max_bytes,
                    received_bytes = written,
                    "Upload exceeded size limit, aborting transfer"
                );
                return Err(StagingError::TooLarge { limit: max_bytes });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        if written == 0 {
            return Err(StagingError::Empty);
        }
        asset.set_size_bytes(written);

        tracing::info!(
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload staged"
        );

        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tempfile::tempdir;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_writes_full_body() {
        let dir = tempdir().unwrap();
        let store = TempStagingStore::new(dir.path()).unwrap();

        let asset = store
            .stage(chunks(&["hello ", "world"]), 1024)
            .await
            .unwrap();

        assert_eq!(asset.size_bytes(), 11);
        assert_eq!(std::fs::read(asset.path()).unwrap(), b"hello world");
        assert!(asset
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(STAGING_FILE_PREFIX));
    }

    #[tokio::test]
    async fn test_release_removes_file() {
        let dir = tempdir().unwrap();
        let store = TempStagingStore::new(dir.path()).unwrap();
        let asset = store.stage(chunks(&["data"]), 1024).await.unwrap();
        let path = asset.path().to_path_buf();

        asset.release();
        assert!(!path.exists());
        assert_eq!(entries(store.dir()), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = tempdir().unwrap();
        let store = TempStagingStore::new(dir.path()).unwrap();
        {
            let _asset = store.stage(chunks(&["data"]), 1024).await.unwrap();
            assert_eq!(entries(store.dir()), 1);
        }
        assert_eq!(entries(store.dir()), 0);
    }

    #[tokio::test]
    async fn test_release_tolerates_missing_file() {
        let dir = tempdir().unwrap();
        let store = TempStagingStore::new(dir.path()).unwrap();
        let asset = store.stage(chunks(&["data"]), 1024).await.unwrap();

        std::fs::remove_file(asset.path()).unwrap();
        asset.release();
    }

    #[tokio::test]
    async fn test_oversized_body_aborts_and_cleans_up() {
        let dir = tempdir().unwrap();
        let store = TempStagingStore::new(dir.path()).unwrap();

        let result = store
            .stage(chunks(&["12345", "67890", "never read"]), 8)
            .await;

        assert!(matches!(result, Err(StagingError::TooLarge { limit: 8 })));
        assert_eq!(entries(store.dir()), 0);
    }

    #[tokio::test]
    async fn test_body_exactly_at_limit_is_accepted() {
        let dir = tempdir().unwrap();
        let store = TempStagingStore::new(dir.path()).unwrap();
        let asset = store.stage(chunks(&["1234", "5678"]), 8).await.unwrap();
        assert_eq!(asset.size_bytes(), 8);
    }

    #[tokio::test]
    async fn test_body_error_cleans_up() {
        let dir = tempdir().unwrap();
        let store = TempStagingStore::new(dir.path()).unwrap();
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(ErrorKind::ConnectionReset, "client went away")),
        ]);

        let result = store.stage(body, 1024).await;

        assert!(matches!(result, Err(StagingError::Body(_))));
        assert_eq!(entries(store.dir()), 0);
    }

    #[tokio::test]
    async fn test_empty_body_rejected() {
        let dir = tempdir().unwrap();
        let store = TempStagingStore::new(dir.path()).unwrap();
        let result = store.stage(chunks(&[]), 1024).await;
        assert!(matches!(result, Err(StagingError::Empty)));
        assert_eq!(entries(store.dir()), 0);
    }

    #[tokio::test]
    async fn test_allocate_uses_suffix_and_unique_names() {
        let dir = tempdir().unwrap();
        let store = TempStagingStore::new(dir.path()).unwrap();
        let a = store.allocate(".mp4").unwrap();
        let b = store.allocate(".mp4").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().to_string_lossy().ends_with(".mp4"));
        assert!(a.path().is_absolute());
    }

    #[test]
    fn test_too_large_maps_to_client_error() {
        let err: AppError = StagingError::TooLarge { limit: 10 }.into();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));

        let err: AppError =
            StagingError::Io(std::io::Error::new(ErrorKind::Other, "disk full")).into();
        assert!(matches!(err, AppError::Staging(_)));
    }
}
