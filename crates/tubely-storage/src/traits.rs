//! Storage abstraction trait

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tubely_core::AppError;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// The key is already taken. Uploads never overwrite.
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Object store uploader
///
/// Implementations stream the file from disk; the whole object is never held
/// in memory. Failures are reported as-is, there is no retry at this layer.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store the file at `path` under `key` with the given content type.
    ///
    /// Fails with [`StorageError::AlreadyExists`] rather than replacing an
    /// existing object.
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// Public URL of the object stored under `key`.
    fn object_url(&self, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_to_app_error() {
        let err: AppError = StorageError::AlreadyExists("landscape/abc.mp4".to_string()).into();
        assert!(matches!(err, AppError::Storage(_)));

        let err: AppError = StorageError::NotFound("thumb".to_string()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = StorageError::ConfigError("no bucket".to_string()).into();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
