//! Tubely Storage Library
//!
//! Durable homes for uploaded media:
//!
//! - [`Storage`] moves a finished local file into the object store under a
//!   caller-chosen key. S3 and local-filesystem backends are provided.
//! - [`ThumbnailStore`] persists thumbnail bytes and hands back a locator.
//!   Backends: disk, bounded in-process cache, inline `data:` URL.
//!
//! # Object key format
//!
//! Video keys are `{classification}/{token}.{ext}`, built by
//! [`RemoteObjectKey`]. Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod thumbnail;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_storage, create_thumbnail_store};
pub use keys::{extension_for_content_type, random_token, RemoteObjectKey};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use thumbnail::{
    CacheThumbnailStore, CachedThumbnail, DataUrlThumbnailStore, DiskThumbnailStore,
    ThumbnailStore,
};
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::{StorageBackend, ThumbnailBackend};
