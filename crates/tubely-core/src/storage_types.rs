use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Object storage backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// Where thumbnail bytes live. One backend is chosen per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailBackend {
    /// Files under the assets root, served statically.
    Disk,
    /// Bounded in-process LRU, served by the thumbnail route.
    Cache,
    /// Bytes inlined into the locator as a `data:` URL.
    DataUrl,
}

impl FromStr for ThumbnailBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "disk" => Ok(ThumbnailBackend::Disk),
            "cache" | "memory" => Ok(ThumbnailBackend::Cache),
            "data_url" | "dataurl" => Ok(ThumbnailBackend::DataUrl),
            _ => Err(anyhow::anyhow!("Invalid thumbnail backend: {}", s)),
        }
    }
}

impl Display for ThumbnailBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ThumbnailBackend::Disk => write!(f, "disk"),
            ThumbnailBackend::Cache => write!(f, "cache"),
            ThumbnailBackend::DataUrl => write!(f, "data_url"),
        }
    }
}
