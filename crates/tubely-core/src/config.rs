//! Configuration module
//!
//! Settings come from the process environment (and a `.env` file when
//! present). `Config::from_env` applies defaults; `Config::validate` rejects
//! combinations that would fail at request time.

use std::env;
use std::path::PathBuf;

use crate::constants::DEFAULT_JWT_ISSUER;
use crate::storage_types::{StorageBackend, ThumbnailBackend};

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 8091;
const MAX_VIDEO_SIZE_MB: u64 = 1024;
const MAX_THUMBNAIL_SIZE_MB: u64 = 10;
const ASPECT_RATIO_TOLERANCE_PCT: u32 = 2;
const UPLOAD_TIMEOUT_SECS: u64 = 600;
const THUMBNAIL_CACHE_CAPACITY: usize = 256;

/// Container types the fast-start remux can rewrite.
pub const REMUXABLE_CONTENT_TYPES: &[&str] = &["video/mp4", "video/quicktime"];

/// Settings shared by every Tubely binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub environment: String,
}

/// Ingestion service configuration
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub base: BaseConfig,
    /// Unset selects the in-memory video store.
    pub database_url: Option<String>,
    // Object storage
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // S3-compatible providers (MinIO, Spaces, ...)
    pub s3_conditional_put: bool,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Video pipeline
    pub max_video_size_bytes: u64,
    pub video_allowed_content_types: Vec<String>,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub staging_dir: PathBuf,
    pub aspect_ratio_tolerance_pct: u32,
    pub upload_timeout_secs: u64,
    // Thumbnails
    pub thumbnail_backend: ThumbnailBackend,
    pub assets_root: PathBuf,
    pub public_base_url: String,
    pub thumbnail_cache_capacity: usize,
    pub max_thumbnail_size_bytes: u64,
    pub thumbnail_allowed_content_types: Vec<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IngestConfig>);

impl Config {
    fn as_ingest(&self) -> &IngestConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_ingest().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IngestConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_ingest().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_ingest().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_ingest().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_ingest().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_ingest().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_ingest().base.jwt_secret
    }

    pub fn jwt_issuer(&self) -> &str {
        &self.as_ingest().base.jwt_issuer
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_ingest().database_url.as_deref()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_ingest().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_ingest().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_ingest().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_ingest().s3_endpoint.as_deref()
    }

    pub fn s3_conditional_put(&self) -> bool {
        self.as_ingest().s3_conditional_put
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_ingest().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_ingest().local_storage_base_url.as_deref()
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.as_ingest().max_video_size_bytes
    }

    pub fn video_allowed_content_types(&self) -> &[String] {
        &self.as_ingest().video_allowed_content_types
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_ingest().ffmpeg_path
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.as_ingest().ffprobe_path
    }

    pub fn staging_dir(&self) -> &PathBuf {
        &self.as_ingest().staging_dir
    }

    pub fn aspect_ratio_tolerance_pct(&self) -> u32 {
        self.as_ingest().aspect_ratio_tolerance_pct
    }

    pub fn upload_timeout_secs(&self) -> u64 {
        self.as_ingest().upload_timeout_secs
    }

    pub fn thumbnail_backend(&self) -> ThumbnailBackend {
        self.as_ingest().thumbnail_backend
    }

    pub fn assets_root(&self) -> &PathBuf {
        &self.as_ingest().assets_root
    }

    pub fn public_base_url(&self) -> &str {
        &self.as_ingest().public_base_url
    }

    pub fn thumbnail_cache_capacity(&self) -> usize {
        self.as_ingest().thumbnail_cache_capacity
    }

    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.as_ingest().max_thumbnail_size_bytes
    }

    pub fn thumbnail_allowed_content_types(&self) -> &[String] {
        &self.as_ingest().thumbnail_allowed_content_types
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let base = BaseConfig {
            server_port,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_JWT_ISSUER.to_string()),
            environment,
        };

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()?;

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", server_port))
            .trim_end_matches('/')
            .to_string();

        let max_video_size_mb = env::var("MAX_VIDEO_SIZE_MB")
            .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_VIDEO_SIZE_MB);

        let max_thumbnail_size_mb = env::var("MAX_THUMBNAIL_SIZE_MB")
            .unwrap_or_else(|_| MAX_THUMBNAIL_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_THUMBNAIL_SIZE_MB);

        let thumbnail_backend = env::var("THUMBNAIL_BACKEND")
            .unwrap_or_else(|_| "disk".to_string())
            .parse::<ThumbnailBackend>()?;

        Ok(Self {
            base,
            database_url: optional_var("DATABASE_URL"),
            storage_backend,
            s3_bucket: optional_var("S3_BUCKET"),
            s3_region: optional_var("S3_REGION").or_else(|| optional_var("AWS_REGION")),
            s3_endpoint: optional_var("S3_ENDPOINT"),
            s3_conditional_put: env::var("S3_CONDITIONAL_PUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
            local_storage_path: Some(
                env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./storage".to_string()),
            ),
            local_storage_base_url: Some(
                env::var("LOCAL_STORAGE_BASE_URL")
                    .unwrap_or_else(|_| format!("{}/media", public_base_url)),
            ),
            max_video_size_bytes: max_video_size_mb * 1024 * 1024,
            video_allowed_content_types: parse_list(
                &env::var("VIDEO_ALLOWED_CONTENT_TYPES").unwrap_or_else(|_| "video/mp4".to_string()),
            ),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            staging_dir: optional_var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            aspect_ratio_tolerance_pct: env::var("ASPECT_RATIO_TOLERANCE_PCT")
                .unwrap_or_else(|_| ASPECT_RATIO_TOLERANCE_PCT.to_string())
                .parse()
                .unwrap_or(ASPECT_RATIO_TOLERANCE_PCT),
            upload_timeout_secs: env::var("UPLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| UPLOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_TIMEOUT_SECS),
            thumbnail_backend,
            assets_root: PathBuf::from(
                env::var("ASSETS_ROOT").unwrap_or_else(|_| "./assets".to_string()),
            ),
            public_base_url,
            thumbnail_cache_capacity: env::var("THUMBNAIL_CACHE_CAPACITY")
                .unwrap_or_else(|_| THUMBNAIL_CACHE_CAPACITY.to_string())
                .parse()
                .unwrap_or(THUMBNAIL_CACHE_CAPACITY),
            max_thumbnail_size_bytes: max_thumbnail_size_mb * 1024 * 1024,
            thumbnail_allowed_content_types: parse_list(
                &env::var("THUMBNAIL_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| "image/jpeg,image/png".to_string()),
            ),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.base.db_max_connections == 0 {
            return Err(anyhow::anyhow!("Database max connections cannot be 0"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be greater than 0"));
        }

        if self.video_allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_CONTENT_TYPES must list at least one type"
            ));
        }
        if let Some(unsupported) = self
            .video_allowed_content_types
            .iter()
            .find(|ct| !REMUXABLE_CONTENT_TYPES.contains(&ct.as_str()))
        {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_CONTENT_TYPES contains {}, which cannot be remuxed for fast start (supported: {})",
                unsupported,
                REMUXABLE_CONTENT_TYPES.join(", ")
            ));
        }

        if self.aspect_ratio_tolerance_pct > 50 {
            return Err(anyhow::anyhow!(
                "ASPECT_RATIO_TOLERANCE_PCT must be between 0 and 50"
            ));
        }

        if self.upload_timeout_secs == 0 {
            return Err(anyhow::anyhow!("UPLOAD_TIMEOUT_SECS must be greater than 0"));
        }

        if self.thumbnail_backend == ThumbnailBackend::Cache && self.thumbnail_cache_capacity == 0 {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_CACHE_CAPACITY must be greater than 0 for the cache backend"
            ));
        }

        Ok(())
    }
}
