//! Service wiring
//!
//! [`connect_collaborators`] builds the production implementations of every
//! seam (database, object store, thumbnail backend, ffprobe, ffmpeg, JWT).
//! [`build_state`] assembles the pipelines on top of whatever collaborators
//! it is given.

use crate::auth::{CredentialValidator, JwtService};
use crate::services::{IngestService, ThumbnailService};
use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::{MemoryVideoStore, PgVideoRepository, VideoStore};
use tubely_processing::{
    ContainerRemuxer, ContentTypeValidator, FfmpegRemuxer, FfprobeAnalyzer, MediaAnalyzer,
    MediaProber, StreamOptimizer, TempStagingStore,
};
use tubely_storage::{create_storage, create_thumbnail_store, Storage, ThumbnailStore};

/// External collaborators of the ingestion and thumbnail pipelines.
pub struct Collaborators {
    pub videos: Arc<dyn VideoStore>,
    pub storage: Arc<dyn Storage>,
    pub thumbnails: Arc<dyn ThumbnailStore>,
    pub analyzer: Arc<dyn MediaAnalyzer>,
    pub remuxer: Arc<dyn ContainerRemuxer>,
    pub credentials: Arc<dyn CredentialValidator>,
}

pub async fn connect_collaborators(config: &Config) -> Result<Collaborators> {
    let videos: Arc<dyn VideoStore> = match config.database_url() {
        Some(url) => {
            let pool = tubely_db::connect(
                url,
                config.db_max_connections(),
                config.db_timeout_seconds(),
            )
            .await
            .context("Failed to connect to database")?;
            tracing::info!(
                max_connections = config.db_max_connections(),
                "Database connection pool created"
            );
            Arc::new(PgVideoRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, video records are kept in memory");
            Arc::new(MemoryVideoStore::new())
        }
    };

    let storage = create_storage(config)
        .await
        .context("Failed to initialize video storage")?;
    let thumbnails = create_thumbnail_store(config)
        .await
        .context("Failed to initialize thumbnail storage")?;

    let analyzer = FfprobeAnalyzer::new(config.ffprobe_path().to_string())?;
    let remuxer = FfmpegRemuxer::new(config.ffmpeg_path().to_string())?;
    let credentials = JwtService::new(config.jwt_secret(), config.jwt_issuer());

    tracing::info!(
        storage_backend = %storage.backend_type(),
        thumbnail_backend = %thumbnails.backend_type(),
        ffprobe_path = %config.ffprobe_path(),
        ffmpeg_path = %config.ffmpeg_path(),
        "Collaborators initialized"
    );

    Ok(Collaborators {
        videos,
        storage,
        thumbnails,
        analyzer: Arc::new(analyzer),
        remuxer: Arc::new(remuxer),
        credentials: Arc::new(credentials),
    })
}

/// Assemble the application state from `collaborators`.
pub fn build_state(config: Config, collaborators: Collaborators) -> Result<Arc<AppState>> {
    let Collaborators {
        videos,
        storage,
        thumbnails,
        analyzer,
        remuxer,
        credentials,
    } = collaborators;

    let staging = TempStagingStore::new(config.staging_dir().clone())
        .context("Failed to prepare staging directory")?;

    let ingest = IngestService::new(
        videos.clone(),
        storage,
        staging.clone(),
        MediaProber::new(analyzer, config.aspect_ratio_tolerance_pct()),
        StreamOptimizer::new(remuxer, staging),
        ContentTypeValidator::new(config.video_allowed_content_types().to_vec()),
        config.max_video_size_bytes(),
    );

    let thumbnails = ThumbnailService::new(
        videos.clone(),
        thumbnails,
        ContentTypeValidator::new(config.thumbnail_allowed_content_types().to_vec()),
        config.max_thumbnail_size_bytes(),
    );

    Ok(Arc::new(AppState {
        config,
        videos,
        ingest,
        thumbnails,
        credentials,
    }))
}
