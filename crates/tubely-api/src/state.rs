//! Application state shared by all handlers

use crate::auth::CredentialValidator;
use crate::services::{IngestService, ThumbnailService};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub videos: Arc<dyn VideoStore>,
    pub ingest: IngestService,
    pub thumbnails: ThumbnailService,
    pub credentials: Arc<dyn CredentialValidator>,
}
