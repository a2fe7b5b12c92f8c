//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded [`Config`] to a servable
//! router. Integration tests skip [`initialize_app`] and call
//! [`services::build_state`] with fake collaborators instead.

pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_infra::LogFormat;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    let log_format = LogFormat::resolve(
        std::env::var("LOG_FORMAT").ok().as_deref(),
        config.is_production(),
    );
    tubely_infra::init_telemetry(log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let collaborators = services::connect_collaborators(&config).await?;
    let state = services::build_state(config.clone(), collaborators)?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
