//! Metadata store for video records
//!
//! [`VideoStore`] is the contract the ingestion pipeline needs. Production
//! deployments use [`PgVideoRepository`]; [`MemoryVideoStore`] backs local
//! runs without a database and the test suites.

pub mod videos;

pub use videos::{MemoryVideoStore, PgVideoRepository, VideoStore};

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Connect to PostgreSQL and bring the schema up to date.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    timeout_seconds: u64,
) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(timeout_seconds))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
