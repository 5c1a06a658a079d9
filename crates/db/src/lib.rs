//! Persistence for the voxdub pipeline.
//!
//! - [`models`] — row structs (`sqlx::FromRow`) and input DTOs.
//! - [`repositories`] — zero-sized repositories with async queries taking
//!   `&PgPool`.
//! - [`store`] — the narrow async traits the pipeline depends on, and
//!   [`PgStore`] implementing them over the repositories.
//! - [`memory`] — [`InMemoryStore`], the same traits over in-process maps.

use sqlx::postgres::PgPoolOptions;

pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use memory::InMemoryStore;
pub use store::{
    DubStore, JobStore, PgStore, PipelineStore, RecordingStore, StoreError, StoreResult,
    TranscriptStore,
};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
