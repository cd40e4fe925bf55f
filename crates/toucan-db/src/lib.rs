//! Toucan metadata store
//!
//! Store traits for albums, photos and users, with Postgres repositories
//! backed by `sqlx` and embedded migrations.

pub mod db;

pub use db::{
    AlbumRepository, AlbumStore, PhotoRepository, PhotoStore, TransactionGuard, UserRepository,
    UserStore,
};

use anyhow::Context;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use toucan_core::Config;

/// Open a connection pool for the configured database
pub async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .connect(config.database_url())
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database pool created"
    );

    Ok(pool)
}

/// Apply pending schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}
