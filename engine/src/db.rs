//! Database Layer
//!
//! `PostgreSQL` pool creation and migrations for the role store.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;

/// Create `PostgreSQL` connection pool.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        // Prevent hanging callers on pool exhaustion
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .test_before_acquire(true)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!(max_connections = config.db_max_connections, "Connected to PostgreSQL");
    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    info!("Database migrations completed");
    Ok(())
}
