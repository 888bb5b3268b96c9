//! PostgreSQL setup for the key-value store
//!
//! Opening the pool and bringing `kv_entries` up to date happen together;
//! the store is never handed a pool whose schema is behind.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    ConnectionError(String),

    #[error("Failed to run migrations: {0}")]
    MigrationError(String),
}

/// Open a pool sized from config and apply pending migrations
pub async fn connect(config: &Config, database_url: &str) -> Result<PgPool, DbError> {
    tracing::info!(url = %config.database_url_masked(), "Opening store database");

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url)
        .await
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Apply `migrations/` to `pool`
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DbError::MigrationError(e.to_string()))?;

    tracing::info!("kv_entries schema is current");
    Ok(())
}
