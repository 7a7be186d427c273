//! # Database
//!
//! Pool construction and schema migrations for the PostgreSQL-backed stores.
//!
//! ```rust,no_run
//! use jobflow_core::config::DatabaseConfig;
//! use jobflow_core::database;
//!
//! # async fn example() -> jobflow_core::Result<()> {
//! let pool = database::connect(&DatabaseConfig::default()).await?;
//! database::run_migrations(&pool).await?;
//! # Ok(())
//! # }
//! ```

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::config::DatabaseConfig;
use crate::error::{JobflowError, Result};

/// Migrations for `jobflow_jobs`, `jobflow_transition_triggers` and
/// `jobflow_consumer_heartbeats`
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Build a connection pool from configuration
#[instrument(skip(config), fields(max_connections = config.max_connections))]
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.url)
        .await?;

    info!("Database pool established");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running jobflow migrations...");
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| JobflowError::Database(format!("Migration failed: {e}")))?;
    info!("Jobflow migrations complete");
    Ok(())
}
