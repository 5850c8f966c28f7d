//! Postgres connection for the item store

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use crate::config::{Config, DatabaseConfig};
use crate::error::{AppError, Result};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const MAX_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Shared handle to the items database
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open the pool and make sure at least one connection succeeds
    pub async fn connect(config: &Config) -> Result<Self> {
        info!(
            host = %config.database.host,
            database = %config.database.name,
            url_override = config.database.url.is_some(),
            "Connecting to item database"
        );

        let pool = pool_options(&config.database)
            .connect(&config.database_url())
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round trip to the server. An unreachable database is reported as a
    /// connection failure rather than a query failure.
    pub async fn health_check(&self) -> Result<Duration> {
        let started = Instant::now();

        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        let latency = started.elapsed();
        debug!(latency_ms = latency.as_millis() as u64, "Item database reachable");
        Ok(latency)
    }

    /// Bring the items schema up to date
    pub async fn migrate(&self) -> Result<()> {
        super::migrations::run_migrations(&self.pool).await?;
        info!("Item schema up to date");
        Ok(())
    }

    pub async fn close(&self) {
        info!("Closing item database pool");
        self.pool.close().await;
    }
}

/// Pool bounds from configuration. The minimum never exceeds the maximum and
/// the maximum is at least one connection.
fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    let max = config.max_connections.max(1);

    PgPoolOptions::new()
        .max_connections(max)
        .min_connections(config.min_connections.min(max))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
}
