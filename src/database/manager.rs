use sqlx::{postgres::PgPoolOptions, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Named Postgres pools for the device stores ("system_of_record", "read_store")
#[derive(Clone)]
pub struct DatabaseManager {
    pools: Arc<RwLock<HashMap<String, PgPool>>>,
    settings: DatabaseConfig,
}

impl DatabaseManager {
    pub fn new(settings: DatabaseConfig) -> Self {
        Self {
            pools: Arc::new(RwLock::new(HashMap::new())),
            settings,
        }
    }

    /// Open (or reuse) the pool registered under `name`
    pub async fn connect(
        &self,
        name: &str,
        connection_string: &str,
    ) -> Result<PgPool, DatabaseError> {
        // Fast path: try read lock
        {
            let pools = self.pools.read().await;
            if let Some(pool) = pools.get(name) {
                return Ok(pool.clone());
            }
        }

        let redacted = Self::redact(connection_string)?;
        let pool = PgPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .acquire_timeout(Duration::from_secs(self.settings.connection_timeout))
            .connect(connection_string)
            .await?;

        {
            let mut pools = self.pools.write().await;
            pools.insert(name.to_string(), pool.clone());
        }

        info!(pool = %name, url = %redacted, "Created database pool");
        Ok(pool)
    }

    /// Pings every open pool
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let pools: Vec<PgPool> = self.pools.read().await.values().cloned().collect();
        for pool in pools {
            sqlx::query("SELECT 1").execute(&pool).await?;
        }
        Ok(())
    }

    /// Close and remove all pools (e.g., on shutdown)
    pub async fn close_all(&self) {
        let mut pools = self.pools.write().await;
        for (name, pool) in pools.drain() {
            pool.close().await;
            info!("Closed database pool: {}", name);
        }
    }

    /// Connection string with the password masked, for logs
    fn redact(connection_string: &str) -> Result<String, DatabaseError> {
        let mut url =
            url::Url::parse(connection_string).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if url.password().is_some() {
            url.set_password(Some("***")).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        Ok(url.into())
    }
}
