// src/database.rs
//! Postgres connection management for the bootstrap commands

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgConnection, PgPool};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::config::Settings;

pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open the single connection every command works over.
    ///
    /// TLS is always required; the server certificate is not verified.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let options = Self::connect_options(&settings.database_url)?;

        info!("Connecting to database: {}", settings.redacted_url());
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(settings.connect_timeout)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to {}", settings.redacted_url()))?;

        info!("Database connection established");
        Ok(Self { pool })
    }

    /// Wrap an existing pool, keeping whatever TLS settings it was built with.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn connect_options(database_url: &str) -> Result<PgConnectOptions> {
        let options = PgConnectOptions::from_str(database_url)
            .context("DATABASE_URL is not a valid Postgres connection string")?;
        Ok(options.ssl_mode(PgSslMode::Require))
    }

    /// Get pool reference for custom operations
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Execute a transaction with automatic rollback on error
    pub async fn transaction<F, T>(&self, operation: F) -> Result<T>
    where
        F: for<'c> FnOnce(
            &'c mut PgConnection,
        ) -> Pin<Box<dyn Future<Output = Result<T>> + Send + 'c>>,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        match operation(&mut *tx).await {
            Ok(result) => {
                tx.commit().await.context("Failed to commit transaction")?;
                debug!("Transaction committed");
                Ok(result)
            }
            Err(e) => {
                warn!("Rolling back transaction: {}", e);
                tx.rollback().await.context("Failed to roll back transaction")?;
                Err(e)
            }
        }
    }

    /// Round-trip a query so a dead or misrouted connection fails before any
    /// schema or seed SQL is sent. Returns the server version string.
    pub async fn server_version(&self) -> Result<String> {
        let version = sqlx::query_scalar::<_, String>("SHOW server_version")
            .fetch_one(&self.pool)
            .await
            .context("Database did not answer the version query")?;
        Ok(version)
    }

    /// Close the connection, waiting for it to be released.
    pub async fn close(self) {
        self.pool.close().await;
        info!("Database connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_force_tls() {
        let options =
            Database::connect_options("postgresql://app:pw@db.example.com:5432/jobs?sslmode=disable")
                .unwrap();
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Require));
        assert_eq!(options.get_host(), "db.example.com");
        assert_eq!(options.get_database(), Some("jobs"));
    }

    #[test]
    fn test_connect_options_reject_garbage() {
        assert!(Database::connect_options("not a connection string").is_err());
    }
}
