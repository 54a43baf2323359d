// PostgreSQL Connection Pool Setup

use ingestion_core::error::{AppError, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings (each field maps to one POSTGRES_* variable)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "event_ingestion".to_string(),
        }
    }
}

impl PostgresConfig {
    /// Plain-text connection, for local development
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(sqlx::postgres::PgSslMode::Disable)
    }

    /// Create a pool and establish the first connection
    pub async fn connect(&self) -> Result<PgPool> {
        info!(
            host = %self.host,
            port = self.port,
            database = %self.database,
            "Connecting to PostgreSQL"
        );
        pool_with(self.connect_options()).await
    }
}

/// Create a pool from a `postgres://` URL
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Config(format!("Invalid database URL: {}", e)))?;
    pool_with(options).await
}

async fn pool_with(options: PgConnectOptions) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(|e| AppError::Store(format!("Failed to connect to PostgreSQL: {}", e)))
}
