// Redis StatusCache Implementation

use async_trait::async_trait;
use ingestion_core::domain::{JobId, JobStatus};
use ingestion_core::error::{AppError, Result};
use ingestion_core::port::StatusCache;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::info;

fn map_redis_error(err: redis::RedisError) -> AppError {
    if err.is_timeout() {
        AppError::Cache(format!("Redis timeout: {}", err))
    } else if err.is_connection_dropped() || err.is_connection_refusal() {
        AppError::Cache(format!("Redis connection error: {}", err))
    } else {
        AppError::Cache(format!("Redis command error: {}", err))
    }
}

/// Normalize `host:port` (REDIS_ADDR style) into a `redis://` URL
pub fn redis_url(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("redis://{}", addr)
    }
}

/// Status cache over a multiplexed, auto-reconnecting Redis connection
///
/// Keys are bare job ids and values the status strings, so entries stay
/// readable with `redis-cli GET <job_id>`.
#[derive(Clone)]
pub struct RedisStatusCache {
    conn: ConnectionManager,
}

impl RedisStatusCache {
    /// Connect to Redis
    ///
    /// # Arguments
    ///
    /// * `addr` - `host:port` or a full `redis://` URL
    pub async fn connect(addr: &str) -> Result<Self> {
        let url = redis_url(addr);
        info!(url = %url, "Connecting to Redis");

        let client = redis::Client::open(url.as_str())
            .map_err(|e| AppError::Config(format!("Invalid Redis address {}: {}", addr, e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl StatusCache for RedisStatusCache {
    async fn set(&self, id: &JobId, status: JobStatus, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        // EX takes whole seconds; never send 0
        let ttl_secs = ttl.as_secs().max(1);

        let _: () = redis::cmd("SET")
            .arg(id)
            .arg(status.as_str())
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        Ok(())
    }

    async fn set_if_absent(&self, id: &JobId, status: JobStatus, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let ttl_secs = ttl.as_secs().max(1);

        // NX replies nil when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(id)
            .arg(status.as_str())
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        Ok(reply.is_some())
    }

    async fn get(&self, id: &JobId) -> Result<Option<JobStatus>> {
        let mut conn = self.conn.clone();

        let value: Option<String> = redis::cmd("GET")
            .arg(id)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        value
            .map(|s| {
                s.parse::<JobStatus>()
                    .map_err(|e| AppError::Cache(format!("Bad cached value for {}: {}", id, e)))
            })
            .transpose()
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}
