//! Daemon configuration
//!
//! Read once from the environment at startup. Every variable has a
//! local-development default; a present but unparsable value is an error.

use anyhow::{bail, Context, Result};
use ingestion_api_rpc::RpcServerConfig;
use ingestion_infra_postgres::PostgresConfig;
use std::time::Duration;

const DEFAULT_REDIS_ADDR: &str = "localhost:6379";
const DEFAULT_COMPLETION_DELAY_MS: u64 = 3000;

/// Durable store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
    None,
}

impl StoreBackend {
    fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            "none" => Ok(Self::None),
            other => bail!("INGEST_STORE must be postgres, memory or none (got '{}')", other),
        }
    }
}

/// Status cache backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
    None,
}

impl CacheBackend {
    fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            "none" => Ok(Self::None),
            other => bail!("INGEST_CACHE must be redis, memory or none (got '{}')", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => bail!("INGEST_LOG_FORMAT must be pretty or json (got '{}')", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub cache: CacheBackend,
    pub postgres: PostgresConfig,
    pub redis_addr: String,
    pub rpc: RpcServerConfig,
    pub completion_delay: Duration,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pg_defaults = PostgresConfig::default();
        let rpc_defaults = RpcServerConfig::default();

        let postgres = PostgresConfig {
            host: lookup("POSTGRES_HOST").unwrap_or(pg_defaults.host),
            port: parse_or(&lookup, "POSTGRES_PORT", pg_defaults.port)?,
            user: lookup("POSTGRES_USER").unwrap_or(pg_defaults.user),
            password: lookup("POSTGRES_PASSWORD").unwrap_or(pg_defaults.password),
            database: lookup("POSTGRES_DB").unwrap_or(pg_defaults.database),
        };

        let rpc = RpcServerConfig {
            host: lookup("INGEST_RPC_HOST").unwrap_or(rpc_defaults.host),
            port: parse_or(&lookup, "INGEST_RPC_PORT", rpc_defaults.port)?,
        };

        let store = match lookup("INGEST_STORE") {
            Some(s) => StoreBackend::parse(&s)?,
            None => StoreBackend::Postgres,
        };
        let cache = match lookup("INGEST_CACHE") {
            Some(s) => CacheBackend::parse(&s)?,
            None => CacheBackend::Redis,
        };
        let log_format = match lookup("INGEST_LOG_FORMAT") {
            Some(s) => LogFormat::parse(&s)?,
            None => LogFormat::Pretty,
        };

        if store == StoreBackend::None && cache == CacheBackend::None {
            bail!("INGEST_STORE and INGEST_CACHE cannot both be none");
        }

        let delay_ms = parse_or(&lookup, "INGEST_COMPLETION_DELAY_MS", DEFAULT_COMPLETION_DELAY_MS)?;

        Ok(Self {
            store,
            cache,
            postgres,
            redis_addr: lookup("REDIS_ADDR").unwrap_or_else(|| DEFAULT_REDIS_ADDR.to_string()),
            rpc,
            completion_delay: Duration::from_millis(delay_ms),
            log_format,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.store, StoreBackend::Postgres);
        assert_eq!(config.cache, CacheBackend::Redis);
        assert_eq!(config.postgres, PostgresConfig::default());
        assert_eq!(config.redis_addr, "localhost:6379");
        assert_eq!(config.rpc.host, "0.0.0.0");
        assert_eq!(config.rpc.port, 50051);
        assert_eq!(config.completion_delay, Duration::from_secs(3));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("POSTGRES_HOST", "db"),
            ("POSTGRES_PORT", "6543"),
            ("POSTGRES_DB", "events_test"),
            ("REDIS_ADDR", "cache:6380"),
            ("INGEST_RPC_PORT", "9000"),
            ("INGEST_STORE", "memory"),
            ("INGEST_CACHE", "NONE"),
            ("INGEST_COMPLETION_DELAY_MS", "250"),
            ("INGEST_LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.postgres.host, "db");
        assert_eq!(config.postgres.port, 6543);
        assert_eq!(config.postgres.database, "events_test");
        assert_eq!(config.postgres.user, "postgres");
        assert_eq!(config.redis_addr, "cache:6380");
        assert_eq!(config.rpc.port, 9000);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.cache, CacheBackend::None);
        assert_eq!(config.completion_delay, Duration::from_millis(250));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config(&[("POSTGRES_PORT", "lots")]).is_err());
        assert!(config(&[("INGEST_RPC_PORT", "70000")]).is_err());
        assert!(config(&[("INGEST_STORE", "sqlite")]).is_err());
        assert!(config(&[("INGEST_CACHE", "memcached")]).is_err());
        assert!(config(&[("INGEST_LOG_FORMAT", "xml")]).is_err());
        assert!(config(&[("INGEST_COMPLETION_DELAY_MS", "-1")]).is_err());
    }

    #[test]
    fn test_no_backend_at_all_rejected() {
        let err = config(&[("INGEST_STORE", "none"), ("INGEST_CACHE", "none")]).unwrap_err();
        assert!(err.to_string().contains("cannot both be none"));
    }
}
