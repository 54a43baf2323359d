//! Event Ingestion Service - Main Entry Point
//!
//! Composition root: configuration, logging, adapter wiring, startup checks
//! and graceful shutdown.

mod config;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{CacheBackend, Config, LogFormat, StoreBackend};
use ingestion_api_rpc::RpcServer;
use ingestion_core::application::{
    shutdown_channel, CompletionScheduler, IngestionService, JobStatusTracker, RecoveryService,
    ShutdownToken, TrackerConfig,
};
use ingestion_core::port::{JobStore, StatusCache, SystemTimeProvider, TimeProvider, UuidProvider};
use ingestion_infra_memory::{InMemoryJobStore, InMemoryStatusCache};
use ingestion_infra_postgres::{run_migrations, PostgresJobStore};
use ingestion_infra_redis::RedisStatusCache;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_FILTER: &str = "event_ingestion=info,ingestion=info";
const JANITOR_INTERVAL: Duration = Duration::from_secs(60);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = Config::from_env().context("Invalid configuration")?;

    // 2. Initialize logging
    init_logging(config.log_format)?;
    info!("Event Ingestion Service v{} starting...", VERSION);
    info!(
        store = ?config.store,
        cache = ?config.cache,
        completion_delay_ms = config.completion_delay.as_millis() as u64,
        "Configuration loaded"
    );

    let (shutdown_tx, shutdown_token) = shutdown_channel();
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);

    // 3. Connect backends (a configured backend that is unreachable is fatal)
    let store = connect_store(&config, time_provider.clone()).await?;
    let cache = connect_cache(&config, shutdown_token.clone()).await?;

    // 4. Setup dependencies (DI wiring)
    let tracker = Arc::new(JobStatusTracker::new(
        store.clone(),
        cache,
        Arc::new(UuidProvider),
        time_provider,
        TrackerConfig::default(),
    ));
    let scheduler = Arc::new(CompletionScheduler::new(
        tracker.clone(),
        config.completion_delay,
        shutdown_token,
    ));
    let service = Arc::new(IngestionService::new(tracker, scheduler.clone()));

    // 5. Re-schedule jobs left in processing by a previous run
    if let Some(store) = store {
        info!("Running recovery...");
        let recovery = RecoveryService::new(store, scheduler.clone());
        match recovery.recover_processing_jobs().await {
            Ok(count) => info!(recovered_jobs = count, "Recovery completed"),
            Err(e) => error!(error = %e, "Recovery failed"),
        }
    }

    // 6. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let (rpc_handle, addr) = RpcServer::new(config.rpc.clone(), service)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %addr, "System ready. Waiting for events...");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;

    let pending = scheduler.pending();
    shutdown_tx.shutdown();
    if tokio::time::timeout(SHUTDOWN_GRACE, scheduler.wait_idle())
        .await
        .is_err()
    {
        warn!("Completion tasks did not stop in time");
    }
    if pending > 0 {
        info!(abandoned = pending, "Pending completions abandoned");
    }

    info!("Shutdown complete.");

    Ok(())
}

fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    match format {
        LogFormat::Json => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

async fn connect_store(
    config: &Config,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<Option<Arc<dyn JobStore>>> {
    match config.store {
        StoreBackend::Postgres => {
            let pool = config
                .postgres
                .connect()
                .await
                .context("Failed to connect to PostgreSQL")?;
            run_migrations(&pool).await.context("Migration failed")?;

            let store = PostgresJobStore::new(pool);
            store.ping().await.context("PostgreSQL ping failed")?;
            info!("Successfully connected to PostgreSQL");
            let store: Arc<dyn JobStore> = Arc::new(store);
            Ok(Some(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; jobs do not survive a restart");
            let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new(time_provider));
            Ok(Some(store))
        }
        StoreBackend::None => {
            warn!("No durable store configured; status reads depend on the cache");
            Ok(None)
        }
    }
}

async fn connect_cache(
    config: &Config,
    shutdown: ShutdownToken,
) -> Result<Option<Arc<dyn StatusCache>>> {
    match config.cache {
        CacheBackend::Redis => {
            let cache = RedisStatusCache::connect(&config.redis_addr)
                .await
                .context("Failed to connect to Redis")?;
            cache.ping().await.context("Redis ping failed")?;
            info!(addr = %config.redis_addr, "Successfully connected to Redis");
            let cache: Arc<dyn StatusCache> = Arc::new(cache);
            Ok(Some(cache))
        }
        CacheBackend::Memory => {
            let cache = Arc::new(InMemoryStatusCache::new());
            tokio::spawn(cache.clone().run_janitor(JANITOR_INTERVAL, shutdown));
            Ok(Some(cache as Arc<dyn StatusCache>))
        }
        CacheBackend::None => {
            info!("No status cache configured");
            Ok(None)
        }
    }
}
