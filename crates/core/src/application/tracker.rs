//! Job Status Tracker
//!
//! Owns the per-job status lifecycle and mediates every write to the
//! durable store and the fast-path cache:
//! - `create`: new id, row in `processing` (store failure is fatal), cache mirror
//! - `complete`: cache + store flipped to `done` (all failures logged only)
//! - `get_status`: cache, then store with cache backfill, then `not found`
//!
//! The backfill never overwrites a live cache entry, so a lookup that read
//! the store before a completion cannot put `processing` back.
//!
//! Either side may be absent. Without a store the cache is the only record.

use crate::application::constants::{DEFAULT_CACHE_TTL, DEFAULT_OPERATION_TIMEOUT};
use crate::domain::{Job, JobId, JobStatus, StatusView};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, JobStore, StatusCache, TimeProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Tracker tuning
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// Lifetime of each cache entry from its last write
    pub cache_ttl: Duration,
    /// Bound on each individual store/cache call
    pub operation_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

pub struct JobStatusTracker {
    store: Option<Arc<dyn JobStore>>,
    cache: Option<Arc<dyn StatusCache>>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    config: TrackerConfig,
}

impl JobStatusTracker {
    pub fn new(
        store: Option<Arc<dyn JobStore>>,
        cache: Option<Arc<dyn StatusCache>>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        config: TrackerConfig,
    ) -> Self {
        if store.is_none() && cache.is_none() {
            warn!("Tracker built without store or cache; every lookup will be 'not found'");
        }
        Self {
            store,
            cache,
            id_provider,
            time_provider,
            config,
        }
    }

    /// Register a new job in `processing` and return its id
    ///
    /// Fails only if the durable store (when configured) rejects the row.
    pub async fn create(&self, event_id: &str, payload: &str, timestamp: i64) -> Result<JobId> {
        if event_id.is_empty() {
            return Err(AppError::Validation("event_id must not be empty".to_string()));
        }

        let job = Job::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            event_id,
            payload,
            timestamp,
        );

        if let Some(store) = &self.store {
            self.bounded("store.persist", store.persist(&job))
                .await
                .map_err(|e| {
                    error!(job_id = %job.id, event_id = %event_id, error = %e, "Failed to insert event");
                    e
                })?;
        }

        self.cache_write(&job.id, job.status, "create").await;

        info!(job_id = %job.id, event_id = %event_id, "Job created");
        Ok(job.id)
    }

    /// Flip a job to `done`
    ///
    /// Nothing is retried. Returns whether the authoritative record took the
    /// update: the store row when a store is configured, otherwise the cache.
    pub async fn complete(&self, job_id: &JobId) -> bool {
        let cached = self.cache_write(job_id, JobStatus::Done, "complete").await;

        let completed = match &self.store {
            Some(store) => match self
                .bounded("store.update_status", store.update_status(job_id, JobStatus::Done))
                .await
            {
                Ok(true) => true,
                Ok(false) => {
                    warn!(job_id = %job_id, "No stored row to complete");
                    false
                }
                Err(e) => {
                    error!(job_id = %job_id, error = %e, "Failed to update status in store");
                    false
                }
            },
            None => cached,
        };

        if completed {
            info!(job_id = %job_id, "Job completed");
        }
        completed
    }

    /// Look up a job's status; internal failures degrade to `not found`
    pub async fn get_status(&self, job_id: &JobId) -> StatusView {
        if let Some(cache) = &self.cache {
            match self.bounded("cache.get", cache.get(job_id)).await {
                Ok(Some(status)) => {
                    debug!(job_id = %job_id, status = %status, "Status served from cache");
                    return StatusView::Found(status);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "Failed to read status from cache");
                }
            }
        }

        let Some(store) = &self.store else {
            return StatusView::NotFound;
        };

        match self.bounded("store.read_status", store.read_status(job_id)).await {
            Ok(Some(status)) => {
                self.cache_backfill(job_id, status).await;
                StatusView::Found(status)
            }
            Ok(None) => StatusView::NotFound,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Failed to read status from store");
                StatusView::NotFound
            }
        }
    }

    /// Best-effort cache write; failures are only logged
    async fn cache_write(&self, job_id: &JobId, status: JobStatus, stage: &'static str) -> bool {
        let Some(cache) = &self.cache else {
            return false;
        };
        match self
            .bounded("cache.set", cache.set(job_id, status, self.config.cache_ttl))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    status = %status,
                    stage = stage,
                    error = %e,
                    "Failed to write status to cache"
                );
                false
            }
        }
    }

    /// Re-populate an absent cache entry from the store
    async fn cache_backfill(&self, job_id: &JobId, status: JobStatus) {
        let Some(cache) = &self.cache else {
            return;
        };
        match self
            .bounded(
                "cache.set_if_absent",
                cache.set_if_absent(job_id, status, self.config.cache_ttl),
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!(job_id = %job_id, "Cache entry appeared during lookup, backfill skipped");
            }
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    status = %status,
                    stage = "backfill",
                    error = %e,
                    "Failed to write status to cache"
                );
            }
        }
    }

    /// Apply the per-operation timeout
    async fn bounded<T>(&self, op: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.config.operation_timeout, fut)
            .await
            .map_err(|_| {
                AppError::Timeout(
                    self.config.operation_timeout.as_millis() as u64,
                    op.to_string(),
                )
            })?
    }
}
