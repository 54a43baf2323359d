// In-Memory StatusCache Implementation

use async_trait::async_trait;
use ingestion_core::application::ShutdownToken;
use ingestion_core::domain::{JobId, JobStatus};
use ingestion_core::error::Result;
use ingestion_core::port::StatusCache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
struct Entry {
    status: JobStatus,
    expires_at: Instant,
}

/// Job id -> status with per-entry expiry
///
/// Expired entries read as absent and are dropped lazily on read or in bulk
/// by `purge_expired`. Uses tokio's clock so paused-time tests can expire
/// entries without waiting.
#[derive(Default)]
pub struct InMemoryStatusCache {
    entries: Mutex<HashMap<JobId, Entry>>,
}

impl InMemoryStatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live (unexpired) entry count
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Periodic purge loop (spawn with tokio::spawn)
    pub async fn run_janitor(self: Arc<Self>, every: Duration, mut shutdown: ShutdownToken) {
        info!(interval_secs = every.as_secs(), "Cache janitor started");
        let mut tick = interval(every);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let purged = self.purge_expired().await;
                    if purged > 0 {
                        debug!(purged, "Purged expired cache entries");
                    }
                }
                _ = shutdown.wait() => break,
            }
        }
        info!("Cache janitor stopped");
    }
}

#[async_trait]
impl StatusCache for InMemoryStatusCache {
    async fn set(&self, id: &JobId, status: JobStatus, ttl: Duration) -> Result<()> {
        let entry = Entry {
            status,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.insert(id.clone(), entry);
        Ok(())
    }

    async fn set_if_absent(&self, id: &JobId, status: JobStatus, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if entries.get(id).is_some_and(|entry| entry.expires_at > now) {
            return Ok(false);
        }
        entries.insert(
            id.clone(),
            Entry {
                status,
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn get(&self, id: &JobId) -> Result<Option<JobStatus>> {
        let mut entries = self.entries.lock().await;
        match entries.get(id).copied() {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.status)),
            Some(_) => {
                entries.remove(id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
