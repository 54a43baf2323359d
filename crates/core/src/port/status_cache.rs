// Status Cache Port (Fast-Path Cache interface)

use crate::domain::{JobId, JobStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Best-effort job id -> status map with per-entry expiry
///
/// Entries may lag the store or be missing entirely.
#[async_trait]
pub trait StatusCache: Send + Sync {
    /// Write (or overwrite) an entry, expiring `ttl` after this write
    async fn set(&self, id: &JobId, status: JobStatus, ttl: Duration) -> Result<()>;

    /// Write an entry only if none is live (expired counts as absent)
    ///
    /// Returns whether the entry was written. Used to backfill from the
    /// store without clobbering a newer status written in the meantime.
    async fn set_if_absent(&self, id: &JobId, status: JobStatus, ttl: Duration) -> Result<bool>;

    /// Read an entry; expired entries read as None
    async fn get(&self, id: &JobId) -> Result<Option<JobStatus>>;

    /// Connectivity check used at startup
    async fn ping(&self) -> Result<()>;
}
