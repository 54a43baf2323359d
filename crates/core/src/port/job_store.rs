// Job Store Port (Durable Store interface)

use crate::domain::{Job, JobId, JobStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Authoritative persistence for jobs
///
/// No locking or transactions are implied. Status updates follow the
/// monotonic rule, so concurrent completions of one job converge on `done`.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job row (fails if the id already exists)
    async fn persist(&self, job: &Job) -> Result<()>;

    /// Set the status and refresh `updated_at`
    ///
    /// Returns false when no row exists for `id`. Re-applying the current
    /// status succeeds without touching the row; moving `done` back to
    /// `processing` fails with `DomainError::InvalidStateTransition`.
    async fn update_status(&self, id: &JobId, status: JobStatus) -> Result<bool>;

    /// Read only the status column
    async fn read_status(&self, id: &JobId) -> Result<Option<JobStatus>>;

    /// All jobs currently in `status`, oldest first (startup recovery)
    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>>;

    /// Connectivity check used at startup
    async fn ping(&self) -> Result<()>;
}
