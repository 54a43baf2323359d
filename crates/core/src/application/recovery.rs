// Startup recovery for jobs orphaned in `processing`
use crate::application::completion::CompletionScheduler;
use crate::domain::JobStatus;
use crate::error::Result;
use crate::port::JobStore;
use std::sync::Arc;
use tracing::info;

/// Recovery service
///
/// Completion timers live only in process memory. On daemon startup, every
/// row still in `processing` had its timer lost with the previous process,
/// so its completion is scheduled again. `done` rows are never touched.
pub struct RecoveryService {
    store: Arc<dyn JobStore>,
    scheduler: Arc<CompletionScheduler>,
}

impl RecoveryService {
    pub fn new(store: Arc<dyn JobStore>, scheduler: Arc<CompletionScheduler>) -> Self {
        Self { store, scheduler }
    }

    /// Reschedule completion for orphaned jobs
    ///
    /// # Returns
    /// Number of jobs rescheduled
    pub async fn recover_processing_jobs(&self) -> Result<usize> {
        info!("Starting orphaned job recovery");

        let orphaned = self.store.find_by_status(JobStatus::Processing).await?;
        let count = orphaned.len();

        for job in orphaned {
            info!(job_id = %job.id, created_at = job.created_at, "Rescheduling completion");
            self.scheduler.schedule(job.id);
        }

        info!(recovered_count = count, "Orphaned job recovery complete");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::completion::shutdown_channel;
    use crate::application::tracker::{JobStatusTracker, TrackerConfig};
    use crate::domain::Job;
    use crate::port::mocks::{MockJobStore, MockTimeProvider, SequentialIdProvider};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_recovers_only_processing_rows() {
        let store = Arc::new(MockJobStore::new());
        store.insert_row(Job::new("orphan-1", 10, "evt-1", "x", 0));
        store.insert_row(Job::new("orphan-2", 20, "evt-2", "x", 0));
        let mut finished = Job::new("finished", 5, "evt-0", "x", 0);
        finished.apply_status(JobStatus::Done, 6).unwrap();
        store.insert_row(finished);

        let tracker = Arc::new(JobStatusTracker::new(
            Some(store.clone() as Arc<dyn JobStore>),
            None,
            Arc::new(SequentialIdProvider::default()),
            Arc::new(MockTimeProvider::new(0)),
            TrackerConfig::default(),
        ));
        let (_tx, token) = shutdown_channel();
        let scheduler = Arc::new(CompletionScheduler::new(
            tracker,
            Duration::from_secs(3),
            token,
        ));
        let recovery = RecoveryService::new(store.clone(), scheduler.clone());

        let count = recovery.recover_processing_jobs().await.unwrap();
        assert_eq!(count, 2);

        scheduler.wait_idle().await;
        assert_eq!(store.row("orphan-1").unwrap().status, JobStatus::Done);
        assert_eq!(store.row("orphan-2").unwrap().status, JobStatus::Done);
        // 2 completions, the done row untouched
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(MockJobStore::failing());
        let tracker = Arc::new(JobStatusTracker::new(
            Some(store.clone() as Arc<dyn JobStore>),
            None,
            Arc::new(SequentialIdProvider::default()),
            Arc::new(MockTimeProvider::new(0)),
            TrackerConfig::default(),
        ));
        let (_tx, token) = shutdown_channel();
        let scheduler = Arc::new(CompletionScheduler::new(tracker, Duration::from_secs(3), token));

        let result = RecoveryService::new(store, scheduler).recover_processing_jobs().await;

        assert!(result.is_err());
    }
}
