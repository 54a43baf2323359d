// In-Memory JobStore Implementation

use async_trait::async_trait;
use ingestion_core::domain::{Job, JobId, JobStatus};
use ingestion_core::error::{AppError, Result};
use ingestion_core::port::{JobStore, TimeProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-wide job table
///
/// Lookups take the read lock, inserts and updates the write lock, so a
/// reader never observes a half-inserted row. Contents die with the process.
pub struct InMemoryJobStore {
    rows: RwLock<HashMap<JobId, Job>>,
    time_provider: Arc<dyn TimeProvider>,
}

impl InMemoryJobStore {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            time_provider,
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Full row, for diagnostics and tests
    pub async fn get(&self, id: &str) -> Option<Job> {
        self.rows.read().await.get(id).cloned()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn persist(&self, job: &Job) -> Result<()> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&job.id) {
            return Err(AppError::Store(format!(
                "Unique constraint violation: job_id {}",
                job.id
            )));
        }
        rows.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn update_status(&self, id: &JobId, status: JobStatus) -> Result<bool> {
        let now = self.time_provider.now_millis();
        let mut rows = self.rows.write().await;
        match rows.get_mut(id) {
            Some(job) => {
                job.apply_status(status, now)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn read_status(&self, id: &JobId) -> Result<Option<JobStatus>> {
        Ok(self.rows.read().await.get(id).map(|job| job.status))
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .rows
            .read()
            .await
            .values()
            .filter(|job| job.status == status)
            .cloned()
            .collect();
        jobs.sort_by_key(|job| job.created_at);
        Ok(jobs)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
