//! Mock port implementations for tests
//!
//! Core cannot depend on the adapter crates, so these stand in for them in
//! unit tests here and in downstream crates.

use crate::domain::{Job, JobId, JobStatus};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, JobStore, StatusCache, TimeProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Deterministic ids: job-1, job-2, ...
#[derive(Default)]
pub struct SequentialIdProvider {
    counter: AtomicU64,
}

impl IdProvider for SequentialIdProvider {
    fn generate_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("job-{}", n)
    }
}

/// Manually driven clock
pub struct MockTimeProvider {
    now: AtomicI64,
}

impl MockTimeProvider {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Job store backed by a HashMap with switchable failures
#[derive(Default)]
pub struct MockJobStore {
    rows: Mutex<HashMap<JobId, Job>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    writes: AtomicUsize,
}

impl MockJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.set_fail_writes(true);
        store.set_fail_reads(true);
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Successful persist + update calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn row(&self, id: &str) -> Option<Job> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    /// Seed a row directly, bypassing counters
    pub fn insert_row(&self, job: Job) {
        self.rows.lock().unwrap().insert(job.id.clone(), job);
    }
}

#[async_trait]
impl JobStore for MockJobStore {
    async fn persist(&self, job: &Job) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Store("mock store unavailable".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&job.id) {
            return Err(AppError::Store(format!("duplicate job id {}", job.id)));
        }
        rows.insert(job.id.clone(), job.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_status(&self, id: &JobId, status: JobStatus) -> Result<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Store("mock store unavailable".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(id) {
            Some(job) => {
                let now = job.updated_at;
                job.apply_status(status, now)?;
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn read_status(&self, id: &JobId) -> Result<Option<JobStatus>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Store("mock store unavailable".to_string()));
        }
        Ok(self.rows.lock().unwrap().get(id).map(|job| job.status))
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Store("mock store unavailable".to_string()));
        }
        let mut jobs: Vec<Job> = self
            .rows
            .lock()
            .unwrap()
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

/// Status cache backed by a HashMap (TTL recorded, not enforced)
#[derive(Default)]
pub struct MockStatusCache {
    entries: Mutex<HashMap<JobId, (JobStatus, Duration)>>,
    fail: AtomicBool,
    sets: AtomicUsize,
}

impl MockStatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let cache = Self::default();
        cache.set_fail(true);
        cache
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Direct read, bypassing the failure switch
    pub fn entry(&self, id: &str) -> Option<(JobStatus, Duration)> {
        self.entries.lock().unwrap().get(id).copied()
    }

    pub fn remove(&self, id: &str) {
        self.entries.lock().unwrap().remove(id);
    }
}

#[async_trait]
impl StatusCache for MockStatusCache {
    async fn set(&self, id: &JobId, status: JobStatus, ttl: Duration) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Cache("mock cache unavailable".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(id.clone(), (status, ttl));
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_if_absent(&self, id: &JobId, status: JobStatus, ttl: Duration) -> Result<bool> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Cache("mock cache unavailable".to_string()));
        }
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(id) {
            return Ok(false);
        }
        entries.insert(id.clone(), (status, ttl));
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn get(&self, id: &JobId) -> Result<Option<JobStatus>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Cache("mock cache unavailable".to_string()));
        }
        Ok(self.entries.lock().unwrap().get(id).map(|(status, _)| *status))
    }

    async fn ping(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Cache("mock cache unavailable".to_string()));
        }
        Ok(())
    }
}

/// Cache that never answers (for per-operation timeout tests)
pub struct HangingStatusCache;

#[async_trait]
impl StatusCache for HangingStatusCache {
    async fn set(&self, _id: &JobId, _status: JobStatus, _ttl: Duration) -> Result<()> {
        std::future::pending().await
    }

    async fn set_if_absent(&self, _id: &JobId, _status: JobStatus, _ttl: Duration) -> Result<bool> {
        std::future::pending().await
    }

    async fn get(&self, _id: &JobId) -> Result<Option<JobStatus>> {
        std::future::pending().await
    }

    async fn ping(&self) -> Result<()> {
        std::future::pending().await
    }
}

/// Store that never answers (for per-operation timeout tests)
pub struct HangingJobStore;

#[async_trait]
impl JobStore for HangingJobStore {
    async fn persist(&self, _job: &Job) -> Result<()> {
        std::future::pending().await
    }

    async fn update_status(&self, _id: &JobId, _status: JobStatus) -> Result<bool> {
        std::future::pending().await
    }

    async fn read_status(&self, _id: &JobId) -> Result<Option<JobStatus>> {
        std::future::pending().await
    }

    async fn find_by_status(&self, _status: JobStatus) -> Result<Vec<Job>> {
        std::future::pending().await
    }

    async fn ping(&self) -> Result<()> {
        std::future::pending().await
    }
}
