//! Completion Scheduler - delayed processing -> done transitions
//!
//! One timer task per accepted job. Each task sleeps the configured delay,
//! then calls `JobStatusTracker::complete`, which runs under its own
//! per-operation timeouts and is not tied to the request that accepted the
//! job. Tasks are never joined by callers; the scheduler tracks how many are
//! in flight so shutdown and tests can observe them.

mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::tracker::JobStatusTracker;
use crate::domain::JobId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, warn};

pub struct CompletionScheduler {
    tracker: Arc<JobStatusTracker>,
    delay: Duration,
    shutdown: ShutdownToken,
    in_flight: Arc<InFlight>,
}

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count even if the task unwinds
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn enter(in_flight: Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl CompletionScheduler {
    /// Create a scheduler
    ///
    /// # Arguments
    /// * `tracker` - Tracker whose `complete` is invoked
    /// * `delay` - Fixed wait between scheduling and completion
    /// * `shutdown` - Pending timers are abandoned once this fires
    pub fn new(tracker: Arc<JobStatusTracker>, delay: Duration, shutdown: ShutdownToken) -> Self {
        Self {
            tracker,
            delay,
            shutdown,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Schedule the completion of `job_id` and return immediately
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, job_id: JobId) {
        let tracker = Arc::clone(&self.tracker);
        let mut shutdown = self.shutdown.clone();
        let guard = InFlightGuard::enter(Arc::clone(&self.in_flight));
        let delay = self.delay;

        debug!(job_id = %job_id, delay_ms = delay.as_millis() as u64, "Completion scheduled");

        tokio::spawn(async move {
            let _guard = guard;
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    tracker.complete(&job_id).await;
                }
                _ = shutdown.wait() => {
                    warn!(job_id = %job_id, "Shutdown before completion, job left in processing");
                }
            }
        });
    }

    /// Number of scheduled completions that have not finished yet
    pub fn pending(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Wait until no completion is pending
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.in_flight.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}
