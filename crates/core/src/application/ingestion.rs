// Ingestion Use Cases - IngestEvent and GetStatus, independent of transport

use crate::application::completion::CompletionScheduler;
use crate::application::constants::{MSG_ACCEPTED, MSG_MISSING_EVENT_ID, MSG_PERSIST_FAILED};
use crate::application::tracker::JobStatusTracker;
use crate::domain::{IncomingEvent, JobId, StatusView};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Acknowledgement for one ingestion attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestAck {
    pub accepted: bool,
    pub message: String,
    /// Present only when accepted
    pub job_id: Option<JobId>,
}

impl IngestAck {
    fn accepted(job_id: JobId) -> Self {
        Self {
            accepted: true,
            message: MSG_ACCEPTED.to_string(),
            job_id: Some(job_id),
        }
    }

    fn rejected(message: &str) -> Self {
        Self {
            accepted: false,
            message: message.to_string(),
            job_id: None,
        }
    }
}

/// Ingestion Service
pub struct IngestionService {
    tracker: Arc<JobStatusTracker>,
    scheduler: Arc<CompletionScheduler>,
}

impl IngestionService {
    pub fn new(tracker: Arc<JobStatusTracker>, scheduler: Arc<CompletionScheduler>) -> Self {
        Self { tracker, scheduler }
    }

    /// Validate, create a job, schedule its completion, acknowledge
    ///
    /// Never waits for completion. Internal failures come back as
    /// `accepted = false` with a generic message.
    pub async fn ingest(&self, event: IncomingEvent) -> IngestAck {
        info!(
            event_id = %event.event_id,
            payload = %event.payload,
            timestamp = event.timestamp,
            "Received event"
        );

        if let Err(e) = event.validate() {
            warn!(error = %e, "Rejected event");
            return IngestAck::rejected(MSG_MISSING_EVENT_ID);
        }

        let job_id = match self
            .tracker
            .create(&event.event_id, &event.payload, event.timestamp)
            .await
        {
            Ok(job_id) => job_id,
            // Cause already logged by the tracker
            Err(_) => return IngestAck::rejected(MSG_PERSIST_FAILED),
        };

        self.scheduler.schedule(job_id.clone());

        IngestAck::accepted(job_id)
    }

    /// Status lookup; no validation of the id shape
    pub async fn status(&self, job_id: &JobId) -> StatusView {
        self.tracker.get_status(job_id).await
    }
}
