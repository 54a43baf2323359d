// Job Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Job ID (UUID v4, generated server-side)
pub type JobId = String;

/// Persisted job status
///
/// `Processing` is the only status set at creation and `Done` is the only
/// status reachable from it. There is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Done,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
        }
    }

    /// Monotonic transition rule: processing -> done, nothing else
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!((self, next), (JobStatus::Processing, JobStatus::Done))
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "processing" => Ok(JobStatus::Processing),
            "done" => Ok(JobStatus::Done),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Result of a status lookup
///
/// `NotFound` is an absence signal, never a stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusView {
    Found(JobStatus),
    NotFound,
}

impl StatusView {
    pub const NOT_FOUND: &'static str = "not found";

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusView::Found(status) => status.as_str(),
            StatusView::NotFound => Self::NOT_FOUND,
        }
    }
}

impl From<Option<JobStatus>> for StatusView {
    fn from(status: Option<JobStatus>) -> Self {
        status.map_or(StatusView::NotFound, StatusView::Found)
    }
}

impl std::fmt::Display for StatusView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job Entity: one per accepted event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub event_id: String,
    /// Opaque blob, passed through unmodified
    pub payload: String,
    /// Caller-supplied, stored verbatim
    pub event_timestamp: i64,
    pub status: JobStatus,

    pub created_at: i64, // epoch ms
    pub updated_at: i64, // epoch ms
}

impl Job {
    /// Create a new job in `Processing`
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `now_millis` - Creation timestamp in epoch ms (injected, not system time)
    /// * `event_id` - Caller-supplied event identifier
    /// * `payload` - Opaque payload
    /// * `event_timestamp` - Caller-supplied timestamp
    pub fn new(
        id: impl Into<String>,
        now_millis: i64,
        event_id: impl Into<String>,
        payload: impl Into<String>,
        event_timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            event_id: event_id.into(),
            payload: payload.into(),
            event_timestamp,
            status: JobStatus::Processing,
            created_at: now_millis,
            updated_at: now_millis,
        }
    }

    /// Move to `next` under the monotonic rule
    ///
    /// Re-applying the current status is a no-op, so a repeated completion
    /// is harmless. Anything else off the rule (done -> processing) fails
    /// and leaves the job untouched.
    pub fn apply_status(&mut self, next: JobStatus, now_millis: i64) -> Result<()> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = now_millis;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_starts_processing() {
        let job = Job::new("job-1", 1000, "evt-123", r#"{"type":"user_signup"}"#, 1700000000);

        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.created_at, 1000);
        assert_eq!(job.updated_at, 1000);
        assert_eq!(job.payload, r#"{"type":"user_signup"}"#);
    }

    #[test]
    fn test_apply_status_moves_forward_only() {
        let mut job = Job::new("job-1", 1000, "evt-123", "x", 0);

        job.apply_status(JobStatus::Done, 4000).unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.updated_at, 4000);

        // Repeat is a no-op and keeps the first completion time
        job.apply_status(JobStatus::Done, 5000).unwrap();
        assert_eq!(job.updated_at, 4000);

        let err = job.apply_status(JobStatus::Processing, 6000).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: "done".to_string(),
                to: "processing".to_string(),
            }
        );
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.updated_at, 4000);
    }

    #[test]
    fn test_transition_rule_is_monotonic() {
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Done));
        assert!(!JobStatus::Done.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Done.can_transition_to(JobStatus::Done));
    }

    #[test]
    fn test_status_parse_rejects_sentinel() {
        assert_eq!("done".parse::<JobStatus>().unwrap(), JobStatus::Done);
        assert_eq!(
            "not found".parse::<JobStatus>().unwrap_err(),
            DomainError::UnknownStatus("not found".to_string())
        );
    }

    #[test]
    fn test_status_view_rendering() {
        assert_eq!(StatusView::from(None).to_string(), "not found");
        assert_eq!(
            StatusView::from(Some(JobStatus::Processing)).to_string(),
            "processing"
        );
    }
}
