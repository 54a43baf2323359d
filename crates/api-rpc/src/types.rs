//! RPC Request/Response Types
//!
//! Missing request fields take their zero value (empty string, 0), so an
//! omitted `event_id` is answered with `accepted = false` rather than a
//! protocol error. Wrongly typed fields are still `invalid params`.

use serde::{Deserialize, Serialize};

pub const METHOD_INGEST_EVENT: &str = "events.ingest.v1";
pub const METHOD_GET_STATUS: &str = "jobs.status.v1";

/// events.ingest.v1 - Ingest an event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestEventRequest {
    pub event_id: String,
    pub payload: String,
    /// Seconds since epoch
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestEventResponse {
    pub accepted: bool,
    pub message: String,
    /// Empty if not accepted
    pub job_id: String,
}

/// jobs.status.v1 - Look up a job's status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetStatusRequest {
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetStatusResponse {
    /// `processing`, `done` or `not found`
    pub status: String,
}
