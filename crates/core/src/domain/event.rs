// Incoming Event (what a client submits for ingestion)

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingEvent {
    pub event_id: String,
    pub payload: String,
    /// Seconds since epoch, not validated
    pub timestamp: i64,
}

impl IncomingEvent {
    pub fn new(event_id: impl Into<String>, payload: impl Into<String>, timestamp: i64) -> Self {
        Self {
            event_id: event_id.into(),
            payload: payload.into(),
            timestamp,
        }
    }

    /// Only the event id is checked; payload and timestamp pass through
    pub fn validate(&self) -> Result<()> {
        if self.event_id.is_empty() {
            return Err(DomainError::ValidationError(
                "event_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_event_id_rejected() {
        let event = IncomingEvent::new("", "x", 0);
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_payload_and_timestamp_not_validated() {
        let event = IncomingEvent::new("evt-1", "", -42);
        assert!(event.validate().is_ok());
    }
}
