// Application constants (no magic values)
use std::time::Duration;

/// Delay between acceptance and the processing -> done transition (3s)
pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_secs(3);

/// Upper bound for any single store or cache call (5s)
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Cache entry lifetime, counted from the last write (24h)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Acknowledgement messages returned to ingesting clients
pub const MSG_ACCEPTED: &str = "Event received successfully";
pub const MSG_MISSING_EVENT_ID: &str = "No event id received";
pub const MSG_PERSIST_FAILED: &str = "Failed to persist event";
