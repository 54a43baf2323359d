// Application Layer - Use Cases and Business Logic

pub mod completion;
pub mod constants;
pub mod ingestion;
pub mod recovery;
pub mod tracker;

// Re-exports
pub use completion::{shutdown_channel, CompletionScheduler, ShutdownSender, ShutdownToken};
pub use ingestion::{IngestAck, IngestionService};
pub use recovery::RecoveryService;
pub use tracker::{JobStatusTracker, TrackerConfig};
