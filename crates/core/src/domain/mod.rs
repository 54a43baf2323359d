// Domain Layer - Pure business logic and entities

pub mod error;
pub mod event;
pub mod job;

// Re-exports
pub use error::DomainError;
pub use event::IncomingEvent;
pub use job::{Job, JobId, JobStatus, StatusView};
