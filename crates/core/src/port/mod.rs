// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod job_store;
pub mod mocks;
pub mod status_cache;
pub mod time_provider;

// Re-exports
pub use id_provider::{IdProvider, UuidProvider};
pub use job_store::JobStore;
pub use status_cache::StatusCache;
pub use time_provider::{SystemTimeProvider, TimeProvider};
