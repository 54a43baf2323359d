// Ingestion Infrastructure - In-Memory Adapters
// Implements: JobStore (process-wide table), StatusCache (key -> status with TTL)

mod job_store;
mod status_cache;

pub use job_store::InMemoryJobStore;
pub use status_cache::InMemoryStatusCache;
