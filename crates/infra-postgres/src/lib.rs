// Ingestion Infrastructure - PostgreSQL Adapter
// Implements: JobStore (durable store, table `events`)

mod connection;
mod job_store;
mod migration;

pub use connection::{create_pool, PostgresConfig};
pub use job_store::PostgresJobStore;
pub use migration::run_migrations;

// Note: sqlx::Error conversion is handled by a helper in job_store
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
