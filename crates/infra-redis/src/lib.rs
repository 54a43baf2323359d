// Ingestion Infrastructure - Redis Adapter
// Implements: StatusCache (job_id -> status, SET ... EX)

mod status_cache;

pub use status_cache::{redis_url, RedisStatusCache};
