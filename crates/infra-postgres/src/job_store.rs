// PostgreSQL JobStore Implementation

use async_trait::async_trait;
use ingestion_core::domain::{DomainError, Job, JobId, JobStatus};
use ingestion_core::error::{AppError, Result};
use ingestion_core::port::JobStore;
use sqlx::types::chrono::NaiveDateTime;
use sqlx::PgPool;

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // PostgreSQL SQLSTATE codes
                match code_str {
                    "23505" => AppError::Store(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "23502" => AppError::Store(format!(
                        "Not-null constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "42P01" => AppError::Store(format!(
                        "Table missing (migrations not run?): {}",
                        db_err.message()
                    )),
                    "53300" => AppError::Store(format!(
                        "Too many connections: {}",
                        db_err.message()
                    )),
                    _ => AppError::Store(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Store(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::PoolTimedOut => {
            AppError::Store("Timed out waiting for a pooled connection".to_string())
        }
        sqlx::Error::ColumnNotFound(col) => AppError::Store(format!("Column not found: {}", col)),
        _ => {
            // Connection, protocol, IO errors
            AppError::Store(err.to_string())
        }
    }
}

pub struct PostgresJobStore {
    pool: PgPool,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Full row, for diagnostics and tests
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT job_id, event_id, payload, event_timestamp, status, created_at, updated_at
            FROM events
            WHERE job_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(EventRow::into_job).transpose()
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn persist(&self, job: &Job) -> Result<()> {
        // created_at / updated_at come from the column defaults
        sqlx::query(
            r#"
            INSERT INTO events (job_id, event_id, payload, event_timestamp, status)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&job.id)
        .bind(&job.event_id)
        .bind(&job.payload)
        .bind(job.event_timestamp)
        .bind(job.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update_status(&self, id: &JobId, status: JobStatus) -> Result<bool> {
        // Only processing rows move; a row already at the target is left as is
        let result = sqlx::query(
            r#"
            UPDATE events SET status = $1, updated_at = NOW()
            WHERE job_id = $2 AND status = 'processing' AND status <> $1
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        match self.read_status(id).await? {
            None => Ok(false),
            Some(current) if current == status => Ok(true),
            Some(current) => Err(DomainError::InvalidStateTransition {
                from: current.to_string(),
                to: status.to_string(),
            }
            .into()),
        }
    }

    async fn read_status(&self, id: &JobId) -> Result<Option<JobStatus>> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM events WHERE job_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        status
            .map(|s| s.parse::<JobStatus>().map_err(AppError::from))
            .transpose()
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT job_id, event_id, payload, event_timestamp, status, created_at, updated_at
            FROM events
            WHERE status = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(EventRow::into_job).collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

/// PostgreSQL row representation of table `events`
#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    job_id: String,
    event_id: String,
    payload: Option<String>,
    event_timestamp: Option<i64>,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl EventRow {
    fn into_job(self) -> Result<Job> {
        Ok(Job {
            status: self.status.parse()?,
            id: self.job_id,
            event_id: self.event_id,
            payload: self.payload.unwrap_or_default(),
            event_timestamp: self.event_timestamp.unwrap_or_default(),
            created_at: self.created_at.and_utc().timestamp_millis(),
            updated_at: self.updated_at.and_utc().timestamp_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_pool;

    fn unique_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    #[test]
    fn test_row_with_unknown_status_is_rejected() {
        let row = EventRow {
            job_id: "job-1".to_string(),
            event_id: "evt-1".to_string(),
            payload: None,
            event_timestamp: None,
            status: "exploded".to_string(),
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        };

        assert!(matches!(row.into_job(), Err(AppError::Domain(_))));
    }

    #[test]
    fn test_row_with_null_columns() {
        let row = EventRow {
            job_id: "job-1".to_string(),
            event_id: "evt-1".to_string(),
            payload: None,
            event_timestamp: None,
            status: "processing".to_string(),
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        };

        let job = row.into_job().unwrap();
        assert_eq!(job.payload, "");
        assert_eq!(job.event_timestamp, 0);
        assert_eq!(job.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn test_persist_read_update() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let store = PostgresJobStore::new(pool);
        let job = Job::new(unique_id(), 0, "evt-123", r#"{"type":"user_signup"}"#, 1700000000);

        store.persist(&job).await.unwrap();
        assert_eq!(
            store.read_status(&job.id).await.unwrap(),
            Some(JobStatus::Processing)
        );

        let before = store.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(before.payload, job.payload);
        assert_eq!(before.event_timestamp, 1700000000);

        assert!(store.update_status(&job.id, JobStatus::Done).await.unwrap());
        let after = store.find_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(after.status, JobStatus::Done);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_done_row_never_goes_back() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let store = PostgresJobStore::new(pool);
        let job = Job::new(unique_id(), 0, "evt-1", "x", 0);
        store.persist(&job).await.unwrap();
        store.update_status(&job.id, JobStatus::Done).await.unwrap();

        let err = store
            .update_status(&job.id, JobStatus::Processing)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(_)));

        assert!(store.update_status(&job.id, JobStatus::Done).await.unwrap());
        assert_eq!(store.read_status(&job.id).await.unwrap(), Some(JobStatus::Done));
    }

    #[tokio::test]
    async fn test_duplicate_job_id_rejected() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let store = PostgresJobStore::new(pool);
        let job = Job::new(unique_id(), 0, "evt-1", "x", 0);
        store.persist(&job).await.unwrap();

        let err = store.persist(&job).await.unwrap_err();

        assert!(err.to_string().contains("Unique constraint violation"));
    }

    #[tokio::test]
    async fn test_missing_rows() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let store = PostgresJobStore::new(pool);
        let ghost = unique_id();

        assert_eq!(store.read_status(&ghost).await.unwrap(), None);
        assert!(!store.update_status(&ghost, JobStatus::Done).await.unwrap());
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_find_by_status_includes_new_processing_row() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let store = PostgresJobStore::new(pool);
        let job = Job::new(unique_id(), 0, "evt-1", "x", 0);
        store.persist(&job).await.unwrap();

        let processing = store.find_by_status(JobStatus::Processing).await.unwrap();
        assert!(processing.iter().any(|j| j.id == job.id));

        store.update_status(&job.id, JobStatus::Done).await.unwrap();
        let processing = store.find_by_status(JobStatus::Processing).await.unwrap();
        assert!(!processing.iter().any(|j| j.id == job.id));
    }
}
