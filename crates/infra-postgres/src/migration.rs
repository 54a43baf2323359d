// Migration Runner

use ingestion_core::error::{AppError, Result};
use sqlx::{PgConnection, PgPool};
use tracing::info;

/// Ordered (version, description, sql)
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "Create events table",
    include_str!("../migrations/001_create_events.sql"),
)];

/// Advisory lock key serializing concurrent migration runs
const MIGRATION_LOCK_KEY: i64 = 0x6576_656e_7473;

/// Run database migrations (idempotent)
///
/// Runs in one transaction under an advisory lock, so several processes
/// starting at once apply each migration exactly once.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    let mut tx = pool.begin().await.map_err(migration_error)?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *tx)
        .await
        .map_err(migration_error)?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version BIGINT PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT NOW()
        )",
    )
    .execute(&mut *tx)
    .await
    .map_err(migration_error)?;

    let current_version: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
            .fetch_one(&mut *tx)
            .await
            .map_err(migration_error)?;

    info!("Current schema version: {}", current_version);

    for (version, description, sql) in MIGRATIONS {
        if current_version < *version {
            info!("Applying migration {:03}: {}", version, description);
            apply_migration(&mut tx, *version, sql).await?;
        }
    }

    tx.commit().await.map_err(migration_error)?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Apply a single migration SQL file and record its version
async fn apply_migration(tx: &mut PgConnection, version: i64, sql: &str) -> Result<()> {
    for statement in split_statements(sql) {
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(migration_error)?;
    }

    sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(migration_error)?;

    Ok(())
}

/// Split on ';' and strip `--` comment lines
fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|statement| {
            statement
                .lines()
                .filter(|line| !line.trim().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|statement| !statement.is_empty())
        .collect()
}

fn migration_error(err: sqlx::Error) -> AppError {
    AppError::Store(format!("Migration failed: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_pool;

    #[test]
    fn test_split_statements_drops_comments() {
        let statements = split_statements(include_str!("../migrations/001_create_events.sql"));

        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS events"));
        assert!(statements[1].starts_with("CREATE INDEX IF NOT EXISTS"));
    }

    #[tokio::test]
    async fn test_run_migrations_twice() {
        let Some(pool) = test_pool().await else {
            return;
        };

        // test_pool already migrated once
        run_migrations(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
