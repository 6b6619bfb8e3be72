//! Engine-owned tables
//!
//! Task rows, association records, phase checkpoints and per-org locks live
//! next to the destination tables but belong to the migration engine.

pub mod associations;
pub mod locks;
pub mod phases;
pub mod tasks;

use sqlx::SqlitePool;
use std::path::Path;

use crate::error::MigrationResult;

/// Open the destination database and make sure engine tables exist
pub async fn open_database(db_path: &Path) -> MigrationResult<SqlitePool> {
    let pool = orgmig_common::db::init_database(db_path).await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// In-memory database with destination and engine tables
pub async fn open_memory_database() -> MigrationResult<SqlitePool> {
    let pool = orgmig_common::db::init_memory_database().await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create engine tables (idempotent)
pub async fn init_tables(pool: &SqlitePool) -> MigrationResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migration_tasks (
            task_id TEXT PRIMARY KEY,
            org_id INTEGER NOT NULL REFERENCES orgs(id),
            source_org_id INTEGER NOT NULL,
            status TEXT NOT NULL,
            requested_by TEXT NOT NULL,
            created_on TEXT NOT NULL,
            modified_on TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_migration_tasks_org ON migration_tasks(org_id)")
        .execute(pool)
        .await?;

    // No uniqueness: duplicate writes are tolerated, lookups take the newest
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migration_associations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id TEXT NOT NULL REFERENCES migration_tasks(task_id),
            entity_kind TEXT NOT NULL,
            source_id INTEGER NOT NULL,
            destination_id INTEGER NOT NULL,
            created_on TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_migration_associations_lookup \
         ON migration_associations(task_id, entity_kind, source_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migration_phases (
            task_id TEXT NOT NULL REFERENCES migration_tasks(task_id),
            phase TEXT NOT NULL,
            records_migrated INTEGER NOT NULL DEFAULT 0,
            completed_on TEXT NOT NULL,
            PRIMARY KEY (task_id, phase)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migration_locks (
            org_id INTEGER PRIMARY KEY,
            task_id TEXT NOT NULL,
            acquired_on TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_tables_is_idempotent() {
        let pool = open_memory_database().await.unwrap();
        init_tables(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name LIKE 'migration_%'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 4);
    }
}
