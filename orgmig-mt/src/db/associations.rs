//! Association record rows

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::MigrationResult;
use crate::models::EntityKind;

pub async fn insert(
    pool: &SqlitePool,
    task_id: Uuid,
    kind: EntityKind,
    source_id: i64,
    destination_id: i64,
) -> MigrationResult<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO migration_associations (task_id, entity_kind, source_id, destination_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(task_id.to_string())
    .bind(kind.as_str())
    .bind(source_id)
    .bind(destination_id)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Destination id of the most recently written matching record
pub async fn latest_destination_id(
    pool: &SqlitePool,
    task_id: Uuid,
    kind: EntityKind,
    source_id: i64,
) -> MigrationResult<Option<i64>> {
    let destination_id = sqlx::query_scalar(
        r#"
        SELECT destination_id FROM migration_associations
        WHERE task_id = ? AND entity_kind = ? AND source_id = ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(task_id.to_string())
    .bind(kind.as_str())
    .bind(source_id)
    .fetch_optional(pool)
    .await?;

    Ok(destination_id)
}

pub async fn count_for_task(pool: &SqlitePool, task_id: Uuid) -> MigrationResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM migration_associations WHERE task_id = ?")
        .bind(task_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn delete_for_task(pool: &SqlitePool, task_id: Uuid) -> MigrationResult<u64> {
    let result = sqlx::query("DELETE FROM migration_associations WHERE task_id = ?")
        .bind(task_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
