//! Migration task persistence

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use orgmig_common::Error;

use crate::error::MigrationResult;
use crate::models::MigrationTask;
use crate::utils::db_retry::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    task_id: String,
    org_id: i64,
    source_org_id: i64,
    status: String,
    requested_by: String,
    created_on: String,
    modified_on: String,
}

impl TryFrom<TaskRow> for MigrationTask {
    type Error = Error;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(MigrationTask {
            task_id: Uuid::parse_str(&row.task_id)
                .map_err(|e| Error::Internal(format!("Bad task id {}: {}", row.task_id, e)))?,
            org_id: row.org_id,
            source_org_id: row.source_org_id,
            status: row.status.parse()?,
            requested_by: row.requested_by,
            created_on: parse_timestamp(&row.created_on)?,
            modified_on: parse_timestamp(&row.modified_on)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Bad timestamp {}: {}", value, e)))
}

const TASK_COLUMNS: &str =
    "task_id, org_id, source_org_id, status, requested_by, created_on, modified_on";

/// Insert or update a task row
pub async fn save_task(pool: &SqlitePool, task: &MigrationTask) -> MigrationResult<()> {
    let task_id = task.task_id.to_string();
    let status = task.status.as_str();
    let created_on = task.created_on.to_rfc3339();
    let modified_on = task.modified_on.to_rfc3339();

    retry_on_lock("save_task", DEFAULT_MAX_LOCK_WAIT_MS, || async {
        sqlx::query(
            r#"
            INSERT INTO migration_tasks (
                task_id, org_id, source_org_id, status, requested_by, created_on, modified_on
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(task_id) DO UPDATE SET
                status = excluded.status,
                modified_on = excluded.modified_on
            "#,
        )
        .bind(&task_id)
        .bind(task.org_id)
        .bind(task.source_org_id)
        .bind(status)
        .bind(&task.requested_by)
        .bind(&created_on)
        .bind(&modified_on)
        .execute(pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    })
    .await?;

    Ok(())
}

pub async fn load_task(pool: &SqlitePool, task_id: Uuid) -> MigrationResult<Option<MigrationTask>> {
    let row = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {} FROM migration_tasks WHERE task_id = ?",
        TASK_COLUMNS
    ))
    .bind(task_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(MigrationTask::try_from).transpose()?)
}

/// Tasks targeting `org_id`, newest first
pub async fn list_for_org(pool: &SqlitePool, org_id: i64) -> MigrationResult<Vec<MigrationTask>> {
    let rows = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {} FROM migration_tasks WHERE org_id = ? ORDER BY created_on DESC, rowid DESC",
        TASK_COLUMNS
    ))
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    let tasks = rows
        .into_iter()
        .map(MigrationTask::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use orgmig_common::{db::orgs, MigrationStatus};

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let pool = open_memory_database().await.unwrap();
        let org = orgs::create_org(&pool, "Destination").await.unwrap();

        let mut task = MigrationTask::new(org.id, 77, "admin");
        save_task(&pool, &task).await.unwrap();

        task.transition_to(MigrationStatus::Processing).unwrap();
        save_task(&pool, &task).await.unwrap();

        let loaded = load_task(&pool, task.task_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, MigrationStatus::Processing);
        assert_eq!(loaded.source_org_id, 77);
        assert_eq!(loaded.requested_by, "admin");
        assert_eq!(loaded.created_on.timestamp(), task.created_on.timestamp());
    }

    #[tokio::test]
    async fn test_load_unknown_task() {
        let pool = open_memory_database().await.unwrap();
        assert!(load_task(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_for_org_newest_first() {
        let pool = open_memory_database().await.unwrap();
        let org = orgs::create_org(&pool, "Destination").await.unwrap();

        let first = MigrationTask::new(org.id, 1, "admin");
        save_task(&pool, &first).await.unwrap();
        let second = MigrationTask::new(org.id, 2, "admin");
        save_task(&pool, &second).await.unwrap();

        let tasks = list_for_org(&pool, org.id).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task_id, second.task_id);
        assert!(list_for_org(&pool, org.id + 1).await.unwrap().is_empty());
    }
}
