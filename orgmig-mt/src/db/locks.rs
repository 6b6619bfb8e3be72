//! Destination-organization locks
//!
//! At most one task migrates into a destination organization at a time.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::tasks;
use crate::error::{MigrationError, MigrationResult};

/// Take the lock on `org_id` for `task_id`.
///
/// Re-acquiring a lock the task already holds succeeds. A lock left behind
/// by a task that has since reached a terminal status is taken over.
pub async fn acquire(pool: &SqlitePool, org_id: i64, task_id: Uuid) -> MigrationResult<()> {
    sqlx::query("INSERT OR IGNORE INTO migration_locks (org_id, task_id, acquired_on) VALUES (?, ?, ?)")
        .bind(org_id)
        .bind(task_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    let held_by = holder(pool, org_id).await?.ok_or_else(|| {
        orgmig_common::Error::Internal(format!("Lock row for org {} vanished", org_id))
    })?;

    if held_by == task_id {
        return Ok(());
    }

    let stale = match tasks::load_task(pool, held_by).await? {
        Some(holder_task) => holder_task.is_terminal(),
        None => true,
    };

    if !stale {
        return Err(MigrationError::Locked { org_id, held_by });
    }

    tracing::warn!(
        org_id,
        stale_task_id = %held_by,
        task_id = %task_id,
        "Taking over stale migration lock"
    );

    let taken = sqlx::query("UPDATE migration_locks SET task_id = ?, acquired_on = ? WHERE org_id = ? AND task_id = ?")
        .bind(task_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(org_id)
        .bind(held_by.to_string())
        .execute(pool)
        .await?
        .rows_affected();

    if taken == 0 {
        let current = holder(pool, org_id).await?.unwrap_or(held_by);
        if current != task_id {
            return Err(MigrationError::Locked { org_id, held_by: current });
        }
    }

    Ok(())
}

/// Release the lock if `task_id` holds it
pub async fn release(pool: &SqlitePool, org_id: i64, task_id: Uuid) -> MigrationResult<bool> {
    let released = sqlx::query("DELETE FROM migration_locks WHERE org_id = ? AND task_id = ?")
        .bind(org_id)
        .bind(task_id.to_string())
        .execute(pool)
        .await?
        .rows_affected();

    Ok(released > 0)
}

/// Holder of the lock on `org_id`, ignoring a lock left by a finished task
pub async fn active_holder(pool: &SqlitePool, org_id: i64) -> MigrationResult<Option<Uuid>> {
    let Some(held_by) = holder(pool, org_id).await? else {
        return Ok(None);
    };

    match tasks::load_task(pool, held_by).await? {
        Some(task) if !task.is_terminal() => Ok(Some(held_by)),
        _ => Ok(None),
    }
}

pub async fn holder(pool: &SqlitePool, org_id: i64) -> MigrationResult<Option<Uuid>> {
    let task_id: Option<String> = sqlx::query_scalar("SELECT task_id FROM migration_locks WHERE org_id = ?")
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

    task_id
        .map(|id| {
            Uuid::parse_str(&id).map_err(|e| {
                MigrationError::Common(orgmig_common::Error::Internal(format!(
                    "Bad lock holder {}: {}",
                    id, e
                )))
            })
        })
        .transpose()
}
