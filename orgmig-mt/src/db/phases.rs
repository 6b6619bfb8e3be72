//! Per-phase completion markers
//!
//! A marker is written once a phase has finished; a resumed run skips every
//! phase that has one.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashSet;
use uuid::Uuid;

use orgmig_common::MigrationPhase;

use crate::error::MigrationResult;

pub async fn mark_completed(
    pool: &SqlitePool,
    task_id: Uuid,
    phase: MigrationPhase,
    records_migrated: usize,
) -> MigrationResult<()> {
    sqlx::query(
        r#"
        INSERT INTO migration_phases (task_id, phase, records_migrated, completed_on)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(task_id, phase) DO UPDATE SET
            records_migrated = excluded.records_migrated,
            completed_on = excluded.completed_on
        "#,
    )
    .bind(task_id.to_string())
    .bind(phase.as_str())
    .bind(records_migrated as i64)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn completed_phases(
    pool: &SqlitePool,
    task_id: Uuid,
) -> MigrationResult<HashSet<MigrationPhase>> {
    let names: Vec<String> = sqlx::query_scalar("SELECT phase FROM migration_phases WHERE task_id = ?")
        .bind(task_id.to_string())
        .fetch_all(pool)
        .await?;

    let mut phases = HashSet::with_capacity(names.len());
    for name in names {
        phases.insert(name.parse::<MigrationPhase>()?);
    }

    Ok(phases)
}

pub async fn clear(pool: &SqlitePool, task_id: Uuid) -> MigrationResult<u64> {
    let result = sqlx::query("DELETE FROM migration_phases WHERE task_id = ?")
        .bind(task_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
