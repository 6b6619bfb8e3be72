//! Migration request validation
//!
//! A task is only created once the request names an organization that
//! exists on the source system under exactly the given name.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use orgmig_common::db::orgs;

use crate::db::tasks;
use crate::error::{MigrationError, MigrationResult};
use crate::models::MigrationTask;
use crate::source::SourceClient;

/// Request to migrate a source organization into `org_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRequest {
    /// Destination organization
    pub org_id: i64,
    /// Source organization id as typed by the operator
    pub source_org_id: String,
    /// Source organization name, must match the source exactly
    pub source_org_name: String,
    pub requested_by: Option<String>,
}

/// Parse an operator-supplied source organization id
pub fn parse_source_org_id(raw: &str) -> MigrationResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(MigrationError::InvalidRequest(
            "Please type the correct organization ID, only integer is acceptable.".to_string(),
        )),
    }
}

/// Validate `request` and persist a new Pending task
pub async fn request_migration(
    db: &SqlitePool,
    source: &dyn SourceClient,
    request: &MigrationRequest,
    default_requested_by: &str,
) -> MigrationResult<MigrationTask> {
    let source_org_id = parse_source_org_id(&request.source_org_id)?;

    if orgs::get_org(db, request.org_id).await?.is_none() {
        return Err(MigrationError::InvalidRequest(format!(
            "Destination organization {} does not exist.",
            request.org_id
        )));
    }

    let Some(source_org) = source.fetch_organization(source_org_id).await? else {
        return Err(MigrationError::InvalidRequest(
            "The organization ID was not found on live server.".to_string(),
        ));
    };

    if source_org.name != request.source_org_name {
        return Err(MigrationError::InvalidRequest(
            "The organization name does not match with the organization name on live server."
                .to_string(),
        ));
    }

    let requested_by = request
        .requested_by
        .as_deref()
        .filter(|who| !who.trim().is_empty())
        .unwrap_or(default_requested_by);

    let task = MigrationTask::new(request.org_id, source_org_id, requested_by);
    tasks::save_task(db, &task).await?;

    tracing::info!(
        task_id = %task.task_id,
        org_id = task.org_id,
        source_org_id,
        requested_by = %task.requested_by,
        "Migration requested"
    );

    Ok(task)
}
