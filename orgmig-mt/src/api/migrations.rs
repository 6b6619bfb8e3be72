//! Migration endpoints
//!
//! POST /migrations, GET /migrations/:task_id, GET /orgs/:org_id/migrations

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use orgmig_common::MigrationStatus;

use crate::db::{locks, tasks};
use crate::error::{ApiError, ApiResult, MigrationError};
use crate::models::MigrationTask;
use crate::services::{request_migration, MigrationRequest};
use crate::AppState;

/// Externally visible view of a task
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task_id: Uuid,
    pub org_id: i64,
    pub source_org_id: i64,
    pub status: MigrationStatus,
    pub requested_by: String,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl From<MigrationTask> for TaskResponse {
    fn from(task: MigrationTask) -> Self {
        Self {
            task_id: task.task_id,
            org_id: task.org_id,
            source_org_id: task.source_org_id,
            status: task.status,
            requested_by: task.requested_by,
            created_on: task.created_on,
            modified_on: task.modified_on,
        }
    }
}

/// POST /migrations
///
/// Validates the request, creates a Pending task, takes the org lock for
/// it and runs it in the background. Returns 202 with the task as created.
/// A task that loses the lock to a concurrent request is marked Failed and
/// the request gets 409.
pub async fn start_migration(
    State(state): State<AppState>,
    Json(request): Json<MigrationRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    if let Some(held_by) = locks::active_holder(&state.db, request.org_id).await? {
        return Err(MigrationError::Locked {
            org_id: request.org_id,
            held_by,
        }
        .into());
    }

    let mut task = request_migration(
        &state.db,
        state.orchestrator.source(),
        &request,
        &state.requested_by,
    )
    .await?;

    state.orchestrator.claim(&mut task).await?;

    let response = TaskResponse::from(task.clone());

    let orchestrator = state.orchestrator.clone();
    let last_error = state.last_error.clone();
    let task_id = task.task_id;
    tokio::spawn(async move {
        match orchestrator.perform(task).await {
            Ok(task) => {
                tracing::info!(task_id = %task_id, status = %task.status, "Background migration finished");
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Background migration failed");
                *last_error.write().await = Some(format!("task {}: {}", task_id, e));
            }
        }
    });

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /migrations/:task_id
pub async fn get_migration(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = tasks::load_task(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Migration task {}", task_id)))?;

    Ok(Json(task.into()))
}

/// GET /orgs/:org_id/migrations, newest first
pub async fn list_org_migrations(
    State(state): State<AppState>,
    Path(org_id): Path<i64>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = tasks::list_for_org(&state.db, org_id).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// Build migration routes
pub fn migration_routes() -> Router<AppState> {
    Router::new()
        .route("/migrations", post(start_migration))
        .route("/migrations/:task_id", get(get_migration))
        .route("/orgs/:org_id/migrations", get(list_org_migrations))
}
