//! Error types for orgmig-mt
//!
//! `MigrationError` is what the engine returns; `ApiError` is what the HTTP
//! surface renders.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use orgmig_common::MigrationStatus;

use crate::source::SourceError;

/// Errors raised while requesting, running or inspecting a migration
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Destination repository error
    #[error(transparent)]
    Common(#[from] orgmig_common::Error),

    /// Engine-owned table error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Source system unreachable or returned garbage
    #[error("Source system error: {0}")]
    Source(#[from] SourceError),

    /// Another task holds the destination org
    #[error("Organization {org_id} is already being migrated by task {held_by}")]
    Locked { org_id: i64, held_by: Uuid },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: MigrationStatus,
        to: MigrationStatus,
    },

    #[error("Migration task not found: {0}")]
    TaskNotFound(Uuid),

    /// Request rejected before any task was created
    #[error("Invalid migration request: {0}")]
    InvalidRequest(String),
}

/// Result type for engine operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. org already being migrated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Common error: {0}")]
    Common(#[from] orgmig_common::Error),
}

impl From<MigrationError> for ApiError {
    fn from(err: MigrationError) -> Self {
        match err {
            MigrationError::TaskNotFound(_) => ApiError::NotFound(err.to_string()),
            MigrationError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            MigrationError::Locked { .. } | MigrationError::InvalidTransition { .. } => {
                ApiError::Conflict(err.to_string())
            }
            MigrationError::Common(inner) => ApiError::Common(inner),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_errors_map_to_http_classes() {
        let not_found: ApiError = MigrationError::TaskNotFound(Uuid::new_v4()).into();
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let invalid: ApiError = MigrationError::InvalidRequest("bad id".to_string()).into();
        assert!(matches!(invalid, ApiError::BadRequest(ref m) if m == "bad id"));

        let locked: ApiError = MigrationError::Locked {
            org_id: 3,
            held_by: Uuid::new_v4(),
        }
        .into();
        assert!(matches!(locked, ApiError::Conflict(_)));

        let source: ApiError = MigrationError::Source(SourceError::Network("down".into())).into();
        assert!(matches!(source, ApiError::Internal(_)));
    }

    #[test]
    fn test_error_response_status() {
        let response = ApiError::Conflict("busy".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
