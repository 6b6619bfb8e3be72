//! orgmig-mt library interface
//!
//! Migration task engine: task model, source clients, association store,
//! phased orchestrator and the HTTP status surface. Exposed as a library
//! for the binary and for integration tests.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod source;
pub mod utils;

pub use crate::error::{ApiError, ApiResult, MigrationError, MigrationResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use orgmig_common::events::EventBus;

use crate::services::MigrationOrchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub event_bus: EventBus,
    pub orchestrator: Arc<MigrationOrchestrator>,
    /// Creator recorded when a request names nobody
    pub requested_by: String,
    pub startup_time: DateTime<Utc>,
    /// Last background migration error, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<MigrationOrchestrator>,
        event_bus: EventBus,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            db: orchestrator.db().clone(),
            event_bus,
            orchestrator,
            requested_by: requested_by.into(),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::migration_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
