//! Migration services

pub mod association_store;
pub mod migration_orchestrator;
pub mod migration_request;
pub mod progress_log;

pub use association_store::{AssociationStore, DestinationEntity};
pub use migration_orchestrator::{MigrationOrchestrator, MigrationSettings};
pub use migration_request::{parse_source_org_id, request_migration, MigrationRequest};
pub use progress_log::ProgressLog;
