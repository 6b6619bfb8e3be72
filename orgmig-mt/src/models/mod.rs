//! Data models for orgmig-mt

pub mod entity_kind;
pub mod migration_task;

pub use entity_kind::EntityKind;
pub use migration_task::{MigrationTask, StatusTransition};
