//! # orgmig common library
//!
//! Shared code for the organization migration service:
//! - Destination database schema and per-entity repositories
//! - Configuration loading and root folder resolution
//! - Migration event types and the event bus
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod migration;

pub use error::{Error, Result};
pub use migration::{MigrationPhase, MigrationStatus};
