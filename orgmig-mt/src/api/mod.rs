//! HTTP status surface

pub mod health;
pub mod migrations;

pub use health::health_routes;
pub use migrations::migration_routes;
