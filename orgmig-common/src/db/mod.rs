//! Destination database access
//!
//! One module per destination entity kind. Every lookup by id is scoped to
//! an organization so that a migration can never reach another org's rows.

pub mod channels;
pub mod contact_fields;
pub mod contact_groups;
pub mod contacts;
pub mod init;
pub mod languages;
pub mod orgs;
pub mod topups;

pub use init::*;
