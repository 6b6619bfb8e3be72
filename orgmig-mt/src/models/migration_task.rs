//! Migration task model
//!
//! A task is one request to copy a source organization into a destination
//! organization. Its status is the only progress signal outside callers see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use orgmig_common::MigrationStatus;

use crate::error::{MigrationError, MigrationResult};

/// One migration request and its lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationTask {
    /// Unique task identifier
    pub task_id: Uuid,
    /// Destination organization
    pub org_id: i64,
    /// Organization id on the source system
    pub source_org_id: i64,
    pub status: MigrationStatus,
    /// Recorded as creator of every imported record
    pub requested_by: String,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

/// Status change record, returned by `transition_to`
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTransition {
    pub task_id: Uuid,
    pub old_status: MigrationStatus,
    pub new_status: MigrationStatus,
    pub transitioned_at: DateTime<Utc>,
}

impl MigrationTask {
    /// New task in `Pending`
    pub fn new(org_id: i64, source_org_id: i64, requested_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            task_id: Uuid::new_v4(),
            org_id,
            source_org_id,
            status: MigrationStatus::Pending,
            requested_by: requested_by.into(),
            created_on: now,
            modified_on: now,
        }
    }

    /// Move to `new_status`, refusing anything but a forward move
    pub fn transition_to(&mut self, new_status: MigrationStatus) -> MigrationResult<StatusTransition> {
        if !self.status.can_transition_to(new_status) {
            return Err(MigrationError::InvalidTransition {
                from: self.status,
                to: new_status,
            });
        }

        let transition = StatusTransition {
            task_id: self.task_id,
            old_status: self.status,
            new_status,
            transitioned_at: Utc::now(),
        };
        self.status = new_status;
        self.modified_on = transition.transitioned_at;

        Ok(transition)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
