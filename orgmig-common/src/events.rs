//! Migration events and the event bus
//!
//! The status field of a task is the only progress signal exposed to outside
//! callers. The bus mirrors status changes and phase boundaries so that a
//! dashboard can follow a run without polling.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::migration::{MigrationPhase, MigrationStatus};

/// Events emitted while a migration task runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MigrationEvent {
    /// Task status moved
    TaskStatusChanged {
        task_id: Uuid,
        org_id: i64,
        old_status: MigrationStatus,
        new_status: MigrationStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A phase began executing
    PhaseStarted {
        task_id: Uuid,
        phase: MigrationPhase,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A phase finished and its checkpoint was written
    PhaseCompleted {
        task_id: Uuid,
        phase: MigrationPhase,
        records_migrated: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Broadcast bus for `MigrationEvent`s
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MigrationEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<MigrationEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: MigrationEvent,
    ) -> Result<usize, broadcast::error::SendError<MigrationEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MigrationEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_status_change() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let task_id = Uuid::new_v4();

        bus.emit(MigrationEvent::TaskStatusChanged {
            task_id,
            org_id: 1,
            old_status: MigrationStatus::Pending,
            new_status: MigrationStatus::Processing,
            timestamp: chrono::Utc::now(),
        })
        .unwrap();

        match rx.recv().await.unwrap() {
            MigrationEvent::TaskStatusChanged { task_id: id, new_status, .. } => {
                assert_eq!(id, task_id);
                assert_eq!(new_status, MigrationStatus::Processing);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_emit_lossy_without_subscribers() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        bus.emit_lossy(MigrationEvent::PhaseStarted {
            task_id: Uuid::new_v4(),
            phase: MigrationPhase::TopUps,
            timestamp: chrono::Utc::now(),
        });
        assert_eq!(bus.capacity(), 4);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = MigrationEvent::PhaseCompleted {
            task_id: Uuid::nil(),
            phase: MigrationPhase::ContactGroups,
            records_migrated: 3,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PhaseCompleted");
        assert_eq!(json["phase"], "contact_groups");
    }
}
