//! Contacts phase: additive get-or-create by uuid, existing contacts win

use orgmig_common::db::contacts::{self, NewContact};

use super::MigrationOrchestrator;
use crate::error::MigrationResult;
use crate::models::{EntityKind, MigrationTask};
use crate::services::ProgressLog;

impl MigrationOrchestrator {
    pub(super) async fn phase_contacts(
        &self,
        task: &MigrationTask,
        log: &ProgressLog,
    ) -> MigrationResult<usize> {
        let source_contacts = self.source.fetch_contacts(task.source_org_id).await?;

        for source_contact in &source_contacts {
            log.record(
                "Contact",
                &source_contact.uuid,
                source_contact.name.as_deref().unwrap_or_default(),
            );

            let (contact, _created) = contacts::get_or_create(
                &self.db,
                task.org_id,
                &NewContact {
                    uuid: source_contact.uuid.clone(),
                    name: source_contact.name.clone(),
                    language: source_contact.language.clone(),
                    is_active: source_contact.is_active,
                    is_blocked: source_contact.is_blocked,
                    is_stopped: source_contact.is_stopped,
                },
                &task.requested_by,
            )
            .await?;

            self.associations
                .record(task, EntityKind::Contact, source_contact.id, contact.id)
                .await?;
        }

        Ok(source_contacts.len())
    }
}
