//! Contact fields phase: additive get-or-create by key

use orgmig_common::db::contact_fields::{self, FieldDefinition};

use super::MigrationOrchestrator;
use crate::error::MigrationResult;
use crate::models::{EntityKind, MigrationTask};
use crate::services::ProgressLog;

impl MigrationOrchestrator {
    pub(super) async fn phase_contact_fields(
        &self,
        task: &MigrationTask,
        log: &ProgressLog,
    ) -> MigrationResult<usize> {
        let source_fields = self.source.fetch_contact_fields(task.source_org_id).await?;

        for source_field in &source_fields {
            log.record("Contact Field", source_field.id, &source_field.label);

            let (field, created) = contact_fields::get_or_create(
                &self.db,
                task.org_id,
                &FieldDefinition {
                    key: source_field.key.clone(),
                    label: source_field.label.clone(),
                    value_type: source_field.value_type.clone(),
                    show_in_table: source_field.show_in_table,
                },
                &task.requested_by,
            )
            .await?;

            // Identifiers are mutable: align with the source after the fact
            if field.uuid != source_field.uuid {
                contact_fields::set_uuid(&self.db, field.id, &source_field.uuid).await?;
            }

            tracing::debug!(key = %field.key, created, "Contact field imported");

            self.associations
                .record(task, EntityKind::ContactField, source_field.id, field.id)
                .await?;
        }

        Ok(source_fields.len())
    }
}
