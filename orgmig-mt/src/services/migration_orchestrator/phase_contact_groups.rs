//! Contact groups phase
//!
//! Groups are get-or-created by uuid (then name) and aligned to the source
//! uuid. Static groups get their historical members back through contact
//! associations; members that never resolved are skipped. Dynamic groups
//! compute membership from their query and are never populated here.

use orgmig_common::db::contact_groups;

use super::MigrationOrchestrator;
use crate::error::MigrationResult;
use crate::models::{EntityKind, MigrationTask};
use crate::services::{DestinationEntity, ProgressLog};

impl MigrationOrchestrator {
    pub(super) async fn phase_contact_groups(
        &self,
        task: &MigrationTask,
        log: &ProgressLog,
    ) -> MigrationResult<usize> {
        let source_groups = self.source.fetch_contact_groups(task.source_org_id).await?;

        for source_group in &source_groups {
            log.record("Contact Group", &source_group.uuid, &source_group.name);

            let query = source_group
                .query
                .as_deref()
                .filter(|query| !query.trim().is_empty());

            let (group, _created) = contact_groups::get_or_create(
                &self.db,
                task.org_id,
                &source_group.uuid,
                &source_group.name,
                query,
                &task.requested_by,
            )
            .await?;

            if group.uuid != source_group.uuid {
                contact_groups::set_uuid(&self.db, group.id, &source_group.uuid).await?;
            }

            self.associations
                .record(task, EntityKind::ContactGroup, source_group.id, group.id)
                .await?;

            if group.is_dynamic() || source_group.is_dynamic() {
                tracing::debug!(group_id = group.id, "Dynamic group, membership not materialized");
                continue;
            }

            let mut contact_ids = Vec::new();
            for member in self.source.fetch_group_members(source_group.id).await? {
                if let Some(DestinationEntity::Contact(contact)) = self
                    .associations
                    .resolve(EntityKind::Contact, member.contact_id, task)
                    .await?
                {
                    contact_ids.push(contact.id);
                }
            }

            if !contact_ids.is_empty() {
                let added =
                    contact_groups::add_contacts(&self.db, group.id, &contact_ids, &task.requested_by)
                        .await?;
                tracing::debug!(group_id = group.id, added, "Static group members added");
            }
        }

        Ok(source_groups.len())
    }
}
