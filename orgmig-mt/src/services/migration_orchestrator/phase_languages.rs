//! Languages phase
//!
//! Destructive reset, then import, then primary-language fix-up. The fix-up
//! resolves through associations, so it only runs once every language exists.

use orgmig_common::db::{languages, orgs};

use super::MigrationOrchestrator;
use crate::error::MigrationResult;
use crate::models::{EntityKind, MigrationTask};
use crate::services::{DestinationEntity, ProgressLog};
use crate::source::SourceOrg;

impl MigrationOrchestrator {
    pub(super) async fn phase_languages(
        &self,
        task: &MigrationTask,
        source_org: &SourceOrg,
        log: &ProgressLog,
    ) -> MigrationResult<usize> {
        orgs::set_primary_language(&self.db, task.org_id, None).await?;
        let deleted = languages::delete_active(&self.db, task.org_id).await?;
        tracing::debug!(task_id = %task.task_id, deleted, "Deleted existing languages");

        let source_languages = self.source.fetch_languages(task.source_org_id).await?;

        for source_language in &source_languages {
            log.record("Language", source_language.id, &source_language.name);

            let language = languages::create_language(
                &self.db,
                task.org_id,
                &source_language.name,
                &source_language.iso_code,
                &task.requested_by,
            )
            .await?;

            self.associations
                .record(task, EntityKind::OrgLanguage, source_language.id, language.id)
                .await?;
        }

        if source_languages.is_empty() {
            return Ok(0);
        }

        if let Some(primary_id) = source_org.primary_language_id {
            if let Some(DestinationEntity::Language(language)) = self
                .associations
                .resolve(EntityKind::OrgLanguage, primary_id, task)
                .await?
            {
                orgs::set_primary_language(&self.db, task.org_id, Some(language.id)).await?;
                log.line(&format!("Primary language set to {}", language.iso_code));
            }
        }

        Ok(source_languages.len())
    }
}
