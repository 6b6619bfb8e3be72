//! TopUps phase
//!
//! Destructive reset: every active destination top-up is deactivated before
//! the source top-ups and their usage entries are recreated.

use tracing::debug;

use orgmig_common::db::topups::{self, NewTopUp};

use super::MigrationOrchestrator;
use crate::error::MigrationResult;
use crate::models::{EntityKind, MigrationTask};
use crate::services::ProgressLog;

impl MigrationOrchestrator {
    pub(super) async fn phase_topups(
        &self,
        task: &MigrationTask,
        log: &ProgressLog,
    ) -> MigrationResult<usize> {
        let deactivated = topups::deactivate_active(&self.db, task.org_id).await?;
        debug!(task_id = %task.task_id, deactivated, "Deactivated existing top-ups");

        let source_topups = self.source.fetch_topups(task.source_org_id).await?;

        for source_topup in &source_topups {
            log.record("TopUp", source_topup.id, source_topup.credits);

            let topup = topups::create_topup(
                &self.db,
                task.org_id,
                &NewTopUp {
                    price: source_topup.price,
                    credits: source_topup.credits,
                    expires_on: source_topup.expires_on.to_rfc3339(),
                },
                &task.requested_by,
            )
            .await?;

            self.associations
                .record(task, EntityKind::OrgTopUp, source_topup.id, topup.id)
                .await?;

            // Usage entries are never referenced later, so not associated
            for credit in self.source.fetch_topup_usage(source_topup.id).await? {
                topups::create_topup_credit(&self.db, topup.id, credit.used, credit.is_squashed)
                    .await?;
            }
        }

        Ok(source_topups.len())
    }
}
