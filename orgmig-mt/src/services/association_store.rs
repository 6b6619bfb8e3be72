//! Association store
//!
//! Task-scoped mapping from (entity kind, source id) to destination id.
//! Later phases resolve references to records created by earlier phases
//! only through this store. Records are a working set: they are deleted
//! when the task completes.

use sqlx::SqlitePool;
use tracing::{error, warn};

use orgmig_common::db::{
    channels::{self, Channel},
    contact_fields::{self, ContactField},
    contact_groups::{self, ContactGroup},
    contacts::{self, Contact},
    languages::{self, Language},
    topups::{self, TopUp},
};

use crate::db::associations;
use crate::error::MigrationResult;
use crate::models::{EntityKind, MigrationTask};

/// A destination record reached through an association
#[derive(Debug, Clone, PartialEq)]
pub enum DestinationEntity {
    TopUp(TopUp),
    Language(Language),
    Channel(Channel),
    ContactField(ContactField),
    Contact(Contact),
    ContactGroup(ContactGroup),
}

impl DestinationEntity {
    pub fn id(&self) -> i64 {
        match self {
            DestinationEntity::TopUp(t) => t.id,
            DestinationEntity::Language(l) => l.id,
            DestinationEntity::Channel(c) => c.id,
            DestinationEntity::ContactField(f) => f.id,
            DestinationEntity::Contact(c) => c.id,
            DestinationEntity::ContactGroup(g) => g.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            DestinationEntity::TopUp(_) => EntityKind::OrgTopUp,
            DestinationEntity::Language(_) => EntityKind::OrgLanguage,
            DestinationEntity::Channel(_) => EntityKind::Channel,
            DestinationEntity::ContactField(_) => EntityKind::ContactField,
            DestinationEntity::Contact(_) => EntityKind::Contact,
            DestinationEntity::ContactGroup(_) => EntityKind::ContactGroup,
        }
    }
}

#[derive(Clone)]
pub struct AssociationStore {
    db: SqlitePool,
}

impl AssociationStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Append a record. Duplicates are tolerated; lookups take the newest.
    pub async fn record(
        &self,
        task: &MigrationTask,
        kind: EntityKind,
        source_id: i64,
        destination_id: i64,
    ) -> MigrationResult<()> {
        associations::insert(&self.db, task.task_id, kind, source_id, destination_id).await?;
        tracing::trace!(
            task_id = %task.task_id,
            entity_kind = %kind,
            source_id,
            destination_id,
            "Recorded association"
        );
        Ok(())
    }

    /// Destination id recorded for `(kind, source_id)` in this task
    pub async fn lookup(
        &self,
        task: &MigrationTask,
        kind: EntityKind,
        source_id: i64,
    ) -> MigrationResult<Option<i64>> {
        associations::latest_destination_id(&self.db, task.task_id, kind, source_id).await
    }

    /// Resolve a source reference to the destination record it became.
    ///
    /// Absent when no association exists (warning), when the kind has no
    /// destination repository (error), or when the record is gone or
    /// belongs to another organization. Only storage failures are errors.
    pub async fn resolve(
        &self,
        kind: EntityKind,
        source_id: i64,
        task: &MigrationTask,
    ) -> MigrationResult<Option<DestinationEntity>> {
        let Some(destination_id) = self.lookup(task, kind, source_id).await? else {
            warn!(
                task_id = %task.task_id,
                entity_kind = %kind,
                source_id,
                "No association found"
            );
            return Ok(None);
        };

        let db = &self.db;
        let org_id = task.org_id;

        let entity = match kind {
            EntityKind::OrgTopUp => topups::get_topup(db, destination_id, org_id)
                .await?
                .map(DestinationEntity::TopUp),
            EntityKind::OrgLanguage => languages::get_language(db, destination_id, org_id)
                .await?
                .map(DestinationEntity::Language),
            EntityKind::Channel => channels::get_channel(db, destination_id, org_id)
                .await?
                .map(DestinationEntity::Channel),
            EntityKind::ContactField => contact_fields::get_field(db, destination_id, org_id)
                .await?
                .map(DestinationEntity::ContactField),
            EntityKind::Contact => contacts::get_contact(db, destination_id, org_id)
                .await?
                .map(DestinationEntity::Contact),
            EntityKind::ContactGroup => contact_groups::get_group(db, destination_id, org_id)
                .await?
                .map(DestinationEntity::ContactGroup),
            other => {
                error!(
                    task_id = %task.task_id,
                    entity_kind = %other,
                    source_id,
                    "No destination repository for entity kind"
                );
                return Ok(None);
            }
        };

        Ok(entity)
    }

    pub async fn count(&self, task: &MigrationTask) -> MigrationResult<i64> {
        associations::count_for_task(&self.db, task.task_id).await
    }

    /// Delete every record owned by the task
    pub async fn clear(&self, task: &MigrationTask) -> MigrationResult<u64> {
        associations::delete_for_task(&self.db, task.task_id).await
    }
}
