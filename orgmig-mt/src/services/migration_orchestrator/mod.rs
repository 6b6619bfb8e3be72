//! Migration orchestrator
//!
//! Runs one migration task end to end. Phases run in `MigrationPhase::ORDER`,
//! which is a dependency contract: each phase may resolve references only
//! through associations recorded by the phases before it.
//!
//! Each phase lives in its own `phase_*` module:
//!
//! - **Organization**: copy scalar settings onto the destination org
//! - **TopUps**: deactivate existing top-ups, import top-ups and usage
//! - **Languages**: delete existing languages, import, fix primary language
//! - **Channels**: retire existing channels, import channels, counts, sync history
//! - **ContactFields**: get-or-create by key
//! - **Contacts**: get-or-create by uuid
//! - **ContactGroups**: get-or-create by uuid, static membership
//!
//! After each phase a completion marker is written; `resume` continues an
//! interrupted task from the first phase without one.

use chrono::Utc;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use orgmig_common::config::DEFAULT_TPS;
use orgmig_common::events::{EventBus, MigrationEvent};
use orgmig_common::{MigrationPhase, MigrationStatus};

use crate::db::{locks, phases, tasks};
use crate::error::{MigrationError, MigrationResult};
use crate::models::MigrationTask;
use crate::services::{AssociationStore, ProgressLog};
use crate::source::{SourceClient, SourceOrg};

mod phase_channels;
mod phase_contact_fields;
mod phase_contact_groups;
mod phase_contacts;
mod phase_languages;
mod phase_organization;
mod phase_topups;

/// Tunables applied to every run
#[derive(Debug, Clone)]
pub struct MigrationSettings {
    /// Throughput quota given to imported channels
    pub default_tps: i64,
    /// Folder for per-task progress logs; tracing only when `None`
    pub log_dir: Option<PathBuf>,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            default_tps: DEFAULT_TPS,
            log_dir: None,
        }
    }
}

enum RunOutcome {
    Completed,
    MissingOrganization,
}

pub struct MigrationOrchestrator {
    db: SqlitePool,
    source: Arc<dyn SourceClient>,
    associations: AssociationStore,
    event_bus: EventBus,
    settings: MigrationSettings,
}

impl MigrationOrchestrator {
    pub fn new(
        db: SqlitePool,
        source: Arc<dyn SourceClient>,
        event_bus: EventBus,
        settings: MigrationSettings,
    ) -> Self {
        Self {
            associations: AssociationStore::new(db.clone()),
            db,
            source,
            event_bus,
            settings,
        }
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }

    pub fn source(&self) -> &dyn SourceClient {
        self.source.as_ref()
    }

    pub fn associations(&self) -> &AssociationStore {
        &self.associations
    }

    pub fn settings(&self) -> &MigrationSettings {
        &self.settings
    }

    /// Run a Pending task to Complete or Failed.
    ///
    /// Returns the task in its final status. A phase error marks the task
    /// Failed and is returned as `Err`. When another task holds the
    /// destination org, fails with `Locked` and the task stays Pending.
    pub async fn perform(&self, task: MigrationTask) -> MigrationResult<MigrationTask> {
        if task.status != MigrationStatus::Pending {
            return Err(MigrationError::InvalidTransition {
                from: task.status,
                to: MigrationStatus::Processing,
            });
        }

        self.execute(task, false).await
    }

    /// Take the destination org lock for a Pending task ahead of `perform`.
    ///
    /// When another task holds the org, `task` is marked Failed and the
    /// `Locked` error is returned, so an accepted request never leaves a
    /// task that can no longer run sitting in Pending.
    pub async fn claim(&self, task: &mut MigrationTask) -> MigrationResult<()> {
        match locks::acquire(&self.db, task.org_id, task.task_id).await {
            Ok(()) => Ok(()),
            Err(e @ MigrationError::Locked { .. }) => {
                info!(task_id = %task.task_id, org_id = task.org_id, "Destination org busy, failing task");
                self.set_status(task, MigrationStatus::Failed).await?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Continue an interrupted (still Processing) task from its first
    /// unfinished phase
    pub async fn resume(&self, task_id: Uuid) -> MigrationResult<MigrationTask> {
        let task = tasks::load_task(&self.db, task_id)
            .await?
            .ok_or(MigrationError::TaskNotFound(task_id))?;

        if task.status != MigrationStatus::Processing {
            return Err(MigrationError::InvalidTransition {
                from: task.status,
                to: MigrationStatus::Processing,
            });
        }

        self.execute(task, true).await
    }

    async fn execute(&self, mut task: MigrationTask, resuming: bool) -> MigrationResult<MigrationTask> {
        locks::acquire(&self.db, task.org_id, task.task_id).await?;

        let log = match ProgressLog::open(self.settings.log_dir.as_deref(), task.task_id) {
            Ok(log) => log,
            Err(e) => {
                self.release_lock(&task).await;
                return Err(e);
            }
        };

        if resuming {
            log.line("[RESUMED] Continuing from the first unfinished phase");
        } else if let Err(e) = self.set_status(&mut task, MigrationStatus::Processing).await {
            self.release_lock(&task).await;
            return Err(e);
        }

        let started = Instant::now();

        let result = match self.run_phases(&task, &log).await {
            Ok(RunOutcome::Completed) => self.finish(&mut task).await,
            Ok(RunOutcome::MissingOrganization) => {
                log.error("No organization data found");
                self.set_status(&mut task, MigrationStatus::Failed).await
            }
            Err(e) => {
                log.error(&format!("Migration failed: {}", e));
                if let Err(status_err) = self.set_status(&mut task, MigrationStatus::Failed).await {
                    error!(
                        task_id = %task.task_id,
                        error = %status_err,
                        "Could not record failed status"
                    );
                }
                Err(e)
            }
        };

        log.elapsed(started.elapsed());
        self.release_lock(&task).await;

        result.map(|()| task)
    }

    async fn run_phases(&self, task: &MigrationTask, log: &ProgressLog) -> MigrationResult<RunOutcome> {
        let completed = phases::completed_phases(&self.db, task.task_id).await?;

        if !completed.contains(&MigrationPhase::Organization) {
            log.section_started(MigrationPhase::Organization);
        }

        let Some(source_org) = self.source.fetch_organization(task.source_org_id).await? else {
            return Ok(RunOutcome::MissingOrganization);
        };

        for phase in MigrationPhase::ORDER {
            if completed.contains(&phase) {
                log.section_skipped(phase);
                continue;
            }

            if phase != MigrationPhase::Organization {
                log.section_started(phase);
            }

            self.event_bus.emit_lossy(MigrationEvent::PhaseStarted {
                task_id: task.task_id,
                phase,
                timestamp: Utc::now(),
            });

            let records_migrated = self.run_phase(phase, task, &source_org, log).await?;

            phases::mark_completed(&self.db, task.task_id, phase, records_migrated).await?;
            log.section_completed(phase);

            self.event_bus.emit_lossy(MigrationEvent::PhaseCompleted {
                task_id: task.task_id,
                phase,
                records_migrated,
                timestamp: Utc::now(),
            });
        }

        Ok(RunOutcome::Completed)
    }

    async fn run_phase(
        &self,
        phase: MigrationPhase,
        task: &MigrationTask,
        source_org: &SourceOrg,
        log: &ProgressLog,
    ) -> MigrationResult<usize> {
        match phase {
            MigrationPhase::Organization => self.phase_organization(task, source_org, log).await,
            MigrationPhase::TopUps => self.phase_topups(task, log).await,
            MigrationPhase::Languages => self.phase_languages(task, source_org, log).await,
            MigrationPhase::Channels => self.phase_channels(task, log).await,
            MigrationPhase::ContactFields => self.phase_contact_fields(task, log).await,
            MigrationPhase::Contacts => self.phase_contacts(task, log).await,
            MigrationPhase::ContactGroups => self.phase_contact_groups(task, log).await,
        }
    }

    /// Drop the working set, then mark Complete, then drop checkpoints.
    ///
    /// If marking Complete fails the task stays Processing with every
    /// checkpoint in place, so a resume only has to finish.
    async fn finish(&self, task: &mut MigrationTask) -> MigrationResult<()> {
        let cleared = self.associations.clear(task).await?;
        self.set_status(task, MigrationStatus::Complete).await?;
        phases::clear(&self.db, task.task_id).await?;

        info!(
            task_id = %task.task_id,
            associations_cleared = cleared,
            "Migration completed"
        );

        Ok(())
    }

    async fn set_status(&self, task: &mut MigrationTask, status: MigrationStatus) -> MigrationResult<()> {
        let transition = task.transition_to(status)?;
        tasks::save_task(&self.db, task).await?;

        info!(
            task_id = %task.task_id,
            old_status = %transition.old_status,
            new_status = %transition.new_status,
            "Migration status changed"
        );

        self.event_bus.emit_lossy(MigrationEvent::TaskStatusChanged {
            task_id: task.task_id,
            org_id: task.org_id,
            old_status: transition.old_status,
            new_status: transition.new_status,
            timestamp: transition.transitioned_at,
        });

        Ok(())
    }

    async fn release_lock(&self, task: &MigrationTask) {
        if let Err(e) = locks::release(&self.db, task.org_id, task.task_id).await {
            error!(
                task_id = %task.task_id,
                org_id = task.org_id,
                error = %e,
                "Failed to release migration lock"
            );
        }
    }
}
