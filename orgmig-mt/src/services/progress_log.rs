//! Per-task progress log
//!
//! Append-only text file at `<log_dir>/<task_id>.log`: section banners, one
//! line per migrated record, and the outcome. Every line also goes to
//! `tracing`. A failed write is reported once and never interrupts the run.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use orgmig_common::MigrationPhase;

use crate::error::MigrationResult;

pub struct ProgressLog {
    task_id: Uuid,
    path: Option<PathBuf>,
    file: Option<Mutex<File>>,
    write_failed: AtomicBool,
}

impl ProgressLog {
    /// Open (append) the task's log file, or a tracing-only log without `log_dir`
    pub fn open(log_dir: Option<&Path>, task_id: Uuid) -> MigrationResult<Self> {
        let Some(dir) = log_dir else {
            return Ok(Self::tracing_only(task_id));
        };

        std::fs::create_dir_all(dir).map_err(orgmig_common::Error::Io)?;
        let path = dir.join(format!("{}.log", task_id));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(orgmig_common::Error::Io)?;

        Ok(Self {
            task_id,
            path: Some(path),
            file: Some(Mutex::new(file)),
            write_failed: AtomicBool::new(false),
        })
    }

    pub fn tracing_only(task_id: Uuid) -> Self {
        Self {
            task_id,
            path: None,
            file: None,
            write_failed: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn section_started(&self, phase: MigrationPhase) {
        self.line(&format!("---------------- {} ----------------", phase.title()));
        self.line(&format!("[STARTED] {} migration", section_title(phase)));
    }

    pub fn section_completed(&self, phase: MigrationPhase) {
        self.line(&format!("[COMPLETED] {} migration", section_title(phase)));
        self.line("");
    }

    pub fn section_skipped(&self, phase: MigrationPhase) {
        self.line(&format!("[SKIPPED] {} migration already completed", section_title(phase)));
    }

    /// One migrated record
    pub fn record(&self, kind: &str, id: impl Display, label: impl Display) {
        self.line(&format!(">>> {}: {} - {}", kind, id, label));
    }

    pub fn error(&self, message: &str) {
        let text = format!("[ERROR] {}", message);
        error!(task_id = %self.task_id, "{}", text);
        self.write(&text);
    }

    pub fn elapsed(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        if secs >= 60.0 {
            self.line(&format!("This process took {:.1} minutes", secs / 60.0));
        } else {
            self.line(&format!("This process took {:.1} seconds", secs));
        }
    }

    pub fn line(&self, text: &str) {
        if !text.is_empty() {
            info!(task_id = %self.task_id, "{}", text);
        }
        self.write(text);
    }

    fn write(&self, text: &str) {
        let Some(file) = &self.file else {
            return;
        };

        let result = match file.lock() {
            Ok(mut file) => writeln!(file, "{}", text),
            Err(_) => Err(std::io::Error::other("progress log mutex poisoned")),
        };

        if let Err(e) = result {
            if !self.write_failed.swap(true, Ordering::Relaxed) {
                warn!(task_id = %self.task_id, error = %e, "Failed to write progress log");
            }
        }
    }
}

fn section_title(phase: MigrationPhase) -> &'static str {
    match phase {
        MigrationPhase::Organization => "Organization data",
        other => other.title(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_appended_to_task_file() {
        let dir = tempfile::tempdir().unwrap();
        let task_id = Uuid::new_v4();

        {
            let log = ProgressLog::open(Some(dir.path()), task_id).unwrap();
            log.section_started(MigrationPhase::TopUps);
            log.record("TopUp", 4, 100);
            log.section_completed(MigrationPhase::TopUps);
        }
        {
            let log = ProgressLog::open(Some(dir.path()), task_id).unwrap();
            log.error("No organization data found");
        }

        let content = std::fs::read_to_string(dir.path().join(format!("{}.log", task_id))).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "---------------- TopUps ----------------",
                "[STARTED] TopUps migration",
                ">>> TopUp: 4 - 100",
                "[COMPLETED] TopUps migration",
                "",
                "[ERROR] No organization data found",
            ]
        );
    }

    #[test]
    fn test_organization_section_wording() {
        let dir = tempfile::tempdir().unwrap();
        let log = ProgressLog::open(Some(dir.path()), Uuid::new_v4()).unwrap();
        log.section_started(MigrationPhase::Organization);

        let content = std::fs::read_to_string(log.path().unwrap()).unwrap();
        assert_eq!(
            content,
            "---------------- Organization ----------------\n[STARTED] Organization data migration\n"
        );
    }

    #[test]
    fn test_tracing_only_log_has_no_path() {
        let log = ProgressLog::open(None, Uuid::new_v4()).unwrap();
        assert!(log.path().is_none());
        log.section_started(MigrationPhase::Organization);
    }
}
