//! Migration task status and phase identifiers
//!
//! Both are stored as text in the destination database and exposed verbatim
//! by the status surface, so their labels are part of the external contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Lifecycle status of one migration task.
///
/// Pending → Processing → Complete, with Failed reachable from any
/// non-terminal status. Complete and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MigrationStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl MigrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::Pending => "PENDING",
            MigrationStatus::Processing => "PROCESSING",
            MigrationStatus::Complete => "COMPLETE",
            MigrationStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MigrationStatus::Complete | MigrationStatus::Failed)
    }

    /// Whether `self → next` is a legal forward move
    pub fn can_transition_to(&self, next: MigrationStatus) -> bool {
        use MigrationStatus::*;
        match (self, next) {
            (Pending, Processing) => true,
            (Processing, Complete) => true,
            (Pending | Processing, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(MigrationStatus::Pending),
            "PROCESSING" => Ok(MigrationStatus::Processing),
            "COMPLETE" => Ok(MigrationStatus::Complete),
            "FAILED" => Ok(MigrationStatus::Failed),
            other => Err(Error::InvalidInput(format!("Unknown migration status: {}", other))),
        }
    }
}

/// One ordered step of a migration run.
///
/// `MigrationPhase::ORDER` is a dependency contract: later phases resolve
/// references through associations recorded by earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    Organization,
    TopUps,
    Languages,
    Channels,
    ContactFields,
    Contacts,
    ContactGroups,
}

impl MigrationPhase {
    pub const ORDER: [MigrationPhase; 7] = [
        MigrationPhase::Organization,
        MigrationPhase::TopUps,
        MigrationPhase::Languages,
        MigrationPhase::Channels,
        MigrationPhase::ContactFields,
        MigrationPhase::Contacts,
        MigrationPhase::ContactGroups,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationPhase::Organization => "organization",
            MigrationPhase::TopUps => "topups",
            MigrationPhase::Languages => "languages",
            MigrationPhase::Channels => "channels",
            MigrationPhase::ContactFields => "contact_fields",
            MigrationPhase::Contacts => "contacts",
            MigrationPhase::ContactGroups => "contact_groups",
        }
    }

    /// Section title used in progress log banners
    pub fn title(&self) -> &'static str {
        match self {
            MigrationPhase::Organization => "Organization",
            MigrationPhase::TopUps => "TopUps",
            MigrationPhase::Languages => "Languages",
            MigrationPhase::Channels => "Channels",
            MigrationPhase::ContactFields => "Contact Fields",
            MigrationPhase::Contacts => "Contacts",
            MigrationPhase::ContactGroups => "Contact Groups",
        }
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationPhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MigrationPhase::ORDER
            .iter()
            .copied()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown migration phase: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        use MigrationStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Complete));
        assert!(Pending.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Failed));
    }

    #[test]
    fn test_terminal_statuses_do_not_move() {
        use MigrationStatus::*;
        for next in [Pending, Processing, Complete, Failed] {
            assert!(!Complete.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
        assert!(!Pending.can_transition_to(Complete));
        assert!(!Processing.can_transition_to(Pending));
    }

    #[test]
    fn test_status_labels_parse_back() {
        for status in [
            MigrationStatus::Pending,
            MigrationStatus::Processing,
            MigrationStatus::Complete,
            MigrationStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<MigrationStatus>().unwrap(), status);
        }
        assert!("DONE".parse::<MigrationStatus>().is_err());
    }

    #[test]
    fn test_phase_order_ends_with_groups() {
        assert_eq!(MigrationPhase::ORDER[0], MigrationPhase::Organization);
        let fields = MigrationPhase::ORDER.iter().position(|p| *p == MigrationPhase::ContactFields);
        let contacts = MigrationPhase::ORDER.iter().position(|p| *p == MigrationPhase::Contacts);
        assert!(fields < contacts);
        assert_eq!(MigrationPhase::ORDER[6], MigrationPhase::ContactGroups);
        assert_eq!("contact_groups".parse::<MigrationPhase>().unwrap(), MigrationPhase::ContactGroups);
    }
}
