//! Version lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle of a phase artifact version.
///
/// Draft is mutable; PendingApproval awaits the report owner; Approved is
/// immutable and at most one per phase; Superseded marks a previously
/// approved version displaced by a newer approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    #[default]
    Draft,
    PendingApproval,
    Approved,
    Rejected,
    Superseded,
}

impl VersionStatus {
    /// Returns true while the artifact can still be edited.
    pub fn is_mutable(&self) -> bool {
        matches!(self, VersionStatus::Draft)
    }

    /// Returns true if this version currently carries the approved artifact.
    pub fn is_approved(&self) -> bool {
        matches!(self, VersionStatus::Approved)
    }

    /// Returns the stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Draft => "draft",
            VersionStatus::PendingApproval => "pending_approval",
            VersionStatus::Approved => "approved",
            VersionStatus::Rejected => "rejected",
            VersionStatus::Superseded => "superseded",
        }
    }
}

impl StateMachine for VersionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use VersionStatus::*;
        matches!(
            (self, target),
            (Draft, PendingApproval)
                | (PendingApproval, Approved)
                | (PendingApproval, Rejected)
                | (Approved, Superseded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use VersionStatus::*;
        match self {
            Draft => vec![PendingApproval],
            PendingApproval => vec![Approved, Rejected],
            Approved => vec![Superseded],
            Rejected => vec![],
            Superseded => vec![],
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
