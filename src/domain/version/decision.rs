//! Decision items - the lines of a versioned artifact.
//!
//! Each line carries two independently-settable decisions, one per role.
//! When a version is branched from a parent, the structural data is copied
//! but both decisions reset to Pending. That reset is a first-class
//! contract: carrying decisions forward left the same "approved" line
//! visible in several versions at once and fanned out duplicate work.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    DecisionItemId, DomainError, ErrorCode, LobId, Role, ValidationError,
};

/// A role's verdict on one artifact line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl Decision {
    /// Returns the stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Pending => "pending",
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of a version's artifact: an attribute, a sample, or a mapping.
///
/// `subject_id` is the stable business key of the underlying line (the
/// attribute or sample identifier). It survives version branching, unlike
/// the per-version `DecisionItemId`, and is what assignment deduplication
/// keys on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionItem {
    id: DecisionItemId,
    subject_id: String,
    lob_id: LobId,
    requires_assignment: bool,
    tester_decision: Decision,
    tester_rationale: Option<String>,
    report_owner_decision: Decision,
    report_owner_rationale: Option<String>,
}

impl DecisionItem {
    /// Creates a fresh item with both decisions Pending.
    pub fn new(
        subject_id: impl Into<String>,
        lob_id: LobId,
        requires_assignment: bool,
    ) -> Result<Self, ValidationError> {
        let subject_id = subject_id.into();
        if subject_id.is_empty() {
            return Err(ValidationError::empty_field("subject_id"));
        }
        Ok(Self {
            id: DecisionItemId::new(),
            subject_id,
            lob_id,
            requires_assignment,
            tester_decision: Decision::Pending,
            tester_rationale: None,
            report_owner_decision: Decision::Pending,
            report_owner_rationale: None,
        })
    }

    /// Reconstitutes an item from persisted data.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: DecisionItemId,
        subject_id: String,
        lob_id: LobId,
        requires_assignment: bool,
        tester_decision: Decision,
        tester_rationale: Option<String>,
        report_owner_decision: Decision,
        report_owner_rationale: Option<String>,
    ) -> Self {
        Self {
            id,
            subject_id,
            lob_id,
            requires_assignment,
            tester_decision,
            tester_rationale,
            report_owner_decision,
            report_owner_rationale,
        }
    }

    /// Copies this item into a new version: fresh id, same structural data,
    /// both decisions reset to Pending.
    pub fn branch_copy(&self) -> Self {
        Self {
            id: DecisionItemId::new(),
            subject_id: self.subject_id.clone(),
            lob_id: self.lob_id,
            requires_assignment: self.requires_assignment,
            tester_decision: Decision::Pending,
            tester_rationale: None,
            report_owner_decision: Decision::Pending,
            report_owner_rationale: None,
        }
    }

    pub fn id(&self) -> DecisionItemId {
        self.id
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn lob_id(&self) -> LobId {
        self.lob_id
    }

    pub fn requires_assignment(&self) -> bool {
        self.requires_assignment
    }

    pub fn tester_decision(&self) -> Decision {
        self.tester_decision
    }

    pub fn tester_rationale(&self) -> Option<&str> {
        self.tester_rationale.as_deref()
    }

    pub fn report_owner_decision(&self) -> Decision {
        self.report_owner_decision
    }

    pub fn report_owner_rationale(&self) -> Option<&str> {
        self.report_owner_rationale.as_deref()
    }

    /// Writes the decision field owned by `role`.
    ///
    /// The tester writes `tester_decision`, the report owner writes
    /// `report_owner_decision`; each write leaves the other field alone.
    /// Any other role is a `RoleMismatch`.
    pub fn set_decision(
        &mut self,
        role: Role,
        decision: Decision,
        rationale: Option<String>,
    ) -> Result<(), DomainError> {
        match role {
            Role::Tester => {
                self.tester_decision = decision;
                self.tester_rationale = rationale;
                Ok(())
            }
            Role::ReportOwner => {
                self.report_owner_decision = decision;
                self.report_owner_rationale = rationale;
                Ok(())
            }
            other => Err(DomainError::new(
                ErrorCode::RoleMismatch,
                format!("Role {} holds no decision field", other),
            )
            .with_detail("role", other.as_str())
            .with_detail("subject_id", self.subject_id.clone())),
        }
    }

    /// True if the report owner approved this line and it fans out work.
    pub fn needs_downstream_action(&self) -> bool {
        self.requires_assignment && self.report_owner_decision == Decision::Approved
    }
}
