//! Assignment records, their dedup key, and the task lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    AssignmentId, CycleId, DomainError, ErrorCode, LobId, ReportId, Role, StateMachine, Timestamp,
    UserId, VersionId,
};
use crate::domain::phase::PhaseName;

/// The kind of work an assignment routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    LobAssignment,
    ApprovalRequest,
    InformationRequest,
}

impl AssignmentType {
    /// Returns the stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentType::LobAssignment => "lob_assignment",
            AssignmentType::ApprovalRequest => "approval_request",
            AssignmentType::InformationRequest => "information_request",
        }
    }
}

impl fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task lifecycle: Assigned until the target user views it, Acknowledged
/// until they act, then Completed. Cancelled is the only other exit and is
/// always an explicit caller action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    Assigned,
    Acknowledged,
    Completed,
    Cancelled,
}

impl AssignmentStatus {
    /// Returns true while the assignment still counts for deduplication.
    pub fn is_open(&self) -> bool {
        !matches!(self, AssignmentStatus::Cancelled)
    }

    /// Returns the stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::Acknowledged => "acknowledged",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Cancelled => "cancelled",
        }
    }
}

impl StateMachine for AssignmentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use AssignmentStatus::*;
        matches!(
            (self, target),
            (Assigned, Acknowledged)
                | (Assigned, Completed)
                | (Assigned, Cancelled)
                | (Acknowledged, Completed)
                | (Acknowledged, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AssignmentStatus::*;
        match self {
            Assigned => vec![Acknowledged, Completed, Cancelled],
            Acknowledged => vec![Completed, Cancelled],
            Completed => vec![],
            Cancelled => vec![],
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Routing priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Returns the stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

/// The deduplication key: at most one open assignment may exist per key.
///
/// Keys are built from the stable subject id, not the per-version
/// DecisionItemId, so the same attribute approved again in a branched
/// version maps onto the assignment already in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentKey {
    pub assignment_type: AssignmentType,
    pub cycle_id: CycleId,
    pub report_id: ReportId,
    pub subject_id: String,
    pub lob_id: LobId,
}

/// Pointer back to the triggering item, stored as the assignment's JSON
/// context column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentContext {
    pub cycle_id: CycleId,
    pub report_id: ReportId,
    pub phase: PhaseName,
    pub version_id: VersionId,
    pub subject_id: String,
    pub lob_id: LobId,
}

/// A routed unit of work directed at a specific user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    id: AssignmentId,
    assignment_type: AssignmentType,
    from_role: Role,
    to_role: Role,
    from_user: UserId,
    to_user: UserId,
    context: AssignmentContext,
    status: AssignmentStatus,
    priority: Priority,
    created_at: Timestamp,
    updated_at: Timestamp,
    acknowledged_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
    cancelled_at: Option<Timestamp>,
}

impl Assignment {
    /// Creates a new assignment in the Assigned state.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        assignment_type: AssignmentType,
        from_role: Role,
        to_role: Role,
        from_user: UserId,
        to_user: UserId,
        context: AssignmentContext,
        priority: Priority,
        now: Timestamp,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            assignment_type,
            from_role,
            to_role,
            from_user,
            to_user,
            context,
            status: AssignmentStatus::Assigned,
            priority,
            created_at: now,
            updated_at: now,
            acknowledged_at: None,
            completed_at: None,
            cancelled_at: None,
        }
    }

    /// Reconstitutes an assignment from persisted data.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: AssignmentId,
        assignment_type: AssignmentType,
        from_role: Role,
        to_role: Role,
        from_user: UserId,
        to_user: UserId,
        context: AssignmentContext,
        status: AssignmentStatus,
        priority: Priority,
        created_at: Timestamp,
        updated_at: Timestamp,
        acknowledged_at: Option<Timestamp>,
        completed_at: Option<Timestamp>,
        cancelled_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id,
            assignment_type,
            from_role,
            to_role,
            from_user,
            to_user,
            context,
            status,
            priority,
            created_at,
            updated_at,
            acknowledged_at,
            completed_at,
            cancelled_at,
        }
    }

    pub fn id(&self) -> AssignmentId {
        self.id
    }

    pub fn assignment_type(&self) -> AssignmentType {
        self.assignment_type
    }

    pub fn from_role(&self) -> Role {
        self.from_role
    }

    pub fn to_role(&self) -> Role {
        self.to_role
    }

    pub fn from_user(&self) -> &UserId {
        &self.from_user
    }

    pub fn to_user(&self) -> &UserId {
        &self.to_user
    }

    pub fn context(&self) -> &AssignmentContext {
        &self.context
    }

    pub fn status(&self) -> AssignmentStatus {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn acknowledged_at(&self) -> Option<Timestamp> {
        self.acknowledged_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub fn cancelled_at(&self) -> Option<Timestamp> {
        self.cancelled_at
    }

    /// True while this assignment blocks a duplicate for the same key.
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// The deduplication key for this assignment.
    pub fn key(&self) -> AssignmentKey {
        AssignmentKey {
            assignment_type: self.assignment_type,
            cycle_id: self.context.cycle_id,
            report_id: self.context.report_id,
            subject_id: self.context.subject_id.clone(),
            lob_id: self.context.lob_id,
        }
    }

    /// Target user viewed the task.
    pub fn acknowledge(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(AssignmentStatus::Acknowledged)?;
        self.acknowledged_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Target user acted on the task.
    pub fn complete(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(AssignmentStatus::Completed)?;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Explicit cancellation; the record stays for the audit trail.
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(AssignmentStatus::Cancelled)?;
        self.cancelled_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn transition(&mut self, target: AssignmentStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Assignment {} cannot move {} -> {}", self.id, self.status, target),
            )
        })?;
        Ok(())
    }
}
