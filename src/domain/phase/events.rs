//! Domain events recorded by the workflow aggregate.

use serde::{Deserialize, Serialize};

use super::{PhaseName, PhaseState, ScheduleStatus};
use crate::domain::foundation::{ActivityId, Timestamp, UserId, WorkflowId};

/// Events emitted by [`super::ReportWorkflow`] mutations.
///
/// Drained by callers via `take_events()`; delivery infrastructure is
/// outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    PhaseStarted {
        workflow_id: WorkflowId,
        phase: PhaseName,
        at: Timestamp,
    },
    PhaseCompleted {
        workflow_id: WorkflowId,
        phase: PhaseName,
        at: Timestamp,
    },
    PhaseUnlocked {
        workflow_id: WorkflowId,
        phase: PhaseName,
        due_at: Timestamp,
    },
    ActivityStarted {
        workflow_id: WorkflowId,
        phase: PhaseName,
        activity_id: ActivityId,
        actor: UserId,
    },
    ActivityCompleted {
        workflow_id: WorkflowId,
        phase: PhaseName,
        activity_id: ActivityId,
        actor: UserId,
    },
    StateOverridden {
        workflow_id: WorkflowId,
        phase: PhaseName,
        value: Option<PhaseState>,
        actor: UserId,
    },
    StatusOverridden {
        workflow_id: WorkflowId,
        phase: PhaseName,
        value: Option<ScheduleStatus>,
        actor: UserId,
    },
}
