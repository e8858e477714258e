//! Command handlers.
//!
//! Each handler is one operation of the workflow engine: it loads the
//! affected aggregate, applies the domain mutation, and persists through
//! a repository port. Repositories provide the per-workflow serialization
//! point, so a handler call is one short transaction.

mod advance_phase;
mod approve_version;
mod complete_activity;
mod create_draft;
mod override_phase;
mod reconcile_assignments;
mod reject_version;
mod set_decision;
mod start_activity;
mod submit_version;
mod transition_assignment;

pub use advance_phase::{AdvancePhaseCommand, AdvancePhaseHandler};
pub use approve_version::{ApproveVersionCommand, ApproveVersionHandler, ApproveVersionResult};
pub use complete_activity::{CompleteActivityCommand, CompleteActivityHandler};
pub use create_draft::{CreateDraftCommand, CreateDraftHandler, CreateDraftResult, NewItem};
pub use override_phase::{OverrideAction, OverridePhaseCommand, OverridePhaseHandler};
pub use reconcile_assignments::{
    ReconcileAssignmentsCommand, ReconcileAssignmentsHandler, ReconcileAssignmentsResult,
};
pub use reject_version::{RejectVersionCommand, RejectVersionHandler};
pub use set_decision::{SetDecisionCommand, SetDecisionHandler};
pub use start_activity::{StartActivityCommand, StartActivityHandler, StartActivityResult};
pub use submit_version::{SubmitVersionCommand, SubmitVersionHandler};
pub use transition_assignment::{
    AssignmentAction, TransitionAssignmentCommand, TransitionAssignmentHandler,
};
