//! Assignment module - routed units of work.
//!
//! Assignments are the fan-out of approved decisions: one task per
//! responsible party, deduplicated on a stable business key, with a full
//! audit trail (assignments are status-transitioned, never deleted).

mod record;

pub use record::{
    Assignment, AssignmentContext, AssignmentKey, AssignmentStatus, AssignmentType, Priority,
};
