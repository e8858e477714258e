//! Phase module - the ordered testing-phase workflow.
//!
//! A report moves through a fixed catalog of eight phases. Each phase owns
//! an ordered activity list; the `ReportWorkflow` aggregate enforces phase
//! ordering and the activity gate, and computes state, schedule health,
//! and progress.

mod activity;
mod aggregate;
mod catalog;
mod events;
mod progress;
mod schedule;
mod state;

pub use activity::{Activity, ActivityStatus, ActivityTemplate, ActivityType};
pub use aggregate::{Phase, PhaseSnapshot, ReportWorkflow};
pub use catalog::{PhaseName, PhaseSequence};
pub use events::WorkflowEvent;
pub use progress::PhaseProgress;
pub use schedule::{ScheduleStatus, SlaPolicy};
pub use state::{PhaseOverride, PhaseState};
