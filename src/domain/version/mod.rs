//! Version module - the draft/approval lifecycle of phase artifacts.
//!
//! Every phase's artifact (scoping decisions, sample sets, owner mappings,
//! observations) is a versioned snapshot. The `VersionChain` aggregate
//! owns all versions of one phase and is the single authority for "the"
//! approved version.

mod chain;
mod decision;
mod status;

pub use chain::{Version, VersionChain};
pub use decision::{Decision, DecisionItem};
pub use status::VersionStatus;
