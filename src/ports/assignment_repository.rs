//! Assignment repository port.
//!
//! Assignments are append-and-transition records: they are never deleted,
//! and at most one open assignment may exist per dedup key. Insertions go
//! through `insert_if_absent`, which implementations back with a unique
//! constraint so a racing duplicate insert degrades to "already exists"
//! instead of a second row.

use async_trait::async_trait;

use crate::domain::assignment::{Assignment, AssignmentKey};
use crate::domain::foundation::{AssignmentId, CycleId, DomainError, ReportId};

/// Result of a deduplicated insert.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// The assignment was new and has been persisted.
    Inserted(Assignment),
    /// An open assignment with the same key already existed; it is
    /// returned untouched and nothing was written.
    Existing(Assignment),
}

impl InsertOutcome {
    /// The assignment this outcome refers to, inserted or pre-existing.
    pub fn assignment(&self) -> &Assignment {
        match self {
            InsertOutcome::Inserted(a) | InsertOutcome::Existing(a) => a,
        }
    }

    /// True if a new row was written.
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

/// Repository port for assignment persistence.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Insert an assignment unless an open one already exists for its key.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn insert_if_absent(&self, assignment: Assignment)
        -> Result<InsertOutcome, DomainError>;

    /// Persist a status transition on an existing assignment.
    ///
    /// # Errors
    ///
    /// - `AssignmentNotFound` if the assignment doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, assignment: &Assignment) -> Result<(), DomainError>;

    /// Find an assignment by its ID.
    async fn find_by_id(&self, id: &AssignmentId) -> Result<Option<Assignment>, DomainError>;

    /// Find the open (non-cancelled) assignment for a dedup key, if any.
    async fn find_open_by_key(
        &self,
        key: &AssignmentKey,
    ) -> Result<Option<Assignment>, DomainError>;

    /// All open assignments for a cycle x report pairing.
    async fn list_open_for_report(
        &self,
        cycle_id: &CycleId,
        report_id: &ReportId,
    ) -> Result<Vec<Assignment>, DomainError>;
}
