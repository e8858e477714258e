//! Workflow repository port (write side).
//!
//! Persists and retrieves `ReportWorkflow` aggregates. Implementations are
//! the serialization point for all phase mutations: `update` must run in a
//! transaction that locks the workflow row, so at most one state
//! transition per workflow is in flight at a time.

use async_trait::async_trait;

use crate::domain::foundation::{CycleId, DomainError, ReportId, WorkflowId};
use crate::domain::phase::ReportWorkflow;

/// Repository port for ReportWorkflow aggregate persistence.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Save a new workflow with all its phases and activities.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, workflow: &ReportWorkflow) -> Result<(), DomainError>;

    /// Update an existing workflow.
    ///
    /// Runs in one transaction holding the workflow row lock; concurrent
    /// updates to the same workflow surface as `ConcurrentModification`.
    ///
    /// # Errors
    ///
    /// - `WorkflowNotFound` if the workflow doesn't exist
    /// - `ConcurrentModification` on lock/serialization conflict
    /// - `DatabaseError` on persistence failure
    async fn update(&self, workflow: &ReportWorkflow) -> Result<(), DomainError>;

    /// Find a workflow by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<ReportWorkflow>, DomainError>;

    /// Find the workflow for a cycle x report pairing.
    async fn find_by_cycle_report(
        &self,
        cycle_id: &CycleId,
        report_id: &ReportId,
    ) -> Result<Option<ReportWorkflow>, DomainError>;
}
