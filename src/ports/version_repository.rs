//! Version repository port (write side).
//!
//! Persists `VersionChain` aggregates. A chain is scoped to one
//! (workflow, phase) pair; chain updates share the workflow row lock with
//! phase mutations so version invariants hold under concurrency.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, VersionId, WorkflowId};
use crate::domain::phase::PhaseName;
use crate::domain::version::VersionChain;

/// Repository port for VersionChain aggregate persistence.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// Save a new chain (first draft of a phase artifact).
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, chain: &VersionChain) -> Result<(), DomainError>;

    /// Update an existing chain.
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` on lock/serialization conflict
    /// - `DatabaseError` on persistence failure
    async fn update(&self, chain: &VersionChain) -> Result<(), DomainError>;

    /// Find the chain for a workflow phase.
    ///
    /// Returns `None` if the phase has no versions yet.
    async fn find_by_phase(
        &self,
        workflow_id: &WorkflowId,
        phase: PhaseName,
    ) -> Result<Option<VersionChain>, DomainError>;

    /// Find the chain containing a specific version.
    async fn find_by_version(
        &self,
        version_id: &VersionId,
    ) -> Result<Option<VersionChain>, DomainError>;
}
