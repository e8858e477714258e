//! In-memory implementation of VersionRepository.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, VersionId, WorkflowId};
use crate::domain::phase::PhaseName;
use crate::domain::version::VersionChain;
use crate::ports::VersionRepository;

/// In-memory version-chain store, keyed by (workflow, phase).
#[derive(Default)]
pub struct InMemoryVersionRepository {
    chains: Mutex<Vec<VersionChain>>,
}

impl InMemoryVersionRepository {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VersionRepository for InMemoryVersionRepository {
    async fn save(&self, chain: &VersionChain) -> Result<(), DomainError> {
        let mut chains = self.chains.lock().expect("version chains lock poisoned");
        chains.retain(|c| {
            !(c.workflow_id() == chain.workflow_id() && c.phase() == chain.phase())
        });
        chains.push(chain.clone());
        Ok(())
    }

    async fn update(&self, chain: &VersionChain) -> Result<(), DomainError> {
        self.save(chain).await
    }

    async fn find_by_phase(
        &self,
        workflow_id: &WorkflowId,
        phase: PhaseName,
    ) -> Result<Option<VersionChain>, DomainError> {
        Ok(self
            .chains
            .lock()
            .expect("version chains lock poisoned")
            .iter()
            .find(|c| c.workflow_id() == *workflow_id && c.phase() == phase)
            .cloned())
    }

    async fn find_by_version(
        &self,
        version_id: &VersionId,
    ) -> Result<Option<VersionChain>, DomainError> {
        Ok(self
            .chains
            .lock()
            .expect("version chains lock poisoned")
            .iter()
            .find(|c| c.version(*version_id).is_some())
            .cloned())
    }
}
