//! CreateDraftHandler - cuts a new draft version of a phase artifact.
//!
//! The first draft of a phase creates the chain; later drafts extend it.
//! Branching from a parent copies the item list but resets every decision
//! to Pending - the reset is the contract that keeps "approved items"
//! single-sourced downstream.

use std::sync::Arc;

use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, LobId, Timestamp, VersionId, WorkflowId,
};
use crate::domain::phase::PhaseName;
use crate::domain::version::{DecisionItem, VersionChain};
use crate::ports::VersionRepository;

/// Seed row for a fresh (non-branched) draft.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub subject_id: String,
    pub lob_id: LobId,
    pub requires_assignment: bool,
}

/// Command to create a draft version.
#[derive(Debug, Clone)]
pub struct CreateDraftCommand {
    pub workflow_id: WorkflowId,
    pub phase: PhaseName,
    /// Version to branch from; `None` starts an empty draft.
    pub parent_version_id: Option<VersionId>,
    /// Items seeding a fresh draft. Ignored when branching - the item
    /// list always comes from the parent in that case.
    pub items: Vec<NewItem>,
}

/// Result of creating a draft.
#[derive(Debug, Clone)]
pub struct CreateDraftResult {
    pub version_id: VersionId,
    pub version_number: u32,
}

/// Handler for creating drafts.
pub struct CreateDraftHandler {
    version_repository: Arc<dyn VersionRepository>,
}

impl CreateDraftHandler {
    pub fn new(version_repository: Arc<dyn VersionRepository>) -> Self {
        Self { version_repository }
    }

    pub async fn handle(
        &self,
        cmd: CreateDraftCommand,
        metadata: CommandMetadata,
    ) -> Result<CreateDraftResult, DomainError> {
        let existing = self
            .version_repository
            .find_by_phase(&cmd.workflow_id, cmd.phase)
            .await?;
        let is_new_chain = existing.is_none();
        let mut chain =
            existing.unwrap_or_else(|| VersionChain::new(cmd.workflow_id, cmd.phase));

        if cmd.parent_version_id.is_some() && !cmd.items.is_empty() {
            return Err(DomainError::validation(
                "items",
                "A branched draft takes its items from the parent",
            ));
        }

        let now = Timestamp::now();
        let version_id = chain.create_draft(cmd.parent_version_id, &metadata.user_id, now)?;
        for item in cmd.items {
            let row = DecisionItem::new(item.subject_id, item.lob_id, item.requires_assignment)?;
            chain.add_item(version_id, row)?;
        }
        let version_number = chain
            .version(version_id)
            .map(|v| v.number())
            .ok_or_else(|| DomainError::new(ErrorCode::InternalError, "draft vanished"))?;

        if is_new_chain {
            self.version_repository.save(&chain).await?;
        } else {
            self.version_repository.update(&chain).await?;
        }

        tracing::info!(
            workflow_id = %cmd.workflow_id,
            phase = %cmd.phase,
            version_id = %version_id,
            version_number,
            actor = %metadata.user_id,
            "draft version created"
        );

        Ok(CreateDraftResult {
            version_id,
            version_number,
        })
    }
}
