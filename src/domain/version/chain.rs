//! VersionChain aggregate - all versions of one phase's artifact.
//!
//! The chain is the single authority for version numbering, the
//! one-approved-version invariant, and "the" current approved version.
//! Callers never scan versions themselves; they ask the chain.

use serde::{Deserialize, Serialize};

use super::{Decision, DecisionItem, VersionStatus};
use crate::domain::foundation::{
    DecisionItemId, DomainError, ErrorCode, Role, Timestamp, UserId, VersionId, WorkflowId,
};
use crate::domain::phase::PhaseName;

/// One versioned snapshot of a phase artifact.
///
/// `parent_version_id` is a forward-only pointer to the version this one
/// was derived from; it is set at creation and never reassigned, which
/// rules out cycles by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    id: VersionId,
    number: u32,
    status: VersionStatus,
    parent_version_id: Option<VersionId>,
    created_by: UserId,
    created_at: Timestamp,
    submitted_by: Option<UserId>,
    submitted_at: Option<Timestamp>,
    submitted_notes: Option<String>,
    approved_by: Option<UserId>,
    approved_at: Option<Timestamp>,
    approval_notes: Option<String>,
    rejected_by: Option<UserId>,
    rejected_at: Option<Timestamp>,
    rejection_reason: Option<String>,
    items: Vec<DecisionItem>,
}

impl Version {
    /// Reconstitutes a version from persisted data.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: VersionId,
        number: u32,
        status: VersionStatus,
        parent_version_id: Option<VersionId>,
        created_by: UserId,
        created_at: Timestamp,
        submitted_by: Option<UserId>,
        submitted_at: Option<Timestamp>,
        submitted_notes: Option<String>,
        approved_by: Option<UserId>,
        approved_at: Option<Timestamp>,
        approval_notes: Option<String>,
        rejected_by: Option<UserId>,
        rejected_at: Option<Timestamp>,
        rejection_reason: Option<String>,
        items: Vec<DecisionItem>,
    ) -> Self {
        Self {
            id,
            number,
            status,
            parent_version_id,
            created_by,
            created_at,
            submitted_by,
            submitted_at,
            submitted_notes,
            approved_by,
            approved_at,
            approval_notes,
            rejected_by,
            rejected_at,
            rejection_reason,
            items,
        }
    }

    pub fn id(&self) -> VersionId {
        self.id
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn status(&self) -> VersionStatus {
        self.status
    }

    pub fn parent_version_id(&self) -> Option<VersionId> {
        self.parent_version_id
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn submitted_by(&self) -> Option<&UserId> {
        self.submitted_by.as_ref()
    }

    pub fn submitted_at(&self) -> Option<Timestamp> {
        self.submitted_at
    }

    pub fn submitted_notes(&self) -> Option<&str> {
        self.submitted_notes.as_deref()
    }

    pub fn approved_by(&self) -> Option<&UserId> {
        self.approved_by.as_ref()
    }

    pub fn approved_at(&self) -> Option<Timestamp> {
        self.approved_at
    }

    pub fn approval_notes(&self) -> Option<&str> {
        self.approval_notes.as_deref()
    }

    pub fn rejected_by(&self) -> Option<&UserId> {
        self.rejected_by.as_ref()
    }

    pub fn rejected_at(&self) -> Option<Timestamp> {
        self.rejected_at
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn items(&self) -> &[DecisionItem] {
        &self.items
    }

    /// Looks up an item by id.
    pub fn item(&self, id: DecisionItemId) -> Option<&DecisionItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    /// Items the report owner approved that fan out downstream work.
    pub fn downstream_items(&self) -> Vec<&DecisionItem> {
        self.items
            .iter()
            .filter(|i| i.needs_downstream_action())
            .collect()
    }
}

/// The VersionChain aggregate root.
#[derive(Debug, Clone)]
pub struct VersionChain {
    workflow_id: WorkflowId,
    phase: PhaseName,
    versions: Vec<Version>,
}

impl VersionChain {
    /// Creates an empty chain for a phase.
    pub fn new(workflow_id: WorkflowId, phase: PhaseName) -> Self {
        Self {
            workflow_id,
            phase,
            versions: Vec::new(),
        }
    }

    /// Reconstitutes a chain from persisted data.
    pub fn reconstitute(
        workflow_id: WorkflowId,
        phase: PhaseName,
        versions: Vec<Version>,
    ) -> Self {
        Self {
            workflow_id,
            phase,
            versions,
        }
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    pub fn phase(&self) -> PhaseName {
        self.phase
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Looks up a version by id.
    pub fn version(&self, id: VersionId) -> Option<&Version> {
        self.versions.iter().find(|v| v.id() == id)
    }

    fn version_mut(&mut self, id: VersionId) -> Result<&mut Version, DomainError> {
        let phase = self.phase;
        self.versions
            .iter_mut()
            .find(|v| v.id() == id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::VersionNotFound,
                    format!("No version {} for phase {}", id, phase),
                )
            })
    }

    /// The highest-numbered version, if any.
    pub fn latest(&self) -> Option<&Version> {
        self.versions.iter().max_by_key(|v| v.number())
    }

    /// The single currently-approved version, if any.
    ///
    /// This is the one accessor all downstream logic depends on; nothing
    /// else re-derives "the approved version" from raw rows.
    pub fn current_approved(&self) -> Option<&Version> {
        self.versions.iter().find(|v| v.status().is_approved())
    }

    /// Items of the current approved version that fan out downstream work.
    pub fn assignable_items(&self) -> Vec<&DecisionItem> {
        self.current_approved()
            .map(|v| v.downstream_items())
            .unwrap_or_default()
    }

    /// Creates a new draft version.
    ///
    /// The version number is the chain maximum plus one, never reused.
    /// With a parent, the item list is copied structurally but every
    /// decision resets to Pending - branching never inherits verdicts
    /// (inherited "approved" rows caused duplicate downstream assignments).
    pub fn create_draft(
        &mut self,
        parent_version_id: Option<VersionId>,
        created_by: &UserId,
        now: Timestamp,
    ) -> Result<VersionId, DomainError> {
        let items = match parent_version_id {
            Some(parent_id) => {
                let parent = self.version(parent_id).ok_or_else(|| {
                    DomainError::new(
                        ErrorCode::VersionNotFound,
                        format!("Parent version {} not found", parent_id),
                    )
                })?;
                parent.items().iter().map(DecisionItem::branch_copy).collect()
            }
            None => Vec::new(),
        };
        let number = self.latest().map(|v| v.number() + 1).unwrap_or(1);
        let id = VersionId::new();
        self.versions.push(Version {
            id,
            number,
            status: VersionStatus::Draft,
            parent_version_id,
            created_by: created_by.clone(),
            created_at: now,
            submitted_by: None,
            submitted_at: None,
            submitted_notes: None,
            approved_by: None,
            approved_at: None,
            approval_notes: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            items,
        });
        Ok(id)
    }

    /// Adds an item to a draft version.
    pub fn add_item(
        &mut self,
        version_id: VersionId,
        item: DecisionItem,
    ) -> Result<DecisionItemId, DomainError> {
        let version = self.version_mut(version_id)?;
        if !version.status.is_mutable() {
            return Err(not_in_draft(version));
        }
        let id = item.id();
        version.items.push(item);
        Ok(id)
    }

    /// Writes one role's decision on one item.
    ///
    /// Decisions can be recorded while the version is Draft or under
    /// review; terminal versions are immutable.
    pub fn set_decision(
        &mut self,
        version_id: VersionId,
        item_id: DecisionItemId,
        role: Role,
        decision: Decision,
        rationale: Option<String>,
    ) -> Result<(), DomainError> {
        let version = self.version_mut(version_id)?;
        if !matches!(
            version.status,
            VersionStatus::Draft | VersionStatus::PendingApproval
        ) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot record decisions on a {} version", version.status),
            ));
        }
        let item = version
            .items
            .iter_mut()
            .find(|i| i.id() == item_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DecisionItemNotFound,
                    format!("No item {} in version {}", item_id, version_id),
                )
            })?;
        item.set_decision(role, decision, rationale)
    }

    /// Submits a draft for approval.
    pub fn submit(
        &mut self,
        version_id: VersionId,
        actor: &UserId,
        notes: Option<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let version = self.version_mut(version_id)?;
        if version.status != VersionStatus::Draft {
            return Err(not_in_draft(version));
        }
        version.status = VersionStatus::PendingApproval;
        version.submitted_by = Some(actor.clone());
        version.submitted_at = Some(now);
        version.submitted_notes = notes;
        Ok(())
    }

    /// Approves a submitted version.
    ///
    /// Atomically (within the aggregate) marks this version Approved and
    /// any previously approved version Superseded, then returns the items
    /// now requiring downstream action.
    pub fn approve(
        &mut self,
        version_id: VersionId,
        actor: &UserId,
        notes: Option<String>,
        now: Timestamp,
    ) -> Result<Vec<DecisionItem>, DomainError> {
        {
            let version = self.version_mut(version_id)?;
            if version.status != VersionStatus::PendingApproval {
                return Err(not_pending(version));
            }
        }
        for other in self.versions.iter_mut() {
            if other.id() != version_id && other.status.is_approved() {
                other.status = VersionStatus::Superseded;
            }
        }
        let version = self.version_mut(version_id)?;
        version.status = VersionStatus::Approved;
        version.approved_by = Some(actor.clone());
        version.approved_at = Some(now);
        version.approval_notes = notes;
        Ok(version.downstream_items().into_iter().cloned().collect())
    }

    /// Rejects a submitted version, recording the reason.
    ///
    /// Does not create a follow-up draft; that is the caller's call.
    pub fn reject(
        &mut self,
        version_id: VersionId,
        actor: &UserId,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let version = self.version_mut(version_id)?;
        if version.status != VersionStatus::PendingApproval {
            return Err(not_pending(version));
        }
        version.status = VersionStatus::Rejected;
        version.rejected_by = Some(actor.clone());
        version.rejected_at = Some(now);
        version.rejection_reason = Some(reason.into());
        Ok(())
    }
}

fn not_in_draft(version: &Version) -> DomainError {
    DomainError::new(
        ErrorCode::NotInDraft,
        format!("Version {} is {}, not draft", version.number(), version.status()),
    )
    .with_detail("version_id", version.id().to_string())
}

fn not_pending(version: &Version) -> DomainError {
    DomainError::new(
        ErrorCode::NotInPendingApproval,
        format!(
            "Version {} is {}, not pending approval",
            version.number(),
            version.status()
        ),
    )
    .with_detail("version_id", version.id().to_string())
}
