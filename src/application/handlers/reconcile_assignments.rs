//! ReconcileAssignmentsHandler - the assignment fan-out engine.
//!
//! Turns the approved decision items of one version into deduplicated
//! task records: resolve the responsible user per item via role + LOB,
//! insert one assignment per dedup key unless an open one exists, and
//! notify only the newly created ones. The whole reconcile is idempotent;
//! calling it twice yields the same assignment set with zero new rows.
//!
//! Resolution runs before any insert. An ambiguous resolution (zero or
//! multiple holders) aborts the reconcile wholesale so a partially routed
//! version can never be persisted.

use std::sync::Arc;

use crate::domain::assignment::{
    Assignment, AssignmentContext, AssignmentType, Priority,
};
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, Role, Timestamp, VersionId,
};
use crate::domain::version::{DecisionItem, VersionChain};
use crate::ports::{
    AssignmentRepository, Notifier, UserDirectory, VersionRepository, WorkflowRepository,
};

/// Command to reconcile assignments for an approved version.
#[derive(Debug, Clone)]
pub struct ReconcileAssignmentsCommand {
    pub version_id: VersionId,
    pub assignment_type: AssignmentType,
    /// Role of the acting side (stamped as from_role).
    pub from_role: Role,
    /// Role resolved per item LOB to find the responsible user.
    pub to_role: Role,
    pub priority: Priority,
}

/// Result of a reconcile pass.
#[derive(Debug)]
pub struct ReconcileAssignmentsResult {
    /// Every open assignment covering the version's items, existing and new.
    pub assignments: Vec<Assignment>,
    /// The subset created by this call; the caller notifies only these.
    pub created: Vec<Assignment>,
}

/// Handler implementing the assignment router.
pub struct ReconcileAssignmentsHandler {
    workflow_repository: Arc<dyn WorkflowRepository>,
    version_repository: Arc<dyn VersionRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    user_directory: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
}

impl ReconcileAssignmentsHandler {
    pub fn new(
        workflow_repository: Arc<dyn WorkflowRepository>,
        version_repository: Arc<dyn VersionRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        user_directory: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            workflow_repository,
            version_repository,
            assignment_repository,
            user_directory,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReconcileAssignmentsCommand,
        metadata: CommandMetadata,
    ) -> Result<ReconcileAssignmentsResult, DomainError> {
        let chain = self.load_chain(&cmd.version_id).await?;
        self.require_current_approved(&chain, cmd.version_id)?;
        let workflow = self
            .workflow_repository
            .find_by_id(&chain.workflow_id())
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::WorkflowNotFound,
                    format!("Workflow not found: {}", chain.workflow_id()),
                )
            })?;

        let items = chain.assignable_items();

        // Pass 1: resolve every responsible user before writing anything.
        // An ambiguous (role, LOB) aborts the whole reconcile.
        let mut resolved: Vec<(&DecisionItem, _)> = Vec::with_capacity(items.len());
        for item in &items {
            let user = self
                .user_directory
                .resolve_user(cmd.to_role, item.lob_id())
                .await?;
            resolved.push((*item, user));
        }

        // Pass 2: insert behind the dedup key; existing open assignments
        // are left untouched.
        let now = Timestamp::now();
        let mut assignments = Vec::with_capacity(resolved.len());
        let mut created = Vec::new();
        for (item, to_user) in resolved {
            let candidate = Assignment::new(
                cmd.assignment_type,
                cmd.from_role,
                cmd.to_role,
                metadata.user_id.clone(),
                to_user,
                AssignmentContext {
                    cycle_id: workflow.cycle_id(),
                    report_id: workflow.report_id(),
                    phase: chain.phase(),
                    version_id: cmd.version_id,
                    subject_id: item.subject_id().to_string(),
                    lob_id: item.lob_id(),
                },
                cmd.priority,
                now,
            );
            let outcome = self.assignment_repository.insert_if_absent(candidate).await?;
            if outcome.is_inserted() {
                created.push(outcome.assignment().clone());
            }
            assignments.push(outcome.assignment().clone());
        }

        // Notification is best-effort and happens after persistence; a
        // delivery failure never unwinds routed assignments.
        for assignment in &created {
            if let Err(err) = self
                .notifier
                .notify(assignment.to_user(), assignment.id())
                .await
            {
                tracing::warn!(
                    assignment_id = %assignment.id(),
                    to_user = %assignment.to_user(),
                    error = %err,
                    "assignment notification failed"
                );
            }
        }

        tracing::info!(
            version_id = %cmd.version_id,
            phase = %chain.phase(),
            total = assignments.len(),
            created = created.len(),
            actor = %metadata.user_id,
            "assignments reconciled"
        );

        Ok(ReconcileAssignmentsResult {
            assignments,
            created,
        })
    }

    async fn load_chain(&self, version_id: &VersionId) -> Result<VersionChain, DomainError> {
        self.version_repository
            .find_by_version(version_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::VersionNotFound,
                    format!("Version not found: {}", version_id),
                )
            })
    }

    /// Reconcile only ever runs against the chain's single approved
    /// version; anything else re-opens the door to stale "approved" items
    /// fanning out duplicate work.
    fn require_current_approved(
        &self,
        chain: &VersionChain,
        version_id: VersionId,
    ) -> Result<(), DomainError> {
        match chain.current_approved() {
            Some(current) if current.id() == version_id => Ok(()),
            _ => Err(DomainError::new(
                ErrorCode::VersionNotApproved,
                format!("Version {} is not the current approved version", version_id),
            )
            .with_detail("version_id", version_id.to_string())),
        }
    }
}
