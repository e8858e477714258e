//! In-memory implementation of AssignmentRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::assignment::{Assignment, AssignmentKey};
use crate::domain::foundation::{AssignmentId, CycleId, DomainError, ErrorCode, ReportId};
use crate::ports::{AssignmentRepository, InsertOutcome};

/// In-memory assignment store.
///
/// The mutex held across the lookup-then-insert in `insert_if_absent`
/// plays the role of the production unique constraint: two racing inserts
/// for the same key cannot both see "absent".
#[derive(Default)]
pub struct InMemoryAssignmentRepository {
    rows: Mutex<HashMap<AssignmentId, Assignment>>,
}

impl InMemoryAssignmentRepository {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored assignments regardless of status (test helper).
    pub fn all(&self) -> Vec<Assignment> {
        self.rows
            .lock()
            .expect("assignment rows lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Total row count, cancelled included (test helper).
    pub fn row_count(&self) -> usize {
        self.rows.lock().expect("assignment rows lock poisoned").len()
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn insert_if_absent(
        &self,
        assignment: Assignment,
    ) -> Result<InsertOutcome, DomainError> {
        let mut rows = self.rows.lock().expect("assignment rows lock poisoned");
        let key = assignment.key();
        if let Some(existing) = rows.values().find(|a| a.is_open() && a.key() == key) {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }
        rows.insert(assignment.id(), assignment.clone());
        Ok(InsertOutcome::Inserted(assignment))
    }

    async fn update(&self, assignment: &Assignment) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().expect("assignment rows lock poisoned");
        if !rows.contains_key(&assignment.id()) {
            return Err(DomainError::new(
                ErrorCode::AssignmentNotFound,
                format!("Assignment not found: {}", assignment.id()),
            ));
        }
        rows.insert(assignment.id(), assignment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &AssignmentId) -> Result<Option<Assignment>, DomainError> {
        Ok(self
            .rows
            .lock()
            .expect("assignment rows lock poisoned")
            .get(id)
            .cloned())
    }

    async fn find_open_by_key(
        &self,
        key: &AssignmentKey,
    ) -> Result<Option<Assignment>, DomainError> {
        Ok(self
            .rows
            .lock()
            .expect("assignment rows lock poisoned")
            .values()
            .find(|a| a.is_open() && a.key() == *key)
            .cloned())
    }

    async fn list_open_for_report(
        &self,
        cycle_id: &CycleId,
        report_id: &ReportId,
    ) -> Result<Vec<Assignment>, DomainError> {
        let mut open: Vec<Assignment> = self
            .rows
            .lock()
            .expect("assignment rows lock poisoned")
            .values()
            .filter(|a| {
                a.is_open()
                    && a.context().cycle_id == *cycle_id
                    && a.context().report_id == *report_id
            })
            .cloned()
            .collect();
        open.sort_by_key(|a| a.created_at());
        Ok(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assignment::{AssignmentContext, AssignmentType, Priority};
    use crate::domain::foundation::{LobId, Role, Timestamp, UserId, VersionId};
    use crate::domain::phase::PhaseName;

    fn assignment(cycle_id: CycleId, report_id: ReportId, subject: &str) -> Assignment {
        Assignment::new(
            AssignmentType::LobAssignment,
            Role::Tester,
            Role::DataOwner,
            UserId::new("tester-1").unwrap(),
            UserId::new("downer-7").unwrap(),
            AssignmentContext {
                cycle_id,
                report_id,
                phase: PhaseName::DataOwnerIdentification,
                version_id: VersionId::new(),
                subject_id: subject.to_string(),
                lob_id: LobId::new(338).unwrap(),
            },
            Priority::Medium,
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn insert_if_absent_dedups_on_key() {
        let repo = InMemoryAssignmentRepository::new();
        let cycle = CycleId::new();
        let report = ReportId::new();

        let first = repo
            .insert_if_absent(assignment(cycle, report, "attr-401"))
            .await
            .unwrap();
        assert!(first.is_inserted());

        let second = repo
            .insert_if_absent(assignment(cycle, report, "attr-401"))
            .await
            .unwrap();
        assert!(!second.is_inserted());
        assert_eq!(second.assignment().id(), first.assignment().id());
        assert_eq!(repo.row_count(), 1);
    }

    #[tokio::test]
    async fn cancelled_assignment_frees_the_key() {
        let repo = InMemoryAssignmentRepository::new();
        let cycle = CycleId::new();
        let report = ReportId::new();

        let outcome = repo
            .insert_if_absent(assignment(cycle, report, "attr-401"))
            .await
            .unwrap();
        let mut cancelled = outcome.assignment().clone();
        cancelled.cancel(Timestamp::now()).unwrap();
        repo.update(&cancelled).await.unwrap();

        let replacement = repo
            .insert_if_absent(assignment(cycle, report, "attr-401"))
            .await
            .unwrap();
        assert!(replacement.is_inserted());
        // Both rows remain: cancellation preserves the audit trail.
        assert_eq!(repo.row_count(), 2);
    }

    #[tokio::test]
    async fn list_open_for_report_excludes_cancelled_and_other_reports() {
        let repo = InMemoryAssignmentRepository::new();
        let cycle = CycleId::new();
        let report = ReportId::new();

        repo.insert_if_absent(assignment(cycle, report, "attr-401"))
            .await
            .unwrap();
        let outcome = repo
            .insert_if_absent(assignment(cycle, report, "attr-402"))
            .await
            .unwrap();
        let mut cancelled = outcome.assignment().clone();
        cancelled.cancel(Timestamp::now()).unwrap();
        repo.update(&cancelled).await.unwrap();
        repo.insert_if_absent(assignment(cycle, ReportId::new(), "attr-403"))
            .await
            .unwrap();

        let open = repo.list_open_for_report(&cycle, &report).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].context().subject_id, "attr-401");
    }

    #[tokio::test]
    async fn update_unknown_assignment_fails() {
        let repo = InMemoryAssignmentRepository::new();
        let row = assignment(CycleId::new(), ReportId::new(), "attr-401");
        let err = repo.update(&row).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AssignmentNotFound);
    }
}
