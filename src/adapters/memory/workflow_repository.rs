//! In-memory implementation of WorkflowRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{CycleId, DomainError, ErrorCode, ReportId, WorkflowId};
use crate::domain::phase::ReportWorkflow;
use crate::ports::WorkflowRepository;

/// In-memory workflow store.
#[derive(Default)]
pub struct InMemoryWorkflowRepository {
    rows: Mutex<HashMap<WorkflowId, ReportWorkflow>>,
}

impl InMemoryWorkflowRepository {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored workflows (test helper).
    pub fn len(&self) -> usize {
        self.rows.lock().expect("workflow rows lock poisoned").len()
    }

    /// True if no workflows are stored (test helper).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Like the production store, persisted rows carry no domain events:
// the buffer belongs to the in-flight aggregate instance only.
fn stripped(workflow: &ReportWorkflow) -> ReportWorkflow {
    let mut copy = workflow.clone();
    copy.take_events();
    copy
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn save(&self, workflow: &ReportWorkflow) -> Result<(), DomainError> {
        self.rows
            .lock()
            .expect("workflow rows lock poisoned")
            .insert(workflow.id(), stripped(workflow));
        Ok(())
    }

    async fn update(&self, workflow: &ReportWorkflow) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().expect("workflow rows lock poisoned");
        if !rows.contains_key(&workflow.id()) {
            return Err(DomainError::new(
                ErrorCode::WorkflowNotFound,
                format!("Workflow not found: {}", workflow.id()),
            ));
        }
        rows.insert(workflow.id(), stripped(workflow));
        Ok(())
    }

    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<ReportWorkflow>, DomainError> {
        Ok(self
            .rows
            .lock()
            .expect("workflow rows lock poisoned")
            .get(id)
            .cloned())
    }

    async fn find_by_cycle_report(
        &self,
        cycle_id: &CycleId,
        report_id: &ReportId,
    ) -> Result<Option<ReportWorkflow>, DomainError> {
        Ok(self
            .rows
            .lock()
            .expect("workflow rows lock poisoned")
            .values()
            .find(|w| w.cycle_id() == *cycle_id && w.report_id() == *report_id)
            .cloned())
    }
}
