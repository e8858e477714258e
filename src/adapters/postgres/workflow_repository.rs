//! PostgreSQL implementation of WorkflowRepository.
//!
//! Workflows persist as one `workflows` row plus eight `phases` rows and
//! their `activities`. `update` locks the workflow row first; that lock is
//! the serialization point for every phase mutation.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::{map_db_err, parse_enum};
use crate::domain::foundation::{
    ActivityId, CycleId, DomainError, ErrorCode, ReportId, Timestamp, UserId, WorkflowId,
};
use crate::domain::phase::{
    Activity, ActivityStatus, ActivityType, Phase, PhaseName, PhaseOverride, PhaseSequence,
    PhaseState, ReportWorkflow, ScheduleStatus,
};
use crate::ports::WorkflowRepository;

/// PostgreSQL implementation of WorkflowRepository.
#[derive(Clone)]
pub struct PgWorkflowRepository {
    pool: PgPool,
}

impl PgWorkflowRepository {
    /// Creates a new PgWorkflowRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowRepository for PgWorkflowRepository {
    async fn save(&self, workflow: &ReportWorkflow) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_err("begin save workflow", e))?;

        sqlx::query(
            r#"
            INSERT INTO workflows (
                id, cycle_id, report_id, tester, report_owner, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(workflow.id().as_uuid())
        .bind(workflow.cycle_id().as_uuid())
        .bind(workflow.report_id().as_uuid())
        .bind(workflow.tester().as_str())
        .bind(workflow.report_owner().as_str())
        .bind(workflow.created_at().as_datetime())
        .bind(workflow.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_err("insert workflow", e))?;

        for phase in workflow.phases() {
            upsert_phase(&mut tx, workflow.id(), phase).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_db_err("commit save workflow", e))?;
        Ok(())
    }

    async fn update(&self, workflow: &ReportWorkflow) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_err("begin update workflow", e))?;

        // Serialization point: at most one in-flight transition per workflow.
        let locked = sqlx::query("SELECT id FROM workflows WHERE id = $1 FOR UPDATE")
            .bind(workflow.id().as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_db_err("lock workflow row", e))?;
        if locked.is_none() {
            return Err(DomainError::new(
                ErrorCode::WorkflowNotFound,
                format!("Workflow not found: {}", workflow.id()),
            ));
        }

        sqlx::query("UPDATE workflows SET updated_at = $2 WHERE id = $1")
            .bind(workflow.id().as_uuid())
            .bind(workflow.updated_at().as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_err("update workflow", e))?;

        for phase in workflow.phases() {
            upsert_phase(&mut tx, workflow.id(), phase).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_db_err("commit update workflow", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<ReportWorkflow>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, cycle_id, report_id, tester, report_owner, created_at, updated_at
            FROM workflows WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err("fetch workflow", e))?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_cycle_report(
        &self,
        cycle_id: &CycleId,
        report_id: &ReportId,
    ) -> Result<Option<ReportWorkflow>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, cycle_id, report_id, tester, report_owner, created_at, updated_at
            FROM workflows WHERE cycle_id = $1 AND report_id = $2
            "#,
        )
        .bind(cycle_id.as_uuid())
        .bind(report_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err("fetch workflow by cycle/report", e))?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }
}

impl PgWorkflowRepository {
    async fn hydrate(&self, row: sqlx::postgres::PgRow) -> Result<ReportWorkflow, DomainError> {
        let workflow_id = WorkflowId::from_uuid(row.get::<Uuid, _>("id"));
        let phases = load_phases(&self.pool, &workflow_id).await?;
        ReportWorkflow::reconstitute(
            workflow_id,
            CycleId::from_uuid(row.get("cycle_id")),
            ReportId::from_uuid(row.get("report_id")),
            user_id(row.get::<String, _>("tester"))?,
            user_id(row.get::<String, _>("report_owner"))?,
            phases,
            Timestamp::from_datetime(row.get("created_at")),
            Timestamp::from_datetime(row.get("updated_at")),
        )
    }
}

fn user_id(raw: String) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(DomainError::from)
}

async fn upsert_phase(
    tx: &mut Transaction<'_, Postgres>,
    workflow_id: WorkflowId,
    phase: &Phase,
) -> Result<(), DomainError> {
    let state_override = phase
        .state_override()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
    let status_override = phase
        .status_override()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO phases (
            workflow_id, name, position, state, state_override, status_override,
            actual_start, actual_end, due_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (workflow_id, name) DO UPDATE SET
            state = EXCLUDED.state,
            state_override = EXCLUDED.state_override,
            status_override = EXCLUDED.status_override,
            actual_start = EXCLUDED.actual_start,
            actual_end = EXCLUDED.actual_end,
            due_at = EXCLUDED.due_at
        "#,
    )
    .bind(workflow_id.as_uuid())
    .bind(phase.name().as_str())
    .bind(PhaseSequence::order_index(phase.name()) as i16)
    .bind(phase.state().as_str())
    .bind(state_override)
    .bind(status_override)
    .bind(phase.actual_start().map(|t| *t.as_datetime()))
    .bind(phase.actual_end().map(|t| *t.as_datetime()))
    .bind(phase.due_at().map(|t| *t.as_datetime()))
    .execute(&mut **tx)
    .await
    .map_err(|e| map_db_err("upsert phase", e))?;

    for activity in phase.activities() {
        sqlx::query(
            r#"
            INSERT INTO activities (
                id, workflow_id, phase_name, name, ord, activity_type,
                is_manual, is_optional, status,
                started_by, started_at, completed_by, completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                started_by = EXCLUDED.started_by,
                started_at = EXCLUDED.started_at,
                completed_by = EXCLUDED.completed_by,
                completed_at = EXCLUDED.completed_at
            "#,
        )
        .bind(activity.id().as_uuid())
        .bind(workflow_id.as_uuid())
        .bind(phase.name().as_str())
        .bind(activity.name())
        .bind(activity.order() as i16)
        .bind(activity.activity_type().as_str())
        .bind(activity.is_manual())
        .bind(activity.is_optional())
        .bind(activity.status().as_str())
        .bind(activity.started_by().map(|u| u.as_str().to_string()))
        .bind(activity.started_at().map(|t| *t.as_datetime()))
        .bind(activity.completed_by().map(|u| u.as_str().to_string()))
        .bind(activity.completed_at().map(|t| *t.as_datetime()))
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_err("upsert activity", e))?;
    }
    Ok(())
}

async fn load_phases(pool: &PgPool, workflow_id: &WorkflowId) -> Result<Vec<Phase>, DomainError> {
    let phase_rows = sqlx::query(
        r#"
        SELECT name, state, state_override, status_override,
               actual_start, actual_end, due_at
        FROM phases WHERE workflow_id = $1
        ORDER BY position ASC
        "#,
    )
    .bind(workflow_id.as_uuid())
    .fetch_all(pool)
    .await
    .map_err(|e| map_db_err("fetch phases", e))?;

    let mut phases = Vec::with_capacity(phase_rows.len());
    for row in phase_rows {
        let name: PhaseName = parse_enum("phase name", row.get::<String, _>("name").as_str())?;
        let state = phase_state(row.get::<String, _>("state").as_str())?;
        let state_override: Option<PhaseOverride<PhaseState>> = row
            .get::<Option<serde_json::Value>, _>("state_override")
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
        let status_override: Option<PhaseOverride<ScheduleStatus>> = row
            .get::<Option<serde_json::Value>, _>("status_override")
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;

        let activities = load_activities(pool, workflow_id, name).await?;
        phases.push(Phase::reconstitute(
            name,
            state,
            state_override,
            status_override,
            row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("actual_start")
                .map(Timestamp::from_datetime),
            row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("actual_end")
                .map(Timestamp::from_datetime),
            row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("due_at")
                .map(Timestamp::from_datetime),
            activities,
        ));
    }
    Ok(phases)
}

async fn load_activities(
    pool: &PgPool,
    workflow_id: &WorkflowId,
    phase: PhaseName,
) -> Result<Vec<Activity>, DomainError> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, ord, activity_type, is_manual, is_optional, status,
               started_by, started_at, completed_by, completed_at
        FROM activities
        WHERE workflow_id = $1 AND phase_name = $2
        ORDER BY ord ASC
        "#,
    )
    .bind(workflow_id.as_uuid())
    .bind(phase.as_str())
    .fetch_all(pool)
    .await
    .map_err(|e| map_db_err("fetch activities", e))?;

    let mut activities = Vec::with_capacity(rows.len());
    for row in rows {
        activities.push(Activity::reconstitute(
            ActivityId::from_uuid(row.get("id")),
            row.get("name"),
            row.get::<i16, _>("ord") as u8,
            activity_type(row.get::<String, _>("activity_type").as_str())?,
            row.get("is_manual"),
            row.get("is_optional"),
            activity_status(row.get::<String, _>("status").as_str())?,
            row.get::<Option<String>, _>("started_by")
                .map(user_id)
                .transpose()?,
            row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("started_at")
                .map(Timestamp::from_datetime),
            row.get::<Option<String>, _>("completed_by")
                .map(user_id)
                .transpose()?,
            row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("completed_at")
                .map(Timestamp::from_datetime),
        ));
    }
    Ok(activities)
}

fn phase_state(raw: &str) -> Result<PhaseState, DomainError> {
    match raw {
        "not_started" => Ok(PhaseState::NotStarted),
        "in_progress" => Ok(PhaseState::InProgress),
        "complete" => Ok(PhaseState::Complete),
        other => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("Unrecognized phase state '{}'", other),
        )),
    }
}

fn activity_status(raw: &str) -> Result<ActivityStatus, DomainError> {
    match raw {
        "not_started" => Ok(ActivityStatus::NotStarted),
        "in_progress" => Ok(ActivityStatus::InProgress),
        "complete" => Ok(ActivityStatus::Complete),
        other => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("Unrecognized activity status '{}'", other),
        )),
    }
}

fn activity_type(raw: &str) -> Result<ActivityType, DomainError> {
    match raw {
        "start" => Ok(ActivityType::Start),
        "task" => Ok(ActivityType::Task),
        "review" => Ok(ActivityType::Review),
        "approval" => Ok(ActivityType::Approval),
        "complete" => Ok(ActivityType::Complete),
        other => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("Unrecognized activity type '{}'", other),
        )),
    }
}
