//! PostgreSQL implementation of AssignmentRepository.
//!
//! The partial unique index on (type, cycle, report, subject, lob) over
//! non-cancelled rows is the dedup backstop; `insert_if_absent` uses
//! `ON CONFLICT DO NOTHING` against it, so a racing duplicate insert
//! degrades to returning the existing row.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::map_db_err;
use crate::domain::assignment::{
    Assignment, AssignmentContext, AssignmentKey, AssignmentStatus, AssignmentType, Priority,
};
use crate::domain::foundation::{
    AssignmentId, CycleId, DomainError, ErrorCode, LobId, ReportId, Role, Timestamp, UserId,
};
use crate::ports::{AssignmentRepository, InsertOutcome};

/// PostgreSQL implementation of AssignmentRepository.
#[derive(Clone)]
pub struct PgAssignmentRepository {
    pool: PgPool,
}

impl PgAssignmentRepository {
    /// Creates a new PgAssignmentRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentRepository for PgAssignmentRepository {
    async fn insert_if_absent(
        &self,
        assignment: Assignment,
    ) -> Result<InsertOutcome, DomainError> {
        let context = serde_json::to_value(assignment.context())
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO assignments (
                id, assignment_type, from_role, to_role, from_user, to_user,
                cycle_id, report_id, subject_id, lob_id, context,
                status, priority, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (assignment_type, cycle_id, report_id, subject_id, lob_id)
                WHERE status <> 'cancelled'
                DO NOTHING
            "#,
        )
        .bind(assignment.id().as_uuid())
        .bind(assignment.assignment_type().as_str())
        .bind(assignment.from_role().as_str())
        .bind(assignment.to_role().as_str())
        .bind(assignment.from_user().as_str())
        .bind(assignment.to_user().as_str())
        .bind(assignment.context().cycle_id.as_uuid())
        .bind(assignment.context().report_id.as_uuid())
        .bind(assignment.context().subject_id.as_str())
        .bind(assignment.context().lob_id.value() as i64)
        .bind(context)
        .bind(assignment.status().as_str())
        .bind(assignment.priority().as_str())
        .bind(assignment.created_at().as_datetime())
        .bind(assignment.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err("insert assignment", e))?;

        if result.rows_affected() == 1 {
            return Ok(InsertOutcome::Inserted(assignment));
        }

        // The key is taken; hand back the open row holding it.
        let existing = self.find_open_by_key(&assignment.key()).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::ConcurrentModification,
                "Assignment key contended, retry the operation",
            )
        })?;
        Ok(InsertOutcome::Existing(existing))
    }

    async fn update(&self, assignment: &Assignment) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE assignments SET
                status = $2,
                updated_at = $3,
                acknowledged_at = $4,
                completed_at = $5,
                cancelled_at = $6
            WHERE id = $1
            "#,
        )
        .bind(assignment.id().as_uuid())
        .bind(assignment.status().as_str())
        .bind(assignment.updated_at().as_datetime())
        .bind(assignment.acknowledged_at().map(|t| *t.as_datetime()))
        .bind(assignment.completed_at().map(|t| *t.as_datetime()))
        .bind(assignment.cancelled_at().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err("update assignment", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::AssignmentNotFound,
                format!("Assignment not found: {}", assignment.id()),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &AssignmentId) -> Result<Option<Assignment>, DomainError> {
        let row = sqlx::query(&select_sql("WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_err("fetch assignment", e))?;
        row.map(row_to_assignment).transpose()
    }

    async fn find_open_by_key(
        &self,
        key: &AssignmentKey,
    ) -> Result<Option<Assignment>, DomainError> {
        let row = sqlx::query(&select_sql(
            r#"
            WHERE assignment_type = $1 AND cycle_id = $2 AND report_id = $3
              AND subject_id = $4 AND lob_id = $5 AND status <> 'cancelled'
            "#,
        ))
        .bind(key.assignment_type.as_str())
        .bind(key.cycle_id.as_uuid())
        .bind(key.report_id.as_uuid())
        .bind(key.subject_id.as_str())
        .bind(key.lob_id.value() as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err("fetch assignment by key", e))?;
        row.map(row_to_assignment).transpose()
    }

    async fn list_open_for_report(
        &self,
        cycle_id: &CycleId,
        report_id: &ReportId,
    ) -> Result<Vec<Assignment>, DomainError> {
        let rows = sqlx::query(&select_sql(
            "WHERE cycle_id = $1 AND report_id = $2 AND status <> 'cancelled' ORDER BY created_at ASC",
        ))
        .bind(cycle_id.as_uuid())
        .bind(report_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("list assignments", e))?;
        rows.into_iter().map(row_to_assignment).collect()
    }
}

fn select_sql(suffix: &str) -> String {
    format!(
        r#"
        SELECT id, assignment_type, from_role, to_role, from_user, to_user,
               context, status, priority, created_at, updated_at,
               acknowledged_at, completed_at, cancelled_at
        FROM assignments
        {}
        "#,
        suffix
    )
}

fn row_to_assignment(row: sqlx::postgres::PgRow) -> Result<Assignment, DomainError> {
    let context: AssignmentContext =
        serde_json::from_value(row.get::<serde_json::Value, _>("context"))
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
    Ok(Assignment::reconstitute(
        AssignmentId::from_uuid(row.get::<Uuid, _>("id")),
        assignment_type(row.get::<String, _>("assignment_type").as_str())?,
        role(row.get::<String, _>("from_role").as_str())?,
        role(row.get::<String, _>("to_role").as_str())?,
        user_id(row.get::<String, _>("from_user"))?,
        user_id(row.get::<String, _>("to_user"))?,
        context,
        assignment_status(row.get::<String, _>("status").as_str())?,
        priority(row.get::<String, _>("priority").as_str())?,
        Timestamp::from_datetime(row.get("created_at")),
        Timestamp::from_datetime(row.get("updated_at")),
        row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("acknowledged_at")
            .map(Timestamp::from_datetime),
        row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("completed_at")
            .map(Timestamp::from_datetime),
        row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("cancelled_at")
            .map(Timestamp::from_datetime),
    ))
}

fn user_id(raw: String) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(DomainError::from)
}

fn role(raw: &str) -> Result<Role, DomainError> {
    raw.parse::<Role>().map_err(DomainError::from)
}

fn assignment_type(raw: &str) -> Result<AssignmentType, DomainError> {
    match raw {
        "lob_assignment" => Ok(AssignmentType::LobAssignment),
        "approval_request" => Ok(AssignmentType::ApprovalRequest),
        "information_request" => Ok(AssignmentType::InformationRequest),
        other => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("Unrecognized assignment type '{}'", other),
        )),
    }
}

fn assignment_status(raw: &str) -> Result<AssignmentStatus, DomainError> {
    match raw {
        "assigned" => Ok(AssignmentStatus::Assigned),
        "acknowledged" => Ok(AssignmentStatus::Acknowledged),
        "completed" => Ok(AssignmentStatus::Completed),
        "cancelled" => Ok(AssignmentStatus::Cancelled),
        other => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("Unrecognized assignment status '{}'", other),
        )),
    }
}

fn priority(raw: &str) -> Result<Priority, DomainError> {
    match raw {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        "critical" => Ok(Priority::Critical),
        other => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("Unrecognized priority '{}'", other),
        )),
    }
}
