//! PostgreSQL implementation of VersionRepository.
//!
//! Chains persist as `versions` rows plus `decision_items`. Updates lock
//! the owning workflow row so version transitions serialize with phase
//! mutations; the partial unique index on approved versions backstops the
//! single-approved invariant.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::{map_db_err, parse_enum};
use crate::domain::foundation::{
    DecisionItemId, DomainError, ErrorCode, LobId, Timestamp, UserId, VersionId, WorkflowId,
};
use crate::domain::phase::PhaseName;
use crate::domain::version::{Decision, DecisionItem, Version, VersionChain, VersionStatus};
use crate::ports::VersionRepository;

/// PostgreSQL implementation of VersionRepository.
#[derive(Clone)]
pub struct PgVersionRepository {
    pool: PgPool,
}

impl PgVersionRepository {
    /// Creates a new PgVersionRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn persist(&self, chain: &VersionChain) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_err("begin persist chain", e))?;

        // Version transitions share the workflow-row serialization point
        // with phase mutations.
        sqlx::query("SELECT id FROM workflows WHERE id = $1 FOR UPDATE")
            .bind(chain.workflow_id().as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_db_err("lock workflow row", e))?;

        for version in chain.versions() {
            upsert_version(&mut tx, chain, version).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_db_err("commit persist chain", e))?;
        Ok(())
    }

    async fn load_chain(
        &self,
        workflow_id: WorkflowId,
        phase: PhaseName,
    ) -> Result<Option<VersionChain>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, version_number, status, parent_version_id,
                   created_by, created_at,
                   submitted_by, submitted_at, submitted_notes,
                   approved_by, approved_at, approval_notes,
                   rejected_by, rejected_at, rejection_reason
            FROM versions
            WHERE workflow_id = $1 AND phase_name = $2
            ORDER BY version_number ASC
            "#,
        )
        .bind(workflow_id.as_uuid())
        .bind(phase.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("fetch versions", e))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut versions = Vec::with_capacity(rows.len());
        for row in rows {
            let version_id = VersionId::from_uuid(row.get::<Uuid, _>("id"));
            let items = load_items(&self.pool, &version_id).await?;
            versions.push(Version::reconstitute(
                version_id,
                row.get::<i32, _>("version_number") as u32,
                version_status(row.get::<String, _>("status").as_str())?,
                row.get::<Option<Uuid>, _>("parent_version_id")
                    .map(VersionId::from_uuid),
                user_id(row.get::<String, _>("created_by"))?,
                Timestamp::from_datetime(row.get("created_at")),
                row.get::<Option<String>, _>("submitted_by")
                    .map(user_id)
                    .transpose()?,
                row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("submitted_at")
                    .map(Timestamp::from_datetime),
                row.get("submitted_notes"),
                row.get::<Option<String>, _>("approved_by")
                    .map(user_id)
                    .transpose()?,
                row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("approved_at")
                    .map(Timestamp::from_datetime),
                row.get("approval_notes"),
                row.get::<Option<String>, _>("rejected_by")
                    .map(user_id)
                    .transpose()?,
                row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("rejected_at")
                    .map(Timestamp::from_datetime),
                row.get("rejection_reason"),
                items,
            ));
        }
        Ok(Some(VersionChain::reconstitute(workflow_id, phase, versions)))
    }
}

#[async_trait]
impl VersionRepository for PgVersionRepository {
    async fn save(&self, chain: &VersionChain) -> Result<(), DomainError> {
        self.persist(chain).await
    }

    async fn update(&self, chain: &VersionChain) -> Result<(), DomainError> {
        self.persist(chain).await
    }

    async fn find_by_phase(
        &self,
        workflow_id: &WorkflowId,
        phase: PhaseName,
    ) -> Result<Option<VersionChain>, DomainError> {
        self.load_chain(*workflow_id, phase).await
    }

    async fn find_by_version(
        &self,
        version_id: &VersionId,
    ) -> Result<Option<VersionChain>, DomainError> {
        let row = sqlx::query("SELECT workflow_id, phase_name FROM versions WHERE id = $1")
            .bind(version_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_err("locate version", e))?;

        match row {
            Some(row) => {
                let workflow_id = WorkflowId::from_uuid(row.get("workflow_id"));
                let phase: PhaseName =
                    parse_enum("phase name", row.get::<String, _>("phase_name").as_str())?;
                self.load_chain(workflow_id, phase).await
            }
            None => Ok(None),
        }
    }
}

fn user_id(raw: String) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(DomainError::from)
}

async fn upsert_version(
    tx: &mut Transaction<'_, Postgres>,
    chain: &VersionChain,
    version: &Version,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO versions (
            id, workflow_id, phase_name, version_number, status, parent_version_id,
            created_by, created_at,
            submitted_by, submitted_at, submitted_notes,
            approved_by, approved_at, approval_notes,
            rejected_by, rejected_at, rejection_reason
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        ON CONFLICT (id) DO UPDATE SET
            status = EXCLUDED.status,
            submitted_by = EXCLUDED.submitted_by,
            submitted_at = EXCLUDED.submitted_at,
            submitted_notes = EXCLUDED.submitted_notes,
            approved_by = EXCLUDED.approved_by,
            approved_at = EXCLUDED.approved_at,
            approval_notes = EXCLUDED.approval_notes,
            rejected_by = EXCLUDED.rejected_by,
            rejected_at = EXCLUDED.rejected_at,
            rejection_reason = EXCLUDED.rejection_reason
        "#,
    )
    .bind(version.id().as_uuid())
    .bind(chain.workflow_id().as_uuid())
    .bind(chain.phase().as_str())
    .bind(version.number() as i32)
    .bind(version.status().as_str())
    .bind(version.parent_version_id().map(|id| *id.as_uuid()))
    .bind(version.created_by().as_str())
    .bind(version.created_at().as_datetime())
    .bind(version.submitted_by().map(|u| u.as_str().to_string()))
    .bind(version.submitted_at().map(|t| *t.as_datetime()))
    .bind(version.submitted_notes())
    .bind(version.approved_by().map(|u| u.as_str().to_string()))
    .bind(version.approved_at().map(|t| *t.as_datetime()))
    .bind(version.approval_notes())
    .bind(version.rejected_by().map(|u| u.as_str().to_string()))
    .bind(version.rejected_at().map(|t| *t.as_datetime()))
    .bind(version.rejection_reason())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_db_err("upsert version", e))?;

    // Draft item lists can shrink as well as grow; replace wholesale.
    sqlx::query("DELETE FROM decision_items WHERE version_id = $1")
        .bind(version.id().as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_err("clear decision items", e))?;

    for item in version.items() {
        sqlx::query(
            r#"
            INSERT INTO decision_items (
                id, version_id, subject_id, lob_id, requires_assignment,
                tester_decision, tester_rationale,
                report_owner_decision, report_owner_rationale
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(item.id().as_uuid())
        .bind(version.id().as_uuid())
        .bind(item.subject_id())
        .bind(item.lob_id().value() as i64)
        .bind(item.requires_assignment())
        .bind(item.tester_decision().as_str())
        .bind(item.tester_rationale())
        .bind(item.report_owner_decision().as_str())
        .bind(item.report_owner_rationale())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_err("insert decision item", e))?;
    }
    Ok(())
}

async fn load_items(
    pool: &PgPool,
    version_id: &VersionId,
) -> Result<Vec<DecisionItem>, DomainError> {
    let rows = sqlx::query(
        r#"
        SELECT id, subject_id, lob_id, requires_assignment,
               tester_decision, tester_rationale,
               report_owner_decision, report_owner_rationale
        FROM decision_items
        WHERE version_id = $1
        ORDER BY subject_id ASC
        "#,
    )
    .bind(version_id.as_uuid())
    .fetch_all(pool)
    .await
    .map_err(|e| map_db_err("fetch decision items", e))?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(DecisionItem::reconstitute(
            DecisionItemId::from_uuid(row.get("id")),
            row.get("subject_id"),
            lob_id(row.get::<i64, _>("lob_id"))?,
            row.get("requires_assignment"),
            decision(row.get::<String, _>("tester_decision").as_str())?,
            row.get("tester_rationale"),
            decision(row.get::<String, _>("report_owner_decision").as_str())?,
            row.get("report_owner_rationale"),
        ));
    }
    Ok(items)
}

fn lob_id(raw: i64) -> Result<LobId, DomainError> {
    let raw = u32::try_from(raw).map_err(|_| {
        DomainError::new(
            ErrorCode::InternalError,
            format!("lob_id out of range: {}", raw),
        )
    })?;
    LobId::new(raw).map_err(DomainError::from)
}

fn version_status(raw: &str) -> Result<VersionStatus, DomainError> {
    match raw {
        "draft" => Ok(VersionStatus::Draft),
        "pending_approval" => Ok(VersionStatus::PendingApproval),
        "approved" => Ok(VersionStatus::Approved),
        "rejected" => Ok(VersionStatus::Rejected),
        "superseded" => Ok(VersionStatus::Superseded),
        other => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("Unrecognized version status '{}'", other),
        )),
    }
}

fn decision(raw: &str) -> Result<Decision, DomainError> {
    match raw {
        "pending" => Ok(Decision::Pending),
        "approved" => Ok(Decision::Approved),
        "rejected" => Ok(Decision::Rejected),
        other => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("Unrecognized decision '{}'", other),
        )),
    }
}
