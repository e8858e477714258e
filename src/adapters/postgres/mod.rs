//! PostgreSQL adapters.
//!
//! All SQL is runtime-checked (`sqlx::query`, not the compile-time
//! macros) so builds need no live database. Every mutating method runs in
//! one transaction; workflow-scoped mutations take `SELECT ... FOR
//! UPDATE` on the workflow row as their serialization point, and
//! serialization failures surface as `ConcurrentModification` for the
//! caller to retry wholesale.

mod assignment_repository;
mod version_repository;
mod workflow_repository;

pub use assignment_repository::PgAssignmentRepository;
pub use version_repository::PgVersionRepository;
pub use workflow_repository::PgWorkflowRepository;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Maps a sqlx error onto the domain taxonomy.
///
/// Serialization failures (40001), deadlocks (40P01), and lock-not-available
/// (55P03) become `ConcurrentModification`; everything else is a
/// `DatabaseError`.
pub(crate) fn map_db_err(context: &str, err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(code) = db_err.code() {
            if code == "40001" || code == "40P01" || code == "55P03" {
                return DomainError::new(
                    ErrorCode::ConcurrentModification,
                    format!("{}: concurrent modification, retry the operation", context),
                );
            }
        }
    }
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}

/// Parses a persisted enum string through `FromStr`, mapping failures to
/// an internal error naming the column.
pub(crate) fn parse_enum<T>(column: &str, raw: &str) -> Result<T, DomainError>
where
    T: std::str::FromStr,
{
    raw.parse::<T>().map_err(|_| {
        DomainError::new(
            ErrorCode::InternalError,
            format!("Unrecognized {} value '{}'", column, raw),
        )
    })
}
