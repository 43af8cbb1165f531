pub mod entities;
pub mod reservation_repo;
pub mod user_repo;

use sea_orm::{DbErr, RuntimeErr, SqlErr, sqlx};

// SQLSTATE class 23: integrity constraint violation.
const UNIQUE_VIOLATION_CODE: &str = "23505";

/// True when the store rejected a statement over a unique constraint. The
/// callers treat that rejection as the authoritative duplicate signal.
pub fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    // `sql_err` only recognizes the concrete driver error types; fall back
    // to the SQLSTATE code so any backend reporting 23505 is caught.
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => {
            e.code().as_deref() == Some(UNIQUE_VIOLATION_CODE)
        }
        _ => false,
    }
}
