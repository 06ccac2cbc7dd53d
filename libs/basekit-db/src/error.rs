use basekit_errors::{ErrorClass, Problem, catalog};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::filter::FieldKind;

/// Errors surfaced by filters, sessions and repositories.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("invalid field: {0}")]
    InvalidField(String),

    #[error("unsupported filter operator: {0}")]
    UnsupportedOperator(String),

    #[error("invalid value for '{field}': expected {expected}, got {got}")]
    InvalidValue {
        field: String,
        expected: FieldKind,
        got: &'static str,
    },

    #[error("field '{0}' cannot be changed")]
    ImmutableField(String),

    #[error("{entity} not found with {filters}")]
    NotFound { entity: String, filters: String },

    #[error("more than one {entity} matches {filters}")]
    MultipleResults { entity: String, filters: String },

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("{0} has no soft-delete flag")]
    SoftDeleteUnsupported(String),

    #[error("invalid descriptor for {entity}: {reason}")]
    InvalidDescriptor { entity: String, reason: String },

    #[error("a repository for {0} is already registered")]
    AlreadyRegistered(&'static str),

    #[error("no repository registered for {0}")]
    NotRegistered(&'static str),

    #[error("invalid database configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Db(DbErr),
}

pub type Result<T> = std::result::Result<T, RepoError>;

impl From<DbErr> for RepoError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(msg) | SqlErr::ForeignKeyConstraintViolation(msg)) =
            err.sql_err()
        {
            return RepoError::Constraint(msg);
        }
        let msg = err.to_string();
        if is_constraint_message(&msg) {
            RepoError::Constraint(msg)
        } else {
            RepoError::Db(err)
        }
    }
}

// Not-null and check violations are not classified by SeaORM.
fn is_constraint_message(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    msg.contains("constraint failed")
        || msg.contains("violates not-null constraint")
        || msg.contains("violates check constraint")
        || msg.contains("duplicate key value")
}

impl RepoError {
    /// Whether the caller caused this error (4xx) rather than the store (5xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.to_problem().class() == ErrorClass::Client
    }

    pub fn to_problem(&self) -> Problem {
        let def = match self {
            RepoError::InvalidField(_) => catalog::INVALID_FIELD,
            RepoError::UnsupportedOperator(_) => catalog::UNSUPPORTED_OPERATOR,
            RepoError::InvalidValue { .. } => catalog::INVALID_VALUE,
            RepoError::ImmutableField(_) => catalog::IMMUTABLE_FIELD,
            RepoError::NotFound { .. } => catalog::NOT_FOUND,
            RepoError::MultipleResults { .. } => catalog::MULTIPLE_RESULTS,
            RepoError::Constraint(_) => catalog::CONSTRAINT_VIOLATION,
            RepoError::SoftDeleteUnsupported(_)
            | RepoError::InvalidDescriptor { .. }
            | RepoError::AlreadyRegistered(_)
            | RepoError::NotRegistered(_)
            | RepoError::Config(_)
            | RepoError::Db(_) => catalog::INTERNAL,
        };
        def.as_problem(self.to_string())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        let err = RepoError::InvalidField("nonexistent".to_owned());
        assert!(err.is_client_error());
        assert_eq!(err.to_problem().status.as_u16(), 400);
    }

    #[test]
    fn not_found_is_distinct_from_store_failures() {
        let missing = RepoError::NotFound {
            entity: "users".to_owned(),
            filters: "{id=1}".to_owned(),
        };
        let store = RepoError::from(DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "connection refused".to_owned(),
        )));
        assert_eq!(missing.to_problem().status.as_u16(), 404);
        assert!(missing.is_client_error());
        assert_eq!(store.to_problem().status.as_u16(), 500);
        assert!(!store.is_client_error());
    }

    #[test]
    fn constraint_messages_are_classified() {
        let err = RepoError::from(DbErr::Exec(sea_orm::RuntimeErr::Internal(
            "NOT NULL constraint failed: users.email".to_owned(),
        )));
        assert!(matches!(err, RepoError::Constraint(_)));
        assert_eq!(err.to_problem().status.as_u16(), 500);
        assert!(!err.is_client_error());
    }
}
