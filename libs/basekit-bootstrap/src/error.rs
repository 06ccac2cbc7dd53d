use basekit_auth::AuthError;
use basekit_db::RepoError;
use basekit_errors::{ErrorClass, Problem, catalog};
use basekit_storage::{EmailError, StorageError};
use thiserror::Error;

/// Failure of a service call, across every collaborator.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Email(#[from] EmailError),

    /// A lookup by client-supplied identifiers found nothing.
    #[error("{0} does not exist")]
    ObjectMissing(String),
}

impl ServiceError {
    #[must_use]
    pub fn to_problem(&self) -> Problem {
        match self {
            Self::Repo(e) => e.to_problem(),
            Self::Auth(e) => e.to_problem(),
            Self::Storage(e) => e.to_problem(),
            Self::Email(e) => e.to_problem(),
            Self::ObjectMissing(_) => catalog::OBJECT_MISSING.as_problem(self.to_string()),
        }
    }

    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.to_problem().class() == ErrorClass::Client
    }
}
