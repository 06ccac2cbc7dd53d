use basekit_errors::{ErrorClass, Problem, catalog};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("permission denied for '{action}'")]
    PermissionDenied { action: String },

    #[error("invalid auth configuration: {0}")]
    Config(String),

    #[error("token could not be signed: {0}")]
    Signing(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl AuthError {
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.to_problem().class() == ErrorClass::Client
    }

    pub fn to_problem(&self) -> Problem {
        let def = match self {
            AuthError::Unauthenticated => catalog::UNAUTHENTICATED,
            AuthError::TokenExpired => catalog::TOKEN_EXPIRED,
            AuthError::TokenInvalid(_) => catalog::TOKEN_INVALID,
            AuthError::PermissionDenied { .. } => catalog::PERMISSION_DENIED,
            AuthError::Config(_) | AuthError::Signing(_) => catalog::INTERNAL,
        };
        def.as_problem(self.to_string())
    }
}
