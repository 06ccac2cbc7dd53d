use uuid::Uuid;

use crate::claims::Claims;
use crate::errors::{AuthError, Result};

/// Caller identity for one request, passed explicitly to services.
#[derive(Debug, Clone)]
pub struct RequestCtx {
    claims: Option<Claims>,
    request_id: String,
}

impl RequestCtx {
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            claims: None,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    #[must_use]
    pub fn authenticated(claims: Claims) -> Self {
        Self {
            claims: Some(claims),
            ..Self::anonymous()
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = id.into();
        self
    }

    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.claims.is_some()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.claims.as_ref().map(|c| c.id)
    }

    /// # Errors
    /// `Unauthenticated` for an anonymous request.
    pub fn require_user(&self) -> Result<&Claims> {
        self.claims.as_ref().ok_or(AuthError::Unauthenticated)
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}
