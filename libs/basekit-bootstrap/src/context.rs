//! Process-wide collaborators, built once at startup.

use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use basekit_auth::{AuthError, JwtCodec, RequestCtx, bearer_token};
use basekit_cache::CacheClient;
use basekit_db::SessionManager;
use basekit_storage::{EmailSender, LocalStorage, LogMailer, StorageBackend};
use tracing::info;

use crate::config::AppConfig;
use crate::scope::ServiceScope;

#[derive(Clone)]
pub struct AppContext {
    sessions: SessionManager,
    cache: CacheClient,
    jwt: Arc<JwtCodec>,
    storage: Arc<dyn StorageBackend>,
    mailer: Arc<dyn EmailSender>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("sessions", &self.sessions)
            .field("cache_ttl", &self.cache.default_ttl())
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Connect the database and construct every collaborator from `cfg`.
    ///
    /// Files go to local storage and email is only logged until replaced
    /// with [`with_storage`](Self::with_storage) / [`with_mailer`](Self::with_mailer).
    ///
    /// # Errors
    /// When the database is unreachable or the JWT settings are invalid.
    pub async fn build(cfg: &AppConfig) -> anyhow::Result<Self> {
        let jwt = JwtCodec::from_config(&cfg.jwt).context("invalid jwt configuration")?;
        let sessions = SessionManager::connect(&cfg.database)
            .await
            .context("failed to connect to the database")?;
        info!(
            dsn = %basekit_db::redact_dsn(&cfg.database.dsn),
            media_dir = %cfg.storage.media_dir.display(),
            "application context ready"
        );
        Ok(Self {
            sessions,
            cache: CacheClient::in_memory(&cfg.cache),
            jwt: Arc::new(jwt),
            storage: Arc::new(LocalStorage::from_config(&cfg.storage)),
            mailer: Arc::new(LogMailer),
        })
    }

    #[must_use]
    pub fn with_storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = storage;
        self
    }

    #[must_use]
    pub fn with_mailer(mut self, mailer: Arc<dyn EmailSender>) -> Self {
        self.mailer = mailer;
        self
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    #[must_use]
    pub fn cache(&self) -> &CacheClient {
        &self.cache
    }

    #[must_use]
    pub fn jwt(&self) -> &JwtCodec {
        &self.jwt
    }

    #[must_use]
    pub fn storage(&self) -> Arc<dyn StorageBackend> {
        Arc::clone(&self.storage)
    }

    #[must_use]
    pub fn mailer(&self) -> Arc<dyn EmailSender> {
        Arc::clone(&self.mailer)
    }

    /// Caller identity from an `Authorization` header value.
    ///
    /// No header, or a non-bearer scheme, yields an anonymous context.
    ///
    /// # Errors
    /// `TokenExpired` or `TokenInvalid` when a bearer token is present but
    /// does not verify.
    pub fn request(&self, authorization: Option<&str>) -> Result<RequestCtx, AuthError> {
        let token = authorization.and_then(bearer_token);
        Ok(match self.jwt.decode_optional(token)? {
            Some(claims) => RequestCtx::authenticated(claims),
            None => RequestCtx::anonymous(),
        })
    }

    /// Open a unit of work for one request.
    #[must_use]
    pub fn scope(&self, ctx: RequestCtx) -> ServiceScope {
        ServiceScope::new(self.sessions.acquire(), ctx)
    }
}
