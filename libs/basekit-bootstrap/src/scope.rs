//! Per-request unit of work.
//!
//! A [`ServiceScope`] pairs one database session with the caller's
//! [`RequestCtx`]. Handlers create it through [`AppContext::scope`](crate::AppContext::scope),
//! run repository calls against it and end it with [`ServiceScope::finish`].

use basekit_auth::{Policy, RequestCtx, guard};
use basekit_db::{BaseEntity, Filters, RepoError, Repository, Session, SessionRepo};
use basekit_errors::Problem;
use sea_orm::{ActiveModelTrait, IntoActiveModel};
use tracing::debug;

use crate::error::ServiceError;

#[derive(Debug)]
pub struct ServiceScope {
    session: Session,
    ctx: RequestCtx,
}

impl ServiceScope {
    #[must_use]
    pub fn new(session: Session, ctx: RequestCtx) -> Self {
        Self { session, ctx }
    }

    #[must_use]
    pub fn ctx(&self) -> &RequestCtx {
        &self.ctx
    }

    pub fn session(&mut self) -> &mut Session {
        &mut self.session
    }

    /// `repo` bound to this scope's session.
    pub fn repo<'s, E: BaseEntity>(&'s mut self, repo: &'s Repository<E>) -> SessionRepo<'s, E> {
        repo.on(&mut self.session)
    }

    /// # Errors
    /// `PermissionDenied` when `policy` refuses `action` for this caller.
    pub async fn authorize<P: Policy + ?Sized>(&self, policy: &P, action: &str) -> Result<(), ServiceError> {
        guard(policy, &self.ctx, action, async { Ok(()) }).await
    }

    /// Exactly one row matching `filters`.
    ///
    /// # Errors
    /// `ObjectMissing` when nothing matches, otherwise as
    /// [`SessionRepo::get`].
    pub async fn get_object<E>(&mut self, repo: &Repository<E>, filters: &Filters) -> Result<E::Model, ServiceError>
    where
        E: BaseEntity,
        E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
        E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
    {
        match self.repo(repo).get(filters).await {
            Ok(model) => Ok(model),
            Err(RepoError::NotFound { entity, .. }) => Err(ServiceError::ObjectMissing(entity)),
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    /// As [`Session::commit`].
    pub async fn commit(&mut self) -> Result<(), ServiceError> {
        Ok(self.session.commit().await?)
    }

    /// # Errors
    /// As [`Session::rollback`].
    pub async fn rollback(&mut self) -> Result<(), ServiceError> {
        Ok(self.session.rollback().await?)
    }

    /// End the scope. Uncommitted work is discarded; `res` is returned as is.
    ///
    /// # Errors
    /// Returns `res` unchanged.
    pub async fn finish<T>(self, res: Result<T, ServiceError>) -> Result<T, ServiceError> {
        if let Err(e) = &res {
            debug!(request_id = self.ctx.request_id(), error = %e, "request failed");
        }
        self.session.close().await;
        res
    }

    /// `err` as a problem document tagged with this request's id.
    #[must_use]
    pub fn problem(&self, err: &ServiceError) -> Problem {
        err.to_problem().with_request_id(self.ctx.request_id())
    }
}
