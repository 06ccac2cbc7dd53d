//! Permission middleware.
//!
//! A [`Policy`] answers whether a caller may perform an action. [`guard`]
//! composes a policy around a service call: the call is a future that is
//! never polled when the policy refuses.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::context::RequestCtx;
use crate::errors::AuthError;

#[async_trait]
pub trait Policy: Send + Sync {
    async fn allows(&self, ctx: &RequestCtx, action: &str) -> bool;
}

/// Permits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Policy for AllowAll {
    async fn allows(&self, _ctx: &RequestCtx, _action: &str) -> bool {
        true
    }
}

/// Permits any authenticated caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

#[async_trait]
impl Policy for Authenticated {
    async fn allows(&self, ctx: &RequestCtx, _action: &str) -> bool {
        ctx.is_authenticated()
    }
}

/// Policy from a synchronous predicate.
pub struct FnPolicy<F>(pub F);

#[async_trait]
impl<F> Policy for FnPolicy<F>
where
    F: Fn(&RequestCtx, &str) -> bool + Send + Sync,
{
    async fn allows(&self, ctx: &RequestCtx, action: &str) -> bool {
        (self.0)(ctx, action)
    }
}

/// Run `call` only if `policy` allows `action` for `ctx`.
///
/// # Errors
/// `PermissionDenied` (converted into `E`) when refused, otherwise whatever
/// `call` returns.
pub async fn guard<P, T, E, Fut>(policy: &P, ctx: &RequestCtx, action: &str, call: Fut) -> Result<T, E>
where
    P: Policy + ?Sized,
    E: From<AuthError>,
    Fut: Future<Output = Result<T, E>>,
{
    if policy.allows(ctx, action).await {
        call.await
    } else {
        warn!(action, request_id = ctx.request_id(), "permission denied");
        Err(AuthError::PermissionDenied {
            action: action.to_owned(),
        }
        .into())
    }
}

/// A service value paired with the policy that protects it.
pub struct Guarded<S> {
    inner: S,
    policy: Arc<dyn Policy>,
}

impl<S> Guarded<S> {
    pub fn new(inner: S, policy: Arc<dyn Policy>) -> Self {
        Self { inner, policy }
    }

    /// Invoke `f` on the inner service if the policy allows `action`.
    ///
    /// # Errors
    /// As [`guard`].
    pub async fn call<'a, T, E, Fut>(
        &'a self,
        ctx: &RequestCtx,
        action: &str,
        f: impl FnOnce(&'a S) -> Fut,
    ) -> Result<T, E>
    where
        E: From<AuthError>,
        Fut: Future<Output = Result<T, E>>,
    {
        guard(self.policy.as_ref(), ctx, action, f(&self.inner)).await
    }

    /// The unguarded service.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}
