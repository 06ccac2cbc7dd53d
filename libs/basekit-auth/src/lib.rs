#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Token authentication and permission checks.
//!
//! - [`JwtCodec`] issues and verifies signed tokens carrying [`Claims`]
//! - [`RequestCtx`] is the per-request identity passed explicitly to services
//! - [`policy`] holds the permission middleware composed around service calls

pub mod claims;
pub mod config;
pub mod context;
pub mod errors;
pub mod jwt;
pub mod policy;

pub use claims::Claims;
pub use config::JwtConfig;
pub use context::RequestCtx;
pub use errors::{AuthError, Result};
pub use jwt::{JwtCodec, bearer_token};
pub use policy::{AllowAll, Authenticated, FnPolicy, Guarded, Policy, guard};
