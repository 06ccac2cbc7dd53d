#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Basekit data layer.
//!
//! - [`filter`]: compiles `field__op` specifications into SQL conditions
//! - [`SessionManager`] / [`Session`]: scoped units of work over one pool
//! - [`Repository`]: generic CRUD over any [`BaseEntity`]
//! - [`RepositoryRegistry`]: explicit entity-to-repository binding
//!
//! # Example
//! ```rust,ignore
//! let sessions = SessionManager::connect(&DbConfig::default()).await?;
//! let users = basekit_db::register::<user::Entity>(sessions)?;
//!
//! let adults = users
//!     .filter(&Filters::new().with("age__gte", 18), &[OrderBy::asc("name")])
//!     .await?;
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod filter;
pub mod registry;
pub mod repository;
pub mod session;

pub use config::{DbConfig, PoolCfg, connect, redact_dsn};
pub use entity::BaseEntity;
pub use error::{RepoError, Result};
pub use filter::{Field, FieldKind, FieldMap, FilterOp, Filters, OrderBy, Values};
pub use registry::{RepositoryRegistry, register, repo};
pub use repository::{Repository, SessionRepo, WriteOptions};
pub use session::{Session, SessionManager};
