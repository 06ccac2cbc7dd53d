#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Application wiring for basekit services.
//!
//! Load an [`AppConfig`], call [`init_logging`], build an [`AppContext`] once
//! at startup, then open a [`ServiceScope`] per request.

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod scope;

pub use config::{AppConfig, ENV_PREFIX};
pub use context::AppContext;
pub use error::ServiceError;
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use scope::ServiceScope;
