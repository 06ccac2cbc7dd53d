//! Error surface shared by every basekit crate
//!
//! Domain crates keep their own `thiserror` enums and render them through
//! this crate when they cross the service boundary:
//! - RFC 9457 Problem Details (`Problem`)
//! - Static error definitions (`ErrDef`) and the basekit `catalog`
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
pub mod problem;

pub use catalog::{ErrDef, ErrorClass};
pub use problem::{APPLICATION_PROBLEM_JSON, Problem};
