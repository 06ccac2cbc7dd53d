#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Best-effort key/value cache.
//!
//! [`CacheClient`] never surfaces store failures: they are logged and turned
//! into `false`/`None`. The cache is an accelerator, not a source of truth.

pub mod client;
pub mod codec;
pub mod config;
pub mod memory;
pub mod store;

pub use client::CacheClient;
pub use codec::CacheValue;
pub use config::CacheConfig;
pub use memory::MemoryStore;
pub use store::{CacheStore, CacheStoreError};
