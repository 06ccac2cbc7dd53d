use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, CacheStoreError>;

/// Raw string key/value store with per-entry expiry.
///
/// Implementations may fail; [`CacheClient`](crate::CacheClient) absorbs
/// those failures.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove `key`. Returns whether it was present.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Give an existing entry a new lifetime. Returns whether it was present.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    async fn clear(&self) -> Result<()>;
}
