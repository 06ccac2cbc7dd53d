use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::codec::CacheValue;
use crate::config::CacheConfig;
use crate::memory::MemoryStore;
use crate::store::CacheStore;

/// Typed, best-effort front for a [`CacheStore`].
///
/// Every method reports failure as a sentinel (`false` or `None`) after
/// logging it; nothing here returns an error.
#[derive(Clone)]
pub struct CacheClient {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl CacheClient {
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, cfg: &CacheConfig) -> Self {
        Self {
            store,
            default_ttl: cfg.default_ttl,
        }
    }

    /// Client over a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory(cfg: &CacheConfig) -> Self {
        Self::new(Arc::new(MemoryStore::from_config(cfg)), cfg)
    }

    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `value` under `key` for `ttl`, or the default TTL.
    ///
    /// A `None`-equivalent value is accepted without touching the store.
    pub async fn set(&self, key: &str, value: impl Into<CacheValue>, ttl: Option<Duration>) -> bool {
        let value = value.into();
        if value.is_none() {
            debug!(key, "cache set skipped for empty value");
            return true;
        }
        let raw = match value.encode() {
            Ok(raw) => raw,
            Err(e) => {
                error!(key, error = %e, "cache value could not be encoded");
                return false;
            }
        };
        match self.store.set(key, raw, ttl.unwrap_or(self.default_ttl)).await {
            Ok(()) => true,
            Err(e) => {
                error!(key, error = %e, "cache set failed");
                false
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        match self.store.get(key).await {
            Ok(raw) => raw.as_deref().map(CacheValue::decode),
            Err(e) => {
                error!(key, error = %e, "cache get failed");
                None
            }
        }
    }

    /// Read and deserialize a cached value.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?.into_json();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                error!(key, error = %e, "cached value has an unexpected shape");
                None
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(existed) => existed,
            Err(e) => {
                error!(key, error = %e, "cache delete failed");
                false
            }
        }
    }

    pub async fn expire(&self, key: &str, ttl: Duration) -> bool {
        match self.store.expire(key, ttl).await {
            Ok(existed) => existed,
            Err(e) => {
                error!(key, error = %e, "cache expire failed");
                false
            }
        }
    }

    pub async fn clear(&self) -> bool {
        match self.store.clear().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "cache clear failed");
                false
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::store::{CacheStoreError, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use tracing_test::traced_test;

    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
            Err(CacheStoreError::Unavailable("connection refused".into()))
        }

        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(CacheStoreError::Unavailable("connection refused".into()))
        }

        async fn delete(&self, _key: &str) -> Result<bool> {
            Err(CacheStoreError::Unavailable("connection refused".into()))
        }

        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool> {
            Err(CacheStoreError::Unavailable("connection refused".into()))
        }

        async fn clear(&self) -> Result<()> {
            Err(CacheStoreError::Unavailable("connection refused".into()))
        }
    }

    fn client() -> CacheClient {
        CacheClient::in_memory(&CacheConfig::default())
    }

    #[tokio::test]
    async fn structured_round_trip() {
        let cache = client();
        assert!(cache.set("k", json!({"a": 1}), None).await);
        assert_eq!(cache.get("k").await, Some(CacheValue::Json(json!({"a": 1}))));
    }

    #[tokio::test]
    async fn booleans_come_back_as_booleans() {
        let cache = client();
        assert!(cache.set("flag", true, None).await);
        assert_eq!(cache.get("flag").await, Some(CacheValue::Bool(true)));
        assert_eq!(cache.get_json::<bool>("flag").await, Some(true));
    }

    #[tokio::test]
    async fn strings_pass_through() {
        let cache = client();
        assert!(cache.set("greeting", "hello there", None).await);
        let v = cache.get("greeting").await.unwrap();
        assert_eq!(v.as_str(), Some("hello there"));
    }

    #[tokio::test]
    async fn none_is_a_successful_no_op() {
        let cache = client();
        assert!(cache.set("k", None::<String>, None).await);
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn get_json_deserializes_typed_values() {
        #[derive(serde::Deserialize, PartialEq, Debug)]
        struct Profile {
            name: String,
        }
        let cache = client();
        cache.set("p", json!({"name": "Ann"}), None).await;

        assert_eq!(
            cache.get_json::<Profile>("p").await,
            Some(Profile { name: "Ann".into() })
        );
        assert_eq!(cache.get_json::<Vec<i32>>("p").await, None);
    }

    #[tokio::test]
    async fn explicit_ttl_overrides_default() {
        let cache = client();
        assert_eq!(cache.default_ttl(), Duration::from_secs(3600));

        cache.set("k", "v", Some(Duration::from_millis(200))).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn delete_expire_and_clear() {
        let cache = client();
        cache.set("a", "1", None).await;
        cache.set("b", "2", None).await;

        assert!(cache.delete("a").await);
        assert!(!cache.delete("a").await);
        assert!(cache.expire("b", Duration::from_secs(30)).await);
        assert!(cache.clear().await);
        assert_eq!(cache.get("b").await, None);
    }

    #[tokio::test]
    #[traced_test]
    async fn store_failures_are_logged_and_swallowed() {
        let cache = CacheClient::new(Arc::new(DownStore), &CacheConfig::default());

        assert!(!cache.set("k", "v", None).await);
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.get_json::<String>("k").await, None);
        assert!(!cache.delete("k").await);
        assert!(!cache.expire("k", Duration::from_secs(1)).await);
        assert!(!cache.clear().await);

        assert!(logs_contain("cache set failed"));
        assert!(logs_contain("cache get failed"));
        assert!(logs_contain("connection refused"));
    }
}
