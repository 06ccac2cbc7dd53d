//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Lifetime of entries written without an explicit TTL.
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub default_ttl: Duration,

    /// Maximum number of entries held by the in-process store.
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

fn default_ttl() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_max_entries() -> u64 {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
            max_entries: default_max_entries(),
        }
    }
}
