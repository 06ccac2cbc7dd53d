use std::time::Duration;

use basekit_utils::SecretString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JwtConfig {
    /// HMAC algorithm name: `HS256`, `HS384` or `HS512`.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Signing secret. Required.
    pub secret: SecretString,

    /// Lifetime of issued access tokens.
    #[serde(default = "default_access_ttl", with = "humantime_serde")]
    pub access_ttl: Duration,

    /// Clock skew tolerated when checking expiry.
    #[serde(with = "humantime_serde")]
    pub leeway: Duration,
}

fn default_algorithm() -> String {
    "HS256".to_owned()
}

fn default_access_ttl() -> Duration {
    Duration::from_secs(10 * 24 * 60 * 60)
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            secret: SecretString::default(),
            access_ttl: default_access_ttl(),
            leeway: Duration::ZERO,
        }
    }
}
