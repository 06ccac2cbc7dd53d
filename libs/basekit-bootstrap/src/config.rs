//! Layered application configuration.
//!
//! Sources, lowest precedence first: compiled defaults, an optional YAML
//! file, then `APP__`-prefixed environment variables where `__` separates
//! nesting levels (`APP__DATABASE__DSN` sets `database.dsn`).

use std::path::Path;

use anyhow::{Context, bail};
use basekit_auth::JwtConfig;
use basekit_cache::CacheConfig;
use basekit_db::DbConfig;
use basekit_storage::StorageConfig;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;

pub const ENV_PREFIX: &str = "APP__";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DbConfig,
    pub cache: CacheConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Layered sources for `path` (if any) and the process environment.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// # Errors
    /// When `path` does not exist or a source holds invalid or unknown keys.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path
            && !path.is_file()
        {
            bail!("config file {} not found", path.display());
        }
        Self::load_from(&Self::figment(path))
    }

    /// # Errors
    /// When a source holds invalid or unknown keys.
    pub fn load_from(figment: &Figment) -> anyhow::Result<Self> {
        figment.extract().context("invalid configuration")
    }
}
