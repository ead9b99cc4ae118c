mod basic;
mod dev;
mod providers;
mod services;

pub use basic::BasicConfig;
pub use dev::DevConfig;
pub use providers::{ProviderDefaults, ProviderEntryConfig, ProvidersConfig};
pub use services::{CacheConfig, DatabaseConfig, RegistryConfig};

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

use crate::providers::ProviderKind;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// SQLite pool sizing (see `database` table).
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Cache-aside TTL tiers (see `cache` table).
    #[serde(default)]
    pub cache: CacheConfig,

    /// Upstream provider credentials and HTTP client settings (see `providers` table).
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// MCP server catalog source (see `registry` table).
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Terminal and notebook execution (see `dev` table).
    #[serde(default)]
    pub dev: DevConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration from the TOML file (with defaults) and validates it.
    pub fn from_toml() -> Self {
        if !PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            panic!("config file not found: {}", DEFAULT_CONFIG_FILE);
        }
        let cfg: Self = Self::figment().extract().unwrap_or_else(|err| {
            panic!(
                "failed to extract configuration from {}: {err}",
                DEFAULT_CONFIG_FILE
            )
        });
        if let Err(reason) = cfg.validate() {
            panic!("invalid configuration: {reason}");
        }
        cfg
    }

    /// Checks invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.basic.workbench_key.trim().is_empty() {
            return Err("basic.workbench_key must be set and non-empty".to_string());
        }
        if let Some(name) = self
            .providers
            .entries
            .keys()
            .find(|name| name.parse::<ProviderKind>().is_err())
        {
            return Err(format!("providers.{name}: unsupported provider"));
        }
        if self.basic.max_body_bytes == 0 {
            return Err("basic.max_body_bytes must be at least 1".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("database.max_connections must be at least 1".to_string());
        }
        if self.dev.enable_notebook && self.dev.notebook_kernel.is_empty() {
            return Err("dev.notebook_kernel must name a program".to_string());
        }
        Ok(())
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_toml);
