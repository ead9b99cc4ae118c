use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// SQLite pool sizing. The pool is fixed-size and recycles idle and old connections.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// TOML: `database.max_connections`. Default: `5`.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// TOML: `database.idle_timeout_secs`. Default: `600`.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// TOML: `database.max_lifetime_secs`. Default: `1800`.
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,

    /// SQLite busy timeout.
    /// TOML: `database.busy_timeout_secs`. Default: `5`.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_lifetime_secs: default_max_lifetime_secs(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

/// Cache-aside TTL tiers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// TOML: `cache.enabled`. Default: `true`.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// TOML: `cache.short_ttl_secs`. Default: `30`.
    #[serde(default = "default_short_ttl_secs")]
    pub short_ttl_secs: u64,

    /// TOML: `cache.medium_ttl_secs`. Default: `300`.
    #[serde(default = "default_medium_ttl_secs")]
    pub medium_ttl_secs: u64,

    /// TOML: `cache.long_ttl_secs`. Default: `3600`.
    #[serde(default = "default_long_ttl_secs")]
    pub long_ttl_secs: u64,

    /// Per-tier entry bound.
    /// TOML: `cache.max_capacity`. Default: `10000`.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            short_ttl_secs: default_short_ttl_secs(),
            medium_ttl_secs: default_medium_ttl_secs(),
            long_ttl_secs: default_long_ttl_secs(),
            max_capacity: default_max_capacity(),
        }
    }
}

/// Source of the MCP server catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Remote catalog returning `{"servers":[...]}`. Unset uses the built-in catalog.
    /// TOML: `registry.url`.
    #[serde(default)]
    pub url: Option<Url>,

    /// TOML: `registry.timeout_secs`. Default: `15`.
    #[serde(default = "default_registry_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_registry_timeout_secs(),
        }
    }
}

impl RegistryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    5
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_max_lifetime_secs() -> u64 {
    1800
}

fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_short_ttl_secs() -> u64 {
    30
}

fn default_medium_ttl_secs() -> u64 {
    300
}

fn default_long_ttl_secs() -> u64 {
    3600
}

fn default_max_capacity() -> u64 {
    10_000
}

fn default_registry_timeout_secs() -> u64 {
    15
}
