use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use crate::providers::ProviderKind;

/// HTTP client settings shared by every upstream call.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderDefaults {
    /// Optional upstream HTTP proxy. If set, used for the reqwest client.
    /// TOML: `providers.defaults.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// TCP connect timeout.
    /// TOML: `providers.defaults.connect_timeout_secs`. Default: `10`.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout for upstream calls.
    /// TOML: `providers.defaults.request_timeout_secs`. Default: `120`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderDefaults {
    fn default() -> Self {
        Self {
            proxy: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Per-provider overrides, e.g. `[providers.openai]`.
///
/// Stored provider configs (`PUT /api/providers/{provider}/config`) take precedence.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderEntryConfig {
    /// TOML: `providers.<name>.api_key`. Falls back to the provider's env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// TOML: `providers.<name>.base_url`. Falls back to the registry default.
    #[serde(default)]
    pub base_url: Option<Url>,
}

/// All provider configurations.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProvidersConfig {
    /// Global HTTP client settings.
    #[serde(default)]
    pub defaults: ProviderDefaults,

    /// One table per provider, keyed by registry name (`openai`, `anthropic`, ...).
    #[serde(flatten)]
    pub entries: BTreeMap<String, ProviderEntryConfig>,
}

impl ProvidersConfig {
    pub fn entry(&self, kind: ProviderKind) -> Option<&ProviderEntryConfig> {
        self.entries.get(kind.name())
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}
