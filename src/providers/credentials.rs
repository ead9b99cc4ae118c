use url::Url;

use super::ProviderKind;
use crate::{config::ProvidersConfig, db::DbProviderConfig, error::WorkbenchError};

/// Where and how to reach one provider for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAccess {
    pub api_key: Option<String>,
    pub base_url: Url,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Resolves key and base URL: stored config, then `config.toml`, then env / registry default.
///
/// `env` looks up an environment variable; callers pass `std::env::var(..).ok()`.
pub(crate) fn resolve_access(
    kind: ProviderKind,
    stored: Option<&DbProviderConfig>,
    config: &ProvidersConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ProviderAccess, WorkbenchError> {
    if stored.is_some_and(|row| !row.enabled) {
        return Err(WorkbenchError::ProviderDisabled(kind.name().to_string()));
    }
    let entry = config.entry(kind);

    let api_key = non_blank(stored.and_then(|row| row.api_key.as_deref()))
        .or_else(|| non_blank(entry.and_then(|e| e.api_key.as_deref())))
        .map(str::to_string)
        .or_else(|| {
            kind.spec()
                .env_key
                .and_then(|name| env(name))
                .filter(|v| !v.trim().is_empty())
        });

    if api_key.is_none() && kind.requires_api_key() {
        return Err(WorkbenchError::MissingApiKey(kind.name().to_string()));
    }

    let base_url = match non_blank(stored.and_then(|row| row.base_url.as_deref())) {
        Some(raw) => Url::parse(raw)?,
        None => match entry.and_then(|e| e.base_url.clone()) {
            Some(url) => url,
            None => kind.default_base_url()?,
        },
    };

    Ok(ProviderAccess { api_key, base_url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderEntryConfig;
    use chrono::Utc;

    fn stored(api_key: Option<&str>, base_url: Option<&str>, enabled: bool) -> DbProviderConfig {
        DbProviderConfig {
            id: 1,
            provider: "openai".to_string(),
            api_key: api_key.map(str::to_string),
            base_url: base_url.map(str::to_string),
            enabled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn config_with_openai_key(key: &str) -> ProvidersConfig {
        let mut cfg = ProvidersConfig::default();
        cfg.entries.insert(
            "openai".to_string(),
            ProviderEntryConfig {
                api_key: Some(key.to_string()),
                base_url: None,
            },
        );
        cfg
    }

    fn env_with(key: &'static str, value: &'static str) -> impl Fn(&str) -> Option<String> {
        move |name| (name == key).then(|| value.to_string())
    }

    #[test]
    fn stored_key_wins_over_config_and_env() {
        let row = stored(Some("sk-db"), Some("http://127.0.0.1:9/"), true);
        let access = resolve_access(
            ProviderKind::OpenAi,
            Some(&row),
            &config_with_openai_key("sk-toml"),
            env_with("OPENAI_API_KEY", "sk-env"),
        )
        .expect("resolve");

        assert_eq!(access.api_key.as_deref(), Some("sk-db"));
        assert_eq!(access.base_url.as_str(), "http://127.0.0.1:9/");
    }

    #[test]
    fn config_then_env_fallback() {
        let from_toml = resolve_access(
            ProviderKind::OpenAi,
            None,
            &config_with_openai_key("sk-toml"),
            env_with("OPENAI_API_KEY", "sk-env"),
        )
        .expect("resolve");
        assert_eq!(from_toml.api_key.as_deref(), Some("sk-toml"));
        assert_eq!(from_toml.base_url.as_str(), "https://api.openai.com/");

        let blank_row = stored(Some("  "), None, true);
        let from_env = resolve_access(
            ProviderKind::OpenAi,
            Some(&blank_row),
            &ProvidersConfig::default(),
            env_with("OPENAI_API_KEY", "sk-env"),
        )
        .expect("resolve");
        assert_eq!(from_env.api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn missing_key_and_disabled_provider() {
        let err = resolve_access(
            ProviderKind::Anthropic,
            None,
            &ProvidersConfig::default(),
            |_| None,
        )
        .expect_err("no key anywhere");
        assert!(matches!(err, WorkbenchError::MissingApiKey(p) if p == "anthropic"));

        let disabled = stored(Some("sk-db"), None, false);
        let err = resolve_access(
            ProviderKind::OpenAi,
            Some(&disabled),
            &ProvidersConfig::default(),
            |_| None,
        )
        .expect_err("disabled");
        assert!(matches!(err, WorkbenchError::ProviderDisabled(_)));
    }

    #[test]
    fn keyless_provider_resolves_without_key() {
        let access = resolve_access(
            ProviderKind::Ollama,
            None,
            &ProvidersConfig::default(),
            |_| None,
        )
        .expect("ollama needs no key");
        assert_eq!(access.api_key, None);
        assert_eq!(access.base_url.as_str(), "http://localhost:11434/");
    }
}
