use crate::cache::CacheTier;
use crate::db::{
    DbModelOverride, DbProviderConfig, ModelOverrideUpsert, ProviderConfigUpsert, RecordRef,
};
use crate::error::WorkbenchError;
use crate::providers::{Capability, ProviderKind, merged_model_list, resolve_access};
use crate::server::extract::{ValidPath, Validate, ValidJson, require_non_blank};
use crate::server::router::WorkbenchState;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use workbench_schema::OpenaiModelList;

const PROVIDER_LISTING_CACHE_KEY: &str = "providers:listing";
const MASK: &str = "****";

/// One registry row as the dashboard sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub name: String,
    pub display_name: String,
    pub base_url: String,
    pub capabilities: Vec<Capability>,
    pub streaming: bool,
    pub requires_api_key: bool,
    pub env_key: Option<String>,
    /// A key (or no need for one) resolves from DB, config or env.
    pub configured: bool,
    pub enabled: bool,
    pub default_models: Vec<String>,
}

/// Stored provider config with the key masked.
#[derive(Debug, Clone, Serialize)]
pub struct MaskedProviderConfig {
    pub id: i64,
    pub provider: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbProviderConfig> for MaskedProviderConfig {
    fn from(row: DbProviderConfig) -> Self {
        Self {
            id: row.id,
            provider: row.provider,
            api_key: row.api_key.as_deref().map(mask_key),
            base_url: row.base_url,
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Keeps the last four characters of long keys.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return MASK.to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{MASK}{tail}")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfigBody {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl Validate for ProviderConfigBody {
    fn validate(&self) -> Result<(), WorkbenchError> {
        if let Some(raw) = self.base_url.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let url = url::Url::parse(raw)
                .map_err(|e| WorkbenchError::Validation(format!("base_url: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(WorkbenchError::Validation(
                    "base_url must be http or https".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOverrideBody {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_enabled() -> bool {
    true
}

impl Validate for ModelOverrideBody {
    fn validate(&self) -> Result<(), WorkbenchError> {
        self.provider.parse::<ProviderKind>()?;
        require_non_blank("model", &self.model)?;
        if self.max_tokens == Some(0) {
            return Err(WorkbenchError::Validation(
                "max_tokens must be at least 1".to_string(),
            ));
        }
        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(WorkbenchError::Validation(
                "temperature must be between 0 and 2".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn router() -> Router<WorkbenchState> {
    Router::new()
        .route("/api/providers", get(list_providers))
        .route("/api/providers/configs", get(list_configs))
        .route(
            "/api/providers/{provider}/config",
            axum::routing::put(put_config).delete(delete_config),
        )
        .route("/api/providers/{provider}/models", get(list_models))
        .route(
            "/api/model-overrides",
            get(list_overrides).put(put_override),
        )
        .route("/api/model-overrides/{id}", delete(delete_override))
}

fn summarize(
    kind: ProviderKind,
    stored: Option<&DbProviderConfig>,
    state: &WorkbenchState,
) -> ProviderSummary {
    let spec = kind.spec();
    let enabled = stored.is_none_or(|row| row.enabled);
    // Probe as if enabled so a disabled provider still reports its key state.
    let probe = stored.cloned().map(|mut row| {
        row.enabled = true;
        row
    });
    let access = resolve_access(kind, probe.as_ref(), state.providers.config(), |name| {
        std::env::var(name).ok()
    })
    .ok();

    let capabilities = [
        Capability::Chat,
        Capability::ImageGeneration,
        Capability::AudioTranscription,
    ]
    .into_iter()
    .filter(|c| kind.supports(*c))
    .collect();

    ProviderSummary {
        name: spec.name.to_string(),
        display_name: spec.display_name.to_string(),
        base_url: access
            .as_ref()
            .map_or_else(|| spec.base_url.to_string(), |a| a.base_url.to_string()),
        capabilities,
        streaming: spec.streaming,
        requires_api_key: kind.requires_api_key(),
        env_key: spec.env_key.map(str::to_string),
        configured: access.is_some(),
        enabled,
        default_models: spec.default_models.iter().map(|m| (*m).to_string()).collect(),
    }
}

async fn list_providers(
    State(state): State<WorkbenchState>,
) -> Result<Json<Vec<ProviderSummary>>, WorkbenchError> {
    let listing = state
        .cache
        .get_or_compute(CacheTier::Long, PROVIDER_LISTING_CACHE_KEY, || async {
            let stored = state.db.list_provider_configs().await?;
            Ok(ProviderKind::ALL
                .into_iter()
                .map(|kind| {
                    let row = stored.iter().find(|row| row.provider == kind.name());
                    summarize(kind, row, &state)
                })
                .collect::<Vec<_>>())
        })
        .await?;
    Ok(Json(listing))
}

async fn list_configs(
    State(state): State<WorkbenchState>,
) -> Result<Json<Vec<MaskedProviderConfig>>, WorkbenchError> {
    let rows = state.db.list_provider_configs().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

async fn put_config(
    State(state): State<WorkbenchState>,
    ValidPath(provider): ValidPath<String>,
    ValidJson(body): ValidJson<ProviderConfigBody>,
) -> Result<Json<MaskedProviderConfig>, WorkbenchError> {
    let provider: ProviderKind = provider.parse()?;
    let row = state
        .db
        .upsert_provider_config(ProviderConfigUpsert {
            provider,
            api_key: body.api_key.map(|k| k.trim().to_string()),
            base_url: body.base_url.map(|u| u.trim().to_string()),
            enabled: body.enabled,
        })
        .await?;
    state
        .cache
        .invalidate(CacheTier::Long, PROVIDER_LISTING_CACHE_KEY);
    info!(provider = %provider, enabled = row.enabled, "provider config saved");

    Ok(Json(row.into()))
}

async fn delete_config(
    State(state): State<WorkbenchState>,
    ValidPath(provider): ValidPath<String>,
) -> Result<StatusCode, WorkbenchError> {
    let provider: ProviderKind = provider.parse()?;
    state.db.delete(RecordRef::ProviderConfig(provider)).await?;
    state
        .cache
        .invalidate(CacheTier::Long, PROVIDER_LISTING_CACHE_KEY);
    info!(provider = %provider, "provider config removed");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_models(
    State(state): State<WorkbenchState>,
    ValidPath(provider): ValidPath<String>,
) -> Result<Json<OpenaiModelList>, WorkbenchError> {
    let provider: ProviderKind = provider.parse()?;
    let overrides = state.db.list_model_overrides().await?;
    Ok(Json(merged_model_list(provider, &overrides)))
}

async fn list_overrides(
    State(state): State<WorkbenchState>,
) -> Result<Json<Vec<DbModelOverride>>, WorkbenchError> {
    Ok(Json(state.db.list_model_overrides().await?))
}

async fn put_override(
    State(state): State<WorkbenchState>,
    ValidJson(body): ValidJson<ModelOverrideBody>,
) -> Result<Json<DbModelOverride>, WorkbenchError> {
    let provider: ProviderKind = body.provider.parse()?;
    let row = state
        .db
        .upsert_model_override(ModelOverrideUpsert {
            provider,
            model: body.model.trim().to_string(),
            display_name: body.display_name,
            enabled: body.enabled,
            max_tokens: body.max_tokens,
            temperature: body.temperature,
        })
        .await?;
    Ok(Json(row))
}

async fn delete_override(
    State(state): State<WorkbenchState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, WorkbenchError> {
    state.db.delete(RecordRef::ModelOverride(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
