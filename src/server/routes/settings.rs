use crate::cache::CacheTier;
use crate::error::WorkbenchError;
use crate::server::extract::{Validate, ValidJson};
use crate::server::router::WorkbenchState;
use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

const SETTINGS_CACHE_KEY: &str = "settings";
const MAX_KEY_LEN: usize = 128;

/// Partial settings update. A `null` value removes the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsUpdate(pub BTreeMap<String, Value>);

impl Validate for SettingsUpdate {
    fn validate(&self) -> Result<(), WorkbenchError> {
        if let Some(bad) = self
            .0
            .keys()
            .find(|k| k.trim().is_empty() || k.len() > MAX_KEY_LEN)
        {
            return Err(WorkbenchError::Validation(format!(
                "invalid settings key {bad:?}"
            )));
        }
        Ok(())
    }
}

pub fn router() -> Router<WorkbenchState> {
    Router::new().route("/api/settings", get(get_settings).put(put_settings))
}

async fn get_settings(
    State(state): State<WorkbenchState>,
) -> Result<Json<BTreeMap<String, Value>>, WorkbenchError> {
    let db = state.db.clone();
    let settings = state
        .cache
        .get_or_compute(CacheTier::Medium, SETTINGS_CACHE_KEY, || async move {
            db.get_settings().await
        })
        .await?;
    Ok(Json(settings))
}

async fn put_settings(
    State(state): State<WorkbenchState>,
    ValidJson(SettingsUpdate(update)): ValidJson<SettingsUpdate>,
) -> Result<Json<BTreeMap<String, Value>>, WorkbenchError> {
    let keys = update.len();
    let merged = state.db.put_settings(update).await?;
    state.cache.invalidate(CacheTier::Medium, SETTINGS_CACHE_KEY);
    info!(keys, total = merged.len(), "settings updated");
    Ok(Json(merged))
}
