use crate::cache::CacheTier;
use crate::db::DbStats;
use crate::error::WorkbenchError;
use crate::server::router::WorkbenchState;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tracing::warn;

const METRICS_CACHE_KEY: &str = "health:metrics";

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
    pub uptime_secs: u64,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(flatten)]
    pub rows: DbStats,
    pub cache_enabled: bool,
    pub cache_entries: u64,
}

pub fn router() -> Router<WorkbenchState> {
    Router::new().route("/api/health/metrics", get(metrics))
}

/// GET /api/health
///
/// Public. Answers 503 with the same body when the database does not respond.
pub async fn health(State(state): State<WorkbenchState>) -> (StatusCode, Json<HealthReport>) {
    let (status, database) = match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            warn!(error = %e, "health: database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    let report = HealthReport {
        status: if status.is_success() { "ok" } else { "degraded" },
        database,
        uptime_secs: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
    };
    (status, Json(report))
}

async fn metrics(State(state): State<WorkbenchState>) -> Result<Json<Metrics>, WorkbenchError> {
    let db = state.db.clone();
    let cache = state.cache.clone();
    let metrics = state
        .cache
        .get_or_compute(CacheTier::Short, METRICS_CACHE_KEY, || async move {
            Ok(Metrics {
                rows: db.stats().await?,
                cache_enabled: cache.is_enabled(),
                cache_entries: cache.entry_count(),
            })
        })
        .await?;
    Ok(Json(metrics))
}
