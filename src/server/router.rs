use crate::cache::CacheLayer;
use crate::config::{Config, DevConfig};
use crate::db::DbActorHandle;
use crate::error::WorkbenchError;
use crate::mcp::McpRegistry;
use crate::providers::ProviderClient;
use crate::server::guards::auth::RequireKeyAuth;
use crate::server::routes;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderName, HeaderValue, Version, header::USER_AGENT},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use base64::Engine as _;
use rand::RngCore;
use std::{sync::Arc, time::Instant};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

/// Everything a handler can reach. Cheap to clone: all members are handles.
#[derive(Clone)]
pub struct WorkbenchState {
    pub db: DbActorHandle,
    pub cache: CacheLayer,
    pub providers: ProviderClient,
    pub registry: McpRegistry,
    pub dev: Arc<DevConfig>,
    pub workbench_key: Arc<str>,
    pub started_at: Instant,
    pub cors_permissive: bool,
    pub max_body_bytes: usize,
}

impl WorkbenchState {
    pub fn new(db: DbActorHandle, cfg: &Config) -> Result<Self, WorkbenchError> {
        let cache = CacheLayer::new(&cfg.cache);
        let providers = ProviderClient::new(db.clone(), Arc::new(cfg.providers.clone()))?;
        // The catalog fetch shares the provider client's pool and proxy.
        let registry = McpRegistry::new(
            providers.http().clone(),
            Arc::new(cfg.registry.clone()),
            cache.clone(),
        );

        Ok(Self {
            db,
            cache,
            providers,
            registry,
            dev: Arc::new(cfg.dev.clone()),
            workbench_key: Arc::from(cfg.basic.workbench_key.as_str()),
            started_at: Instant::now(),
            cors_permissive: cfg.basic.cors_permissive,
            max_body_bytes: cfg.basic.max_body_bytes,
        })
    }
}

async fn not_found_handler(req: Request) -> WorkbenchError {
    WorkbenchError::NotFound(format!("no route for {} {}", req.method(), req.uri().path()))
}

async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(generate_request_id, str::to_string);

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    // Path only: `?key=` must never reach the log.
    let path = uri.path();
    let protocol = format_http_version(version);

    if status.is_server_error() {
        error!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else if status.is_client_error() {
        warn!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else {
        info!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    }

    resp
}

pub fn workbench_router(state: WorkbenchState) -> Router {
    let guarded = Router::new()
        .merge(routes::health::router())
        .merge(routes::chats::router())
        .merge(routes::messages::router())
        .merge(routes::datasets::router())
        .merge(routes::providers::router())
        .merge(routes::invoke::router())
        .merge(routes::settings::router())
        .merge(routes::registry::router())
        .merge(routes::feedback::router())
        .merge(routes::dev::router())
        .layer(middleware::from_extractor_with_state::<RequireKeyAuth, _>(
            state.clone(),
        ));

    let public = Router::new().route("/api/health", get(routes::health::health));

    let cors = if state.cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .merge(public)
        .merge(guarded)
        .fallback(not_found_handler)
        .with_state(state)
        .layer(body_limit)
        .layer(cors)
        .layer(middleware::from_fn(access_log))
}
