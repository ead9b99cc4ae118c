use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderMap, Request, StatusCode, Uri},
    routing::post,
};
use mcp_workbench::config::Config;
use mcp_workbench::db::DbActorArgs;
use mcp_workbench::server::router::{WorkbenchState, workbench_router};
use serde_json::{Value, json};
use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

const KEY: &str = "test-key";

#[derive(Clone, Default)]
struct CaptureState {
    reqs: Arc<Mutex<Vec<Captured>>>,
}

#[derive(Debug, Clone)]
struct Captured {
    path: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl CaptureState {
    fn record(&self, uri: &Uri, headers: HeaderMap, body: &[u8]) {
        self.reqs.lock().unwrap().push(Captured {
            path: uri.path().to_string(),
            headers,
            body: body.to_vec(),
        });
    }

    fn last(&self) -> Captured {
        self.reqs
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("upstream received no request")
    }
}

fn unique_sqlite_path(prefix: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "workbench-{prefix}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    temp_path
}

async fn spawn_test_server(app: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let base = Url::parse(&format!("http://{}", addr)).expect("valid base url");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    base
}

async fn openai_chat(
    State(state): State<CaptureState>,
    uri: Uri,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Json<Value> {
    state.record(&uri, headers, &body);
    Json(json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": "Hello from upstream" },
            "finish_reason": "stop"
        }]
    }))
}

async fn anthropic_messages(
    State(state): State<CaptureState>,
    uri: Uri,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Json<Value> {
    state.record(&uri, headers, &body);
    Json(json!({
        "content": [
            { "type": "text", "text": "Bonjour" },
            { "type": "tool_use", "id": "t1" },
            { "type": "text", "text": "!" }
        ],
        "stop_reason": "end_turn"
    }))
}

async fn rate_limited(
    State(state): State<CaptureState>,
    uri: Uri,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> (StatusCode, Json<Value>) {
    state.record(&uri, headers, &body);
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": { "message": "slow down", "type": "rate_limit" } })),
    )
}

async fn images(
    State(state): State<CaptureState>,
    uri: Uri,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Json<Value> {
    state.record(&uri, headers, &body);
    Json(json!({ "data": [{ "url": "https://img.example/1.png", "revised_prompt": "a cat" }] }))
}

async fn transcriptions(
    State(state): State<CaptureState>,
    uri: Uri,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Json<Value> {
    state.record(&uri, headers, &body);
    Json(json!({ "text": "hello world" }))
}

async fn garbage(
    State(state): State<CaptureState>,
    uri: Uri,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> &'static str {
    state.record(&uri, headers, &body);
    "<html>not json</html>"
}

async fn stalled(
    State(state): State<CaptureState>,
    uri: Uri,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Json<Value> {
    state.record(&uri, headers, &body);
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({ "choices": [] }))
}

async fn fake_upstream() -> (Url, CaptureState) {
    let capture = CaptureState::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(openai_chat))
        .route("/v1/messages", post(anthropic_messages))
        .route("/openai/v1/chat/completions", post(rate_limited))
        .route("/v1/images/generations", post(images))
        .route("/v1/audio/transcriptions", post(transcriptions))
        .route("/chat/completions", post(garbage))
        .route("/api/v1/chat/completions", post(stalled))
        .with_state(capture.clone());
    (spawn_test_server(app).await, capture)
}

async fn build_app(prefix: &str) -> Router {
    build_app_with_timeout(prefix, 10).await
}

async fn build_app_with_timeout(prefix: &str, request_timeout_secs: u64) -> Router {
    let mut cfg = Config::default();
    cfg.basic.workbench_key = KEY.to_string();
    cfg.basic.database_url = format!("sqlite:{}", unique_sqlite_path(prefix).display());
    cfg.providers.defaults.request_timeout_secs = request_timeout_secs;

    let db = mcp_workbench::db::spawn(DbActorArgs {
        database_url: cfg.basic.database_url.clone(),
        pool: cfg.database.clone(),
    })
    .await
    .expect("spawn db actor");
    let state = WorkbenchState::new(db, &cfg).expect("build state");
    workbench_router(state)
}

async fn call(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("x-api-key", KEY)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (
        status,
        serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    )
}

async fn point_provider_at(app: &Router, provider: &str, base: &Url, api_key: &str) {
    let (status, _) = call(
        app,
        "PUT",
        &format!("/api/providers/{provider}/config"),
        json!({ "api_key": api_key, "base_url": base.as_str() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn openai_dialect_round_trip() {
    let (base, capture) = fake_upstream().await;
    let app = build_app("upstream-openai").await;
    point_provider_at(&app, "openai", &base, "sk-fake").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/chat",
        json!({
            "provider": "openai",
            "model": "gpt-4o-mini",
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "hi" }
            ],
            "temperature": 0.2
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Hello from upstream");
    assert_eq!(body["provider"], "openai");
    assert_eq!(body["finish_reason"], "stop");

    let seen = capture.last();
    assert_eq!(seen.path, "/v1/chat/completions");
    assert_eq!(
        seen.headers.get("authorization").and_then(|v| v.to_str().ok()),
        Some("Bearer sk-fake")
    );
    let sent: Value = serde_json::from_slice(&seen.body).expect("upstream body json");
    assert_eq!(sent["model"], "gpt-4o-mini");
    assert_eq!(sent["stream"], false);
    assert_eq!(sent["messages"].as_array().map(Vec::len), Some(2));

    let (status, body) = call(
        &app,
        "POST",
        "/api/completions",
        json!({ "provider": "openai", "model": "gpt-4o-mini", "prompt": "say hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completion"], "Hello from upstream");
    let sent: Value = serde_json::from_slice(&capture.last().body).expect("upstream body json");
    assert_eq!(sent["messages"][0]["role"], "user");
    assert_eq!(sent["messages"][0]["content"], "say hello");
}

#[tokio::test]
async fn anthropic_dialect_lifts_system_prompt() {
    let (base, capture) = fake_upstream().await;
    let app = build_app("upstream-anthropic").await;
    point_provider_at(&app, "anthropic", &base, "ak-fake").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/chat",
        json!({
            "provider": "anthropic",
            "model": "claude-3-5-haiku-latest",
            "messages": [
                { "role": "system", "content": "answer in French" },
                { "role": "user", "content": "hello" }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Bonjour!");
    assert_eq!(body["finish_reason"], "end_turn");

    let seen = capture.last();
    assert_eq!(seen.path, "/v1/messages");
    assert_eq!(
        seen.headers.get("x-api-key").and_then(|v| v.to_str().ok()),
        Some("ak-fake")
    );
    assert_eq!(
        seen.headers
            .get("anthropic-version")
            .and_then(|v| v.to_str().ok()),
        Some("2023-06-01")
    );
    let sent: Value = serde_json::from_slice(&seen.body).expect("upstream body json");
    assert_eq!(sent["system"], "answer in French");
    assert_eq!(sent["max_tokens"], 1024);
    assert_eq!(sent["messages"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn upstream_errors_keep_status_and_text() {
    let (base, _capture) = fake_upstream().await;
    let app = build_app("upstream-errors").await;

    point_provider_at(&app, "groq", &base, "gsk-fake").await;
    let (status, body) = call(
        &app,
        "POST",
        "/api/chat",
        json!({ "provider": "groq", "model": "llama-3.1-8b-instant", "prompt": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    assert_eq!(body["error"]["message"], "slow down");

    point_provider_at(&app, "deepseek", &base, "ds-fake").await;
    let (status, body) = call(
        &app,
        "POST",
        "/api/chat",
        json!({ "provider": "deepseek", "model": "deepseek-chat", "prompt": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "BAD_UPSTREAM_PAYLOAD");

    // Nothing listens on a port we just released.
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        Url::parse(&format!("http://{addr}")).expect("url")
    };
    point_provider_at(&app, "mistral", &closed, "m-fake").await;
    let (status, body) = call(
        &app,
        "POST",
        "/api/chat",
        json!({ "provider": "mistral", "model": "mistral-small-latest", "prompt": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn slow_upstream_times_out_as_gateway_timeout() {
    let (base, capture) = fake_upstream().await;
    let app = build_app_with_timeout("upstream-timeout", 1).await;

    point_provider_at(&app, "openrouter", &base, "or-fake").await;
    let (status, body) = call(
        &app,
        "POST",
        "/api/chat",
        json!({ "provider": "openrouter", "model": "openai/gpt-4o-mini", "prompt": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "UPSTREAM_TIMEOUT");
    assert_eq!(capture.last().path, "/api/v1/chat/completions");
}

#[tokio::test]
async fn credentials_gate_the_call() {
    let (base, capture) = fake_upstream().await;
    let app = build_app("upstream-credentials").await;

    // Only meaningful when the host does not export a key for this provider.
    if std::env::var("OPENROUTER_API_KEY").is_err() {
        let (status, body) = call(
            &app,
            "POST",
            "/api/chat",
            json!({ "provider": "openrouter", "model": "openai/gpt-4o-mini", "prompt": "hi" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "MISSING_API_KEY");
    }

    point_provider_at(&app, "openai", &base, "sk-fake").await;
    let (status, _) = call(
        &app,
        "PUT",
        "/api/providers/openai/config",
        json!({ "enabled": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        "POST",
        "/api/chat",
        json!({ "provider": "openai", "model": "gpt-4o-mini", "prompt": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "PROVIDER_DISABLED");
    assert!(capture.reqs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn images_and_transcription() {
    let (base, capture) = fake_upstream().await;
    let app = build_app("upstream-media").await;
    point_provider_at(&app, "openai", &base, "sk-fake").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/images",
        json!({ "provider": "openai", "model": "dall-e-3", "prompt": "a cat", "size": "1024x1024" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["images"][0]["url"], "https://img.example/1.png");
    assert_eq!(body["images"][0]["revised_prompt"], "a cat");
    let sent: Value = serde_json::from_slice(&capture.last().body).expect("upstream body json");
    assert_eq!(sent["n"], 1);
    assert_eq!(sent["size"], "1024x1024");

    // "RIFF" in base64.
    let (status, body) = call(
        &app,
        "POST",
        "/api/audio/transcriptions",
        json!({
            "provider": "openai",
            "model": "whisper-1",
            "audio_base64": "UklGRg==",
            "file_name": "clip.wav",
            "language": "en"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "hello world");

    let seen = capture.last();
    assert_eq!(seen.path, "/v1/audio/transcriptions");
    let content_type = seen
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"));
    let raw = String::from_utf8_lossy(&seen.body);
    assert!(raw.contains("name=\"model\""));
    assert!(raw.contains("whisper-1"));
    assert!(raw.contains("filename=\"clip.wav\""));
    assert!(raw.contains("RIFF"));

    let (status, body) = call(
        &app,
        "POST",
        "/api/audio/transcriptions",
        json!({ "provider": "openai", "model": "whisper-1", "audio_base64": "%%%" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn chat_reply_stores_assistant_message() {
    let (base, capture) = fake_upstream().await;
    let app = build_app("upstream-reply").await;
    point_provider_at(&app, "openai", &base, "sk-fake").await;

    let (_, chat) = call(
        &app,
        "POST",
        "/api/chats",
        json!({ "provider": "openai", "model": "gpt-4o-mini", "system_prompt": "be kind" }),
    )
    .await;
    let chat_id = chat["id"].as_i64().expect("chat id");

    // Nothing to reply to yet.
    let (status, _) = call(&app, "POST", &format!("/api/chats/{chat_id}/reply"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    call(
        &app,
        "POST",
        &format!("/api/chats/{chat_id}/messages"),
        json!({ "role": "user", "content": "hello?" }),
    )
    .await;

    let (status, reply) = call(
        &app,
        "POST",
        &format!("/api/chats/{chat_id}/reply"),
        json!({ "max_tokens": 64 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["role"], "assistant");
    assert_eq!(reply["content"], "Hello from upstream");
    assert_eq!(reply["provider"], "openai");

    let sent: Value = serde_json::from_slice(&capture.last().body).expect("upstream body json");
    assert_eq!(sent["messages"][0]["role"], "system");
    assert_eq!(sent["messages"][0]["content"], "be kind");
    assert_eq!(sent["messages"][1]["content"], "hello?");
    assert_eq!(sent["max_tokens"], 64);

    let (_, detail) = call(&app, "GET", &format!("/api/chats/{chat_id}"), Value::Null).await;
    assert_eq!(detail["messages"].as_array().map(Vec::len), Some(2));
}
