use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use mcp_workbench::config::Config;
use mcp_workbench::db::DbActorArgs;
use mcp_workbench::server::router::{WorkbenchState, workbench_router};
use serde_json::{Value, json};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

const KEY: &str = "test-key";

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

async fn build_app(prefix: &str, tweak: impl FnOnce(&mut Config)) -> Router {
    let mut cfg = Config::default();
    cfg.basic.workbench_key = KEY.to_string();
    cfg.basic.database_url = format!("sqlite:{}", unique_sqlite_path(prefix).display());
    tweak(&mut cfg);

    let db = mcp_workbench::db::spawn(DbActorArgs {
        database_url: cfg.basic.database_url.clone(),
        pool: cfg.database.clone(),
    })
    .await
    .expect("spawn db actor");
    workbench_router(WorkbenchState::new(db, &cfg).expect("build state"))
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
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
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn dev_features_are_off_by_default() {
    let app = build_app("dev-off", |_| {}).await;

    let (status, body) = post(&app, "/api/terminal/exec", r#"{"command":"echo hi"}"#).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FEATURE_DISABLED");

    // Disabled wins over a malformed body.
    let (status, _) = post(&app, "/api/notebook/execute", "garbage").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[cfg(unix)]
#[tokio::test]
async fn terminal_runs_times_out_and_truncates() {
    let app = build_app("dev-terminal", |cfg| {
        cfg.dev.enable_terminal = true;
        cfg.dev.shell = "sh".to_string();
        cfg.dev.terminal_timeout_secs = 1;
        cfg.dev.max_output_chars = 16;
    })
    .await;

    let (status, body) = post(&app, "/api/terminal/exec", r#"{"command":"echo hi"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stdout"], "hi\n");
    assert_eq!(body["exit_code"], 0);
    assert_eq!(body["timed_out"], false);

    let (status, body) = post(&app, "/api/terminal/exec", r#"{"command":"exit 3"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exit_code"], 3);

    let (status, body) = post(&app, "/api/terminal/exec", r#"{"command":"sleep 5"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timed_out"], true);

    let (_, body) = post(
        &app,
        "/api/terminal/exec",
        &json!({ "command": "printf '%0100d' 0" }).to_string(),
    )
    .await;
    let stdout = body["stdout"].as_str().expect("stdout");
    assert!(stdout.ends_with("[truncated]"));
    assert!(stdout.chars().count() < 100);

    let (status, body) = post(&app, "/api/terminal/exec", r#"{"command":"   "}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[cfg(unix)]
#[tokio::test]
async fn notebook_stops_on_first_failure() {
    let app = build_app("dev-notebook", |cfg| {
        cfg.dev.enable_notebook = true;
        cfg.dev.notebook_kernel = vec!["sh".to_string(), "-c".to_string()];
        cfg.dev.notebook_timeout_secs = 5;
    })
    .await;

    let (status, body) = post(
        &app,
        "/api/notebook/execute",
        r#"{"cells":[{"source":"echo one"},{"source":"exit 1"},{"source":"echo three"}]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(body["cells"][0]["status"], "ok");
    assert_eq!(body["cells"][0]["stdout"], "one\n");
    assert_eq!(body["cells"][1]["status"], "error");
    assert_eq!(body["cells"][2]["status"], "skipped");

    let (_, body) = post(
        &app,
        "/api/notebook/execute",
        r#"{"cells":[{"source":"exit 1"},{"source":"echo two"}],"stop_on_error":false}"#,
    )
    .await;
    assert_eq!(body["cells"][1]["status"], "ok");
}
