use crate::dev::{
    NotebookOutput, NotebookRequest, ProcessOutput, TerminalRequest, execute_notebook, run_shell,
};
use crate::error::WorkbenchError;
use crate::server::router::WorkbenchState;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    routing::post,
};

pub fn router() -> Router<WorkbenchState> {
    Router::new()
        .route("/api/terminal/exec", post(terminal_exec))
        .route("/api/notebook/execute", post(notebook_execute))
}

// The feature switch is checked before the body is parsed, so a disabled
// endpoint answers 403 even to a malformed request.
fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, WorkbenchError> {
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        serde_json::error::Category::Syntax | serde_json::error::Category::Eof => {
            WorkbenchError::InvalidJson(e.to_string())
        }
        _ => WorkbenchError::Validation(e.to_string()),
    })
}

async fn terminal_exec(
    State(state): State<WorkbenchState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ProcessOutput>, WorkbenchError> {
    if !state.dev.enable_terminal {
        return Err(WorkbenchError::FeatureDisabled("terminal"));
    }
    let req: TerminalRequest = parse_body(&body?)?;
    Ok(Json(run_shell(&state.dev, &req).await?))
}

async fn notebook_execute(
    State(state): State<WorkbenchState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<NotebookOutput>, WorkbenchError> {
    if !state.dev.enable_notebook {
        return Err(WorkbenchError::FeatureDisabled("notebook"));
    }
    let req: NotebookRequest = parse_body(&body?)?;
    Ok(Json(execute_notebook(&state.dev, &req).await?))
}
