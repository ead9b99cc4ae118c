//! Normalized provider calls: the request names a provider and model, the
//! answer comes back in one shape whatever the upstream dialect.

use crate::error::WorkbenchError;
use crate::server::extract::ValidJson;
use crate::server::router::WorkbenchState;
use axum::{Json, Router, extract::State, routing::post};
use tracing::debug;
use workbench_schema::{
    ChatOutput, ChatRequest, CompletionOutput, CompletionRequest, ImageOutput, ImageRequest,
    TranscriptionOutput, TranscriptionRequest,
};

pub fn router() -> Router<WorkbenchState> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/completions", post(completions))
        .route("/api/images", post(images))
        .route("/api/audio/transcriptions", post(transcriptions))
}

async fn chat(
    State(state): State<WorkbenchState>,
    ValidJson(body): ValidJson<ChatRequest>,
) -> Result<Json<ChatOutput>, WorkbenchError> {
    debug!(provider = %body.provider, model = %body.model, turns = body.messages.len(), "chat request");
    Ok(Json(state.providers.chat(body).await?))
}

async fn completions(
    State(state): State<WorkbenchState>,
    ValidJson(body): ValidJson<CompletionRequest>,
) -> Result<Json<CompletionOutput>, WorkbenchError> {
    Ok(Json(state.providers.complete(body).await?))
}

async fn images(
    State(state): State<WorkbenchState>,
    ValidJson(body): ValidJson<ImageRequest>,
) -> Result<Json<ImageOutput>, WorkbenchError> {
    Ok(Json(state.providers.generate_images(body).await?))
}

async fn transcriptions(
    State(state): State<WorkbenchState>,
    ValidJson(body): ValidJson<TranscriptionRequest>,
) -> Result<Json<TranscriptionOutput>, WorkbenchError> {
    Ok(Json(state.providers.transcribe(body).await?))
}
