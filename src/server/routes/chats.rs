use crate::db::{ChatCreate, ChatDetail, ChatPatch, DbChat, RecordCreate, RecordPatch, RecordRef};
use crate::error::WorkbenchError;
use crate::providers::ProviderKind;
use crate::server::extract::{ValidPath, Validate, ValidJson, require_non_blank};
use crate::server::router::WorkbenchState;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::info;

const DEFAULT_CHAT_TITLE: &str = "New chat";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChat {
    #[serde(default)]
    pub title: Option<String>,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Validate for NewChat {
    fn validate(&self) -> Result<(), WorkbenchError> {
        self.provider.parse::<ProviderKind>()?;
        require_non_blank("model", &self.model)
    }
}

impl Validate for ChatPatch {
    fn validate(&self) -> Result<(), WorkbenchError> {
        if let Some(title) = &self.title {
            require_non_blank("title", title)?;
        }
        if let Some(provider) = &self.provider {
            provider.parse::<ProviderKind>()?;
        }
        if let Some(model) = &self.model {
            require_non_blank("model", model)?;
        }
        Ok(())
    }
}

pub fn router() -> Router<WorkbenchState> {
    Router::new()
        .route("/api/chats", get(list_chats).post(create_chat))
        .route(
            "/api/chats/{id}",
            get(get_chat).patch(update_chat).delete(delete_chat),
        )
}

async fn list_chats(State(state): State<WorkbenchState>) -> Result<Json<Vec<DbChat>>, WorkbenchError> {
    Ok(Json(state.db.list_chats().await?))
}

async fn create_chat(
    State(state): State<WorkbenchState>,
    ValidJson(body): ValidJson<NewChat>,
) -> Result<(StatusCode, Json<DbChat>), WorkbenchError> {
    // Store the canonical provider name, whatever casing the client used.
    let provider: ProviderKind = body.provider.parse()?;
    let title = body
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string());

    let id = state
        .db
        .create(RecordCreate::Chat(ChatCreate {
            title,
            provider: provider.name().to_string(),
            model: body.model.trim().to_string(),
            system_prompt: body.system_prompt,
        }))
        .await?;
    info!(chat_id = id, provider = %provider, "chat created");

    Ok((StatusCode::CREATED, Json(state.db.get_chat(id).await?)))
}

async fn get_chat(
    State(state): State<WorkbenchState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<ChatDetail>, WorkbenchError> {
    Ok(Json(state.db.get_chat_detail(id).await?))
}

async fn update_chat(
    State(state): State<WorkbenchState>,
    ValidPath(id): ValidPath<i64>,
    ValidJson(mut patch): ValidJson<ChatPatch>,
) -> Result<Json<DbChat>, WorkbenchError> {
    if let Some(provider) = patch.provider.take() {
        patch.provider = Some(provider.parse::<ProviderKind>()?.name().to_string());
    }
    state.db.patch(RecordPatch::Chat { id, patch }).await?;
    Ok(Json(state.db.get_chat(id).await?))
}

async fn delete_chat(
    State(state): State<WorkbenchState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, WorkbenchError> {
    state.db.delete(RecordRef::Chat(id)).await?;
    info!(chat_id = id, "chat deleted");
    Ok(StatusCode::NO_CONTENT)
}
