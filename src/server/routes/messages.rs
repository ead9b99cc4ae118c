use crate::db::{
    AttachmentCreate, DbAttachment, DbMessage, MessageCreate, RecordCreate, RecordRef,
};
use crate::error::WorkbenchError;
use crate::server::extract::{
    ValidPath, Validate, ValidJson, require_non_blank, require_temperature,
};
use crate::server::router::WorkbenchState;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use workbench_schema::{ChatMessage, ChatRequest, ChatRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl Validate for NewMessage {
    fn validate(&self) -> Result<(), WorkbenchError> {
        require_non_blank("content", &self.content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    #[serde(default)]
    pub url: Option<String>,
}

impl Validate for NewAttachment {
    fn validate(&self) -> Result<(), WorkbenchError> {
        require_non_blank("file_name", &self.file_name)?;
        require_non_blank("mime_type", &self.mime_type)?;
        if self.size_bytes < 0 {
            return Err(WorkbenchError::Validation(
                "size_bytes must not be negative".to_string(),
            ));
        }
        if let Some(url) = &self.url {
            url::Url::parse(url)
                .map_err(|e| WorkbenchError::Validation(format!("url: {e}")))?;
        }
        Ok(())
    }
}

/// Optional sampling knobs for `POST /api/chats/{id}/reply`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyOptions {
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Validate for ReplyOptions {
    fn validate(&self) -> Result<(), WorkbenchError> {
        require_temperature(self.temperature)?;
        if self.max_tokens == Some(0) {
            return Err(WorkbenchError::Validation(
                "max_tokens must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn router() -> Router<WorkbenchState> {
    Router::new()
        .route(
            "/api/chats/{id}/messages",
            get(list_messages).post(append_message),
        )
        .route("/api/chats/{id}/reply", post(reply))
        .route("/api/messages/{id}", delete(delete_message))
        .route(
            "/api/messages/{id}/attachments",
            get(list_attachments).post(add_attachment),
        )
        .route("/api/attachments/{id}", delete(delete_attachment))
}

async fn list_messages(
    State(state): State<WorkbenchState>,
    ValidPath(chat_id): ValidPath<i64>,
) -> Result<Json<Vec<DbMessage>>, WorkbenchError> {
    // 404 for an unknown chat instead of an empty list.
    state.db.get_chat(chat_id).await?;
    Ok(Json(state.db.list_messages(chat_id).await?))
}

async fn append_message(
    State(state): State<WorkbenchState>,
    ValidPath(chat_id): ValidPath<i64>,
    ValidJson(body): ValidJson<NewMessage>,
) -> Result<(StatusCode, Json<DbMessage>), WorkbenchError> {
    let id = state
        .db
        .create(RecordCreate::Message(MessageCreate {
            chat_id,
            role: body.role,
            content: body.content,
            provider: body.provider,
            model: body.model,
        }))
        .await?;
    Ok((StatusCode::CREATED, Json(state.db.get_message(id).await?)))
}

/// Sends the stored history to the chat's provider and stores the answer.
async fn reply(
    State(state): State<WorkbenchState>,
    ValidPath(chat_id): ValidPath<i64>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<DbMessage>), WorkbenchError> {
    let body = body?;
    // The body is optional; an empty one means provider defaults.
    let options: ReplyOptions = if body.iter().all(u8::is_ascii_whitespace) {
        ReplyOptions::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| WorkbenchError::InvalidJson(e.to_string()))?
    };
    options.validate()?;
    let detail = state.db.get_chat_detail(chat_id).await?;

    let mut messages = Vec::with_capacity(detail.messages.len() + 1);
    if let Some(system) = detail
        .chat
        .system_prompt
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        messages.push(ChatMessage::new(ChatRole::System, system));
    }
    for stored in &detail.messages {
        match ChatRole::parse(&stored.message.role) {
            Some(role) => messages.push(ChatMessage::new(role, stored.message.content.clone())),
            None => warn!(
                message_id = stored.message.id,
                role = %stored.message.role,
                "skipping message with unknown role"
            ),
        }
    }
    if !messages.iter().any(|m| m.role != ChatRole::System) {
        return Err(WorkbenchError::Validation(
            "chat has no messages to reply to".to_string(),
        ));
    }

    let out = state
        .providers
        .chat(ChatRequest {
            provider: detail.chat.provider.clone(),
            model: detail.chat.model.clone(),
            messages,
            prompt: None,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        })
        .await?;

    let id = state
        .db
        .create(RecordCreate::Message(MessageCreate {
            chat_id,
            role: ChatRole::Assistant,
            content: out.text,
            provider: Some(out.provider),
            model: Some(out.model),
        }))
        .await?;
    info!(chat_id, message_id = id, "assistant reply stored");

    Ok((StatusCode::CREATED, Json(state.db.get_message(id).await?)))
}

async fn delete_message(
    State(state): State<WorkbenchState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, WorkbenchError> {
    state.db.delete(RecordRef::Message(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_attachments(
    State(state): State<WorkbenchState>,
    ValidPath(message_id): ValidPath<i64>,
) -> Result<Json<Vec<DbAttachment>>, WorkbenchError> {
    state.db.get_message(message_id).await?;
    Ok(Json(state.db.list_attachments(message_id).await?))
}

async fn add_attachment(
    State(state): State<WorkbenchState>,
    ValidPath(message_id): ValidPath<i64>,
    ValidJson(body): ValidJson<NewAttachment>,
) -> Result<(StatusCode, Json<DbAttachment>), WorkbenchError> {
    let id = state
        .db
        .create(RecordCreate::Attachment(AttachmentCreate {
            message_id,
            file_name: body.file_name,
            mime_type: body.mime_type,
            size_bytes: body.size_bytes,
            url: body.url,
        }))
        .await?;
    Ok((StatusCode::CREATED, Json(state.db.get_attachment(id).await?)))
}

async fn delete_attachment(
    State(state): State<WorkbenchState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, WorkbenchError> {
    state.db.delete(RecordRef::Attachment(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
