use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use workbench_schema::ChatRole;

use crate::{error::WorkbenchError, providers::ProviderKind};

/// Applies a partial update to the database.
#[async_trait]
pub trait DbPatchable {
    async fn apply_patch(&self, pool: &SqlitePool) -> Result<(), WorkbenchError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCreate {
    pub title: String,
    pub provider: String,
    pub model: String,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreate {
    pub chat_id: i64,
    pub role: ChatRole,
    pub content: String,
    pub provider: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentCreate {
    pub message_id: i64,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub records: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackCreate {
    pub chat_id: Option<i64>,
    pub message_id: Option<i64>,
    pub rating: i64,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerCreate {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub source: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum RecordCreate {
    Chat(ChatCreate),
    Message(MessageCreate),
    Attachment(AttachmentCreate),
    Dataset(DatasetCreate),
    Feedback(FeedbackCreate),
    McpServer(McpServerCreate),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatPatch {
    /// `None` => do not change; `Some(v)` => update
    pub title: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetPatch {
    /// `None` => do not change; `Some(v)` => update
    pub name: Option<String>,
    pub description: Option<String>,
    /// Replaces the whole record array.
    pub records: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpServerPatch {
    /// `None` => do not change; `Some(v)` => update
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
    pub env: Option<BTreeMap<String, String>>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum RecordPatch {
    Chat { id: i64, patch: ChatPatch },
    Dataset { id: i64, patch: DatasetPatch },
    McpServer { id: i64, patch: McpServerPatch },
}

impl RecordPatch {
    pub fn id(&self) -> i64 {
        match self {
            RecordPatch::Chat { id, .. }
            | RecordPatch::Dataset { id, .. }
            | RecordPatch::McpServer { id, .. } => *id,
        }
    }
}

/// Target of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
#[serde(rename_all = "snake_case")]
pub enum RecordRef {
    Chat(i64),
    Message(i64),
    Attachment(i64),
    Dataset(i64),
    ModelOverride(i64),
    McpServer(i64),
    ProviderConfig(ProviderKind),
}

impl RecordRef {
    /// Table name plus key column used by the delete statement.
    pub(crate) fn table(&self) -> (&'static str, &'static str) {
        match self {
            RecordRef::Chat(_) => ("chats", "id"),
            RecordRef::Message(_) => ("messages", "id"),
            RecordRef::Attachment(_) => ("attachments", "id"),
            RecordRef::Dataset(_) => ("datasets", "id"),
            RecordRef::ModelOverride(_) => ("model_overrides", "id"),
            RecordRef::McpServer(_) => ("mcp_servers", "id"),
            RecordRef::ProviderConfig(_) => ("provider_configs", "provider"),
        }
    }
}

/// Insert-or-update of a provider's stored credentials.
///
/// `None` keeps the stored value on update; an empty string clears it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfigUpsert {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// `None` => enabled on insert, unchanged on update.
    pub enabled: Option<bool>,
}

/// Insert-or-replace of the override for one (provider, model) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOverrideUpsert {
    pub provider: ProviderKind,
    pub model: String,
    pub display_name: Option<String>,
    pub enabled: bool,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}
