use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, types::Json};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbChat {
    pub id: i64,
    pub title: String,
    pub provider: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbMessage {
    pub id: i64,
    pub chat_id: i64,
    /// One of `system`, `user`, `assistant` (enforced by a CHECK constraint).
    pub role: String,
    pub content: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbAttachment {
    pub id: i64,
    pub message_id: i64,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbProviderConfig {
    pub id: i64,
    pub provider: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbDataset {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub records: Json<Vec<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dataset listing row; `records` is replaced by its length.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DatasetSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub row_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbSetting {
    pub key: String,
    pub value: Json<Value>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbModelOverride {
    pub id: i64,
    pub provider: String,
    pub model: String,
    pub display_name: Option<String>,
    pub enabled: bool,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbFeedback {
    pub id: i64,
    pub chat_id: Option<i64>,
    pub message_id: Option<i64>,
    /// `-1` or `1`.
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbMcpServer {
    pub id: i64,
    pub name: String,
    pub command: String,
    pub args: Json<Vec<String>>,
    pub env: Json<BTreeMap<String, String>>,
    pub source: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageWithAttachments {
    #[serde(flatten)]
    pub message: DbMessage,
    pub attachments: Vec<DbAttachment>,
}

/// A chat with its messages (ordered by id), each carrying its attachments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatDetail {
    #[serde(flatten)]
    pub chat: DbChat,
    pub messages: Vec<MessageWithAttachments>,
}

/// Row counts reported by the metrics endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct DbStats {
    pub chats: i64,
    pub messages: i64,
    pub attachments: i64,
    pub datasets: i64,
    pub provider_configs: i64,
    pub model_overrides: i64,
    pub feedback: i64,
    pub mcp_servers: i64,
}
