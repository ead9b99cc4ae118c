use crate::config::DatabaseConfig;
use crate::db::models::{
    ChatDetail, DatasetSummary, DbAttachment, DbChat, DbDataset, DbFeedback, DbMcpServer,
    DbMessage, DbModelOverride, DbProviderConfig, DbSetting, DbStats, MessageWithAttachments,
};
use crate::db::patch::{
    DbPatchable, ModelOverrideUpsert, ProviderConfigUpsert, RecordCreate, RecordPatch, RecordRef,
};
use crate::db::schema::SQLITE_INIT;
use crate::error::WorkbenchError;
use crate::providers::ProviderKind;
use ahash::AHashMap;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::types::Json;
use std::collections::BTreeMap;
use std::{fmt::Display, str::FromStr, time::Duration};
use tracing::{debug, info};

type Reply<T> = RpcReplyPort<Result<T, WorkbenchError>>;

#[derive(Debug)]
pub enum DbActorMessage {
    /// Insert a record and return its id.
    Create(RecordCreate, Reply<i64>),

    /// Partial update by id.
    Patch(RecordPatch, Reply<()>),

    /// Delete one row.
    Delete(RecordRef, Reply<()>),

    GetChat(i64, Reply<DbChat>),
    ListChats(Reply<Vec<DbChat>>),
    GetChatDetail(i64, Reply<ChatDetail>),

    GetMessage(i64, Reply<DbMessage>),
    ListMessages(i64, Reply<Vec<DbMessage>>),
    ListAttachments(i64, Reply<Vec<DbAttachment>>),
    GetAttachment(i64, Reply<DbAttachment>),

    UpsertProviderConfig(ProviderConfigUpsert, Reply<DbProviderConfig>),
    GetProviderConfig(ProviderKind, Reply<Option<DbProviderConfig>>),
    ListProviderConfigs(Reply<Vec<DbProviderConfig>>),

    GetDataset(i64, Reply<DbDataset>),
    ListDatasets(Reply<Vec<DatasetSummary>>),

    GetSettings(Reply<BTreeMap<String, Value>>),
    /// Upsert each key; a JSON `null` removes the key. Replies with the merged map.
    PutSettings(BTreeMap<String, Value>, Reply<BTreeMap<String, Value>>),

    UpsertModelOverride(ModelOverrideUpsert, Reply<DbModelOverride>),
    GetModelOverride(ProviderKind, String, Reply<Option<DbModelOverride>>),
    ListModelOverrides(Reply<Vec<DbModelOverride>>),

    GetFeedback(i64, Reply<DbFeedback>),
    ListFeedback(Reply<Vec<DbFeedback>>),

    GetMcpServer(i64, Reply<DbMcpServer>),
    ListMcpServers(Reply<Vec<DbMcpServer>>),

    Stats(Reply<DbStats>),
    Ping(Reply<()>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

fn rpc_failed(op: &str, e: impl Display) -> WorkbenchError {
    WorkbenchError::RactorError(format!("DbActor {op} RPC failed: {e}"))
}

impl DbActorHandle {
    pub async fn create(&self, create: RecordCreate) -> Result<i64, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::Create, create)
            .map_err(|e| rpc_failed("Create", e))?
    }

    pub async fn patch(&self, patch: RecordPatch) -> Result<(), WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::Patch, patch)
            .map_err(|e| rpc_failed("Patch", e))?
    }

    pub async fn delete(&self, target: RecordRef) -> Result<(), WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::Delete, target)
            .map_err(|e| rpc_failed("Delete", e))?
    }

    pub async fn get_chat(&self, id: i64) -> Result<DbChat, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::GetChat, id)
            .map_err(|e| rpc_failed("GetChat", e))?
    }

    pub async fn list_chats(&self) -> Result<Vec<DbChat>, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::ListChats)
            .map_err(|e| rpc_failed("ListChats", e))?
    }

    pub async fn get_chat_detail(&self, id: i64) -> Result<ChatDetail, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::GetChatDetail, id)
            .map_err(|e| rpc_failed("GetChatDetail", e))?
    }

    pub async fn get_message(&self, id: i64) -> Result<DbMessage, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::GetMessage, id)
            .map_err(|e| rpc_failed("GetMessage", e))?
    }

    pub async fn list_messages(&self, chat_id: i64) -> Result<Vec<DbMessage>, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::ListMessages, chat_id)
            .map_err(|e| rpc_failed("ListMessages", e))?
    }

    pub async fn list_attachments(
        &self,
        message_id: i64,
    ) -> Result<Vec<DbAttachment>, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::ListAttachments, message_id)
            .map_err(|e| rpc_failed("ListAttachments", e))?
    }

    pub async fn get_attachment(&self, id: i64) -> Result<DbAttachment, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::GetAttachment, id)
            .map_err(|e| rpc_failed("GetAttachment", e))?
    }

    pub async fn upsert_provider_config(
        &self,
        upsert: ProviderConfigUpsert,
    ) -> Result<DbProviderConfig, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::UpsertProviderConfig, upsert)
            .map_err(|e| rpc_failed("UpsertProviderConfig", e))?
    }

    pub async fn get_provider_config(
        &self,
        provider: ProviderKind,
    ) -> Result<Option<DbProviderConfig>, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::GetProviderConfig, provider)
            .map_err(|e| rpc_failed("GetProviderConfig", e))?
    }

    pub async fn list_provider_configs(&self) -> Result<Vec<DbProviderConfig>, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::ListProviderConfigs)
            .map_err(|e| rpc_failed("ListProviderConfigs", e))?
    }

    pub async fn get_dataset(&self, id: i64) -> Result<DbDataset, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::GetDataset, id)
            .map_err(|e| rpc_failed("GetDataset", e))?
    }

    pub async fn list_datasets(&self) -> Result<Vec<DatasetSummary>, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::ListDatasets)
            .map_err(|e| rpc_failed("ListDatasets", e))?
    }

    pub async fn get_settings(&self) -> Result<BTreeMap<String, Value>, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::GetSettings)
            .map_err(|e| rpc_failed("GetSettings", e))?
    }

    pub async fn put_settings(
        &self,
        settings: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::PutSettings, settings)
            .map_err(|e| rpc_failed("PutSettings", e))?
    }

    pub async fn upsert_model_override(
        &self,
        upsert: ModelOverrideUpsert,
    ) -> Result<DbModelOverride, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::UpsertModelOverride, upsert)
            .map_err(|e| rpc_failed("UpsertModelOverride", e))?
    }

    pub async fn get_model_override(
        &self,
        provider: ProviderKind,
        model: impl Into<String>,
    ) -> Result<Option<DbModelOverride>, WorkbenchError> {
        let model = model.into();
        ractor::call!(self.actor, DbActorMessage::GetModelOverride, provider, model)
            .map_err(|e| rpc_failed("GetModelOverride", e))?
    }

    pub async fn list_model_overrides(&self) -> Result<Vec<DbModelOverride>, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::ListModelOverrides)
            .map_err(|e| rpc_failed("ListModelOverrides", e))?
    }

    pub async fn get_feedback(&self, id: i64) -> Result<DbFeedback, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::GetFeedback, id)
            .map_err(|e| rpc_failed("GetFeedback", e))?
    }

    pub async fn list_feedback(&self) -> Result<Vec<DbFeedback>, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::ListFeedback)
            .map_err(|e| rpc_failed("ListFeedback", e))?
    }

    pub async fn get_mcp_server(&self, id: i64) -> Result<DbMcpServer, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::GetMcpServer, id)
            .map_err(|e| rpc_failed("GetMcpServer", e))?
    }

    pub async fn list_mcp_servers(&self) -> Result<Vec<DbMcpServer>, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::ListMcpServers)
            .map_err(|e| rpc_failed("ListMcpServers", e))?
    }

    pub async fn stats(&self) -> Result<DbStats, WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::Stats).map_err(|e| rpc_failed("Stats", e))?
    }

    pub async fn ping(&self) -> Result<(), WorkbenchError> {
        ractor::call!(self.actor, DbActorMessage::Ping).map_err(|e| rpc_failed("Ping", e))?
    }
}

/// Startup arguments for [`DbActor`].
#[derive(Debug, Clone)]
pub struct DbActorArgs {
    pub database_url: String,
    pub pool: DatabaseConfig,
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = DbActorArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(args.database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(args.pool.busy_timeout_secs))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(args.pool.max_connections)
            .idle_timeout(Duration::from_secs(args.pool.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(args.pool.max_lifetime_secs))
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!(
            max_connections = args.pool.max_connections,
            "DbActor initialized"
        );
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let pool = &state.pool;
        match message {
            DbActorMessage::Create(create, reply) => {
                let _ = reply.send(create_record(pool, create).await);
            }
            DbActorMessage::Patch(patch, reply) => {
                let _ = reply.send(patch.apply_patch(pool).await);
            }
            DbActorMessage::Delete(target, reply) => {
                let _ = reply.send(delete_record(pool, target).await);
            }
            DbActorMessage::GetChat(id, reply) => {
                let _ = reply.send(get_chat(pool, id).await);
            }
            DbActorMessage::ListChats(reply) => {
                let _ = reply.send(list_chats(pool).await);
            }
            DbActorMessage::GetChatDetail(id, reply) => {
                let _ = reply.send(get_chat_detail(pool, id).await);
            }
            DbActorMessage::GetMessage(id, reply) => {
                let _ = reply.send(get_message(pool, id).await);
            }
            DbActorMessage::ListMessages(chat_id, reply) => {
                let _ = reply.send(list_messages(pool, chat_id).await);
            }
            DbActorMessage::ListAttachments(message_id, reply) => {
                let _ = reply.send(list_attachments(pool, message_id).await);
            }
            DbActorMessage::GetAttachment(id, reply) => {
                let _ = reply.send(get_attachment(pool, id).await);
            }
            DbActorMessage::UpsertProviderConfig(upsert, reply) => {
                let _ = reply.send(upsert_provider_config(pool, upsert).await);
            }
            DbActorMessage::GetProviderConfig(provider, reply) => {
                let _ = reply.send(get_provider_config(pool, provider).await);
            }
            DbActorMessage::ListProviderConfigs(reply) => {
                let _ = reply.send(list_provider_configs(pool).await);
            }
            DbActorMessage::GetDataset(id, reply) => {
                let _ = reply.send(get_dataset(pool, id).await);
            }
            DbActorMessage::ListDatasets(reply) => {
                let _ = reply.send(list_datasets(pool).await);
            }
            DbActorMessage::GetSettings(reply) => {
                let _ = reply.send(get_settings(pool).await);
            }
            DbActorMessage::PutSettings(settings, reply) => {
                let _ = reply.send(put_settings(pool, settings).await);
            }
            DbActorMessage::UpsertModelOverride(upsert, reply) => {
                let _ = reply.send(upsert_model_override(pool, upsert).await);
            }
            DbActorMessage::GetModelOverride(provider, model, reply) => {
                let _ = reply.send(get_model_override(pool, provider, &model).await);
            }
            DbActorMessage::ListModelOverrides(reply) => {
                let _ = reply.send(list_model_overrides(pool).await);
            }
            DbActorMessage::GetFeedback(id, reply) => {
                let _ = reply.send(get_feedback(pool, id).await);
            }
            DbActorMessage::ListFeedback(reply) => {
                let _ = reply.send(list_feedback(pool).await);
            }
            DbActorMessage::GetMcpServer(id, reply) => {
                let _ = reply.send(get_mcp_server(pool, id).await);
            }
            DbActorMessage::ListMcpServers(reply) => {
                let _ = reply.send(list_mcp_servers(pool).await);
            }
            DbActorMessage::Stats(reply) => {
                let _ = reply.send(stats(pool).await);
            }
            DbActorMessage::Ping(reply) => {
                let res = sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map(|_| ())
                    .map_err(WorkbenchError::from);
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

async fn create_record(pool: &SqlitePool, create: RecordCreate) -> Result<i64, WorkbenchError> {
    let now = Utc::now();
    let id: i64 = match create {
        RecordCreate::Chat(c) => {
            sqlx::query_scalar(
                r#"
            INSERT INTO chats (title, provider, model, system_prompt, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
            )
            .bind(c.title)
            .bind(c.provider)
            .bind(c.model)
            .bind(c.system_prompt)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await?
        }

        RecordCreate::Message(c) => {
            let mut tx = pool.begin().await?;
            let id: i64 = sqlx::query_scalar(
                r#"
            INSERT INTO messages (chat_id, role, content, provider, model, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
            )
            .bind(c.chat_id)
            .bind(c.role.as_str())
            .bind(c.content)
            .bind(c.provider)
            .bind(c.model)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("UPDATE chats SET updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(c.chat_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            id
        }

        RecordCreate::Attachment(c) => {
            sqlx::query_scalar(
                r#"
            INSERT INTO attachments (message_id, file_name, mime_type, size_bytes, url, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
            )
            .bind(c.message_id)
            .bind(c.file_name)
            .bind(c.mime_type)
            .bind(c.size_bytes)
            .bind(c.url)
            .bind(now)
            .fetch_one(pool)
            .await?
        }

        RecordCreate::Dataset(c) => {
            sqlx::query_scalar(
                r#"
            INSERT INTO datasets (name, description, records, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
            )
            .bind(c.name)
            .bind(c.description)
            .bind(Json(c.records))
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await?
        }

        RecordCreate::Feedback(c) => {
            sqlx::query_scalar(
                r#"
            INSERT INTO feedback (chat_id, message_id, rating, comment, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
            )
            .bind(c.chat_id)
            .bind(c.message_id)
            .bind(c.rating)
            .bind(c.comment)
            .bind(now)
            .fetch_one(pool)
            .await?
        }

        RecordCreate::McpServer(c) => {
            sqlx::query_scalar(
                r#"
            INSERT INTO mcp_servers (name, command, args, env, source, enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
            )
            .bind(c.name)
            .bind(c.command)
            .bind(Json(c.args))
            .bind(Json(c.env))
            .bind(c.source)
            .bind(c.enabled)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await?
        }
    };

    Ok(id)
}

async fn delete_record(pool: &SqlitePool, target: RecordRef) -> Result<(), WorkbenchError> {
    let (table, key) = target.table();
    let sql = format!("DELETE FROM {table} WHERE {key} = ?");
    let query = sqlx::query(&sql);
    let query = match target {
        RecordRef::Chat(id)
        | RecordRef::Message(id)
        | RecordRef::Attachment(id)
        | RecordRef::Dataset(id)
        | RecordRef::ModelOverride(id)
        | RecordRef::McpServer(id) => query.bind(id),
        RecordRef::ProviderConfig(provider) => query.bind(provider.name()),
    };

    let affected = query.execute(pool).await?.rows_affected();
    debug!(table, ?target, affected, "db delete applied");

    if affected == 0 {
        return Err(WorkbenchError::NotFound(format!("{table} {target:?}")));
    }
    Ok(())
}

async fn get_chat(pool: &SqlitePool, id: i64) -> Result<DbChat, WorkbenchError> {
    sqlx::query_as::<_, DbChat>(
        r#"
    SELECT id, title, provider, model, system_prompt, created_at, updated_at
    FROM chats
    WHERE id = ?
    "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| WorkbenchError::NotFound(format!("chat id={id}")))
}

async fn list_chats(pool: &SqlitePool) -> Result<Vec<DbChat>, WorkbenchError> {
    let rows = sqlx::query_as::<_, DbChat>(
        r#"
    SELECT id, title, provider, model, system_prompt, created_at, updated_at
    FROM chats
    ORDER BY updated_at DESC, id DESC
    "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn get_chat_detail(pool: &SqlitePool, id: i64) -> Result<ChatDetail, WorkbenchError> {
    let chat = get_chat(pool, id).await?;
    let messages = list_messages(pool, id).await?;

    let attachments = sqlx::query_as::<_, DbAttachment>(
        r#"
    SELECT a.id, a.message_id, a.file_name, a.mime_type, a.size_bytes, a.url, a.created_at
    FROM attachments a
    JOIN messages m ON m.id = a.message_id
    WHERE m.chat_id = ?
    ORDER BY a.id
    "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let mut by_message: AHashMap<i64, Vec<DbAttachment>> = AHashMap::new();
    for attachment in attachments {
        by_message
            .entry(attachment.message_id)
            .or_default()
            .push(attachment);
    }

    let messages = messages
        .into_iter()
        .map(|message| MessageWithAttachments {
            attachments: by_message.remove(&message.id).unwrap_or_default(),
            message,
        })
        .collect();

    Ok(ChatDetail { chat, messages })
}

async fn get_message(pool: &SqlitePool, id: i64) -> Result<DbMessage, WorkbenchError> {
    sqlx::query_as::<_, DbMessage>(
        r#"
    SELECT id, chat_id, role, content, provider, model, created_at
    FROM messages
    WHERE id = ?
    "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| WorkbenchError::NotFound(format!("message id={id}")))
}

async fn list_messages(pool: &SqlitePool, chat_id: i64) -> Result<Vec<DbMessage>, WorkbenchError> {
    let rows = sqlx::query_as::<_, DbMessage>(
        r#"
    SELECT id, chat_id, role, content, provider, model, created_at
    FROM messages
    WHERE chat_id = ?
    ORDER BY id
    "#,
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn list_attachments(
    pool: &SqlitePool,
    message_id: i64,
) -> Result<Vec<DbAttachment>, WorkbenchError> {
    let rows = sqlx::query_as::<_, DbAttachment>(
        r#"
    SELECT id, message_id, file_name, mime_type, size_bytes, url, created_at
    FROM attachments
    WHERE message_id = ?
    ORDER BY id
    "#,
    )
    .bind(message_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn get_attachment(pool: &SqlitePool, id: i64) -> Result<DbAttachment, WorkbenchError> {
    sqlx::query_as::<_, DbAttachment>(
        r#"
    SELECT id, message_id, file_name, mime_type, size_bytes, url, created_at
    FROM attachments
    WHERE id = ?
    "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| WorkbenchError::NotFound(format!("attachment id={id}")))
}

async fn upsert_provider_config(
    pool: &SqlitePool,
    upsert: ProviderConfigUpsert,
) -> Result<DbProviderConfig, WorkbenchError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, DbProviderConfig>(
        r#"
    INSERT INTO provider_configs (provider, api_key, base_url, enabled, created_at, updated_at)
    VALUES (?1, NULLIF(?2, ''), NULLIF(?3, ''), COALESCE(?4, 1), ?5, ?5)
    ON CONFLICT(provider) DO UPDATE SET
        api_key = CASE WHEN ?2 IS NULL THEN provider_configs.api_key ELSE NULLIF(?2, '') END,
        base_url = CASE WHEN ?3 IS NULL THEN provider_configs.base_url ELSE NULLIF(?3, '') END,
        enabled = COALESCE(?4, provider_configs.enabled),
        updated_at = ?5
    RETURNING id, provider, api_key, base_url, enabled, created_at, updated_at
    "#,
    )
    .bind(upsert.provider.name())
    .bind(upsert.api_key)
    .bind(upsert.base_url)
    .bind(upsert.enabled)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

async fn get_provider_config(
    pool: &SqlitePool,
    provider: ProviderKind,
) -> Result<Option<DbProviderConfig>, WorkbenchError> {
    let row = sqlx::query_as::<_, DbProviderConfig>(
        r#"
    SELECT id, provider, api_key, base_url, enabled, created_at, updated_at
    FROM provider_configs
    WHERE provider = ?
    "#,
    )
    .bind(provider.name())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

async fn list_provider_configs(pool: &SqlitePool) -> Result<Vec<DbProviderConfig>, WorkbenchError> {
    let rows = sqlx::query_as::<_, DbProviderConfig>(
        r#"
    SELECT id, provider, api_key, base_url, enabled, created_at, updated_at
    FROM provider_configs
    ORDER BY provider
    "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn get_dataset(pool: &SqlitePool, id: i64) -> Result<DbDataset, WorkbenchError> {
    sqlx::query_as::<_, DbDataset>(
        r#"
    SELECT id, name, description, records, created_at, updated_at
    FROM datasets
    WHERE id = ?
    "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| WorkbenchError::NotFound(format!("dataset id={id}")))
}

async fn list_datasets(pool: &SqlitePool) -> Result<Vec<DatasetSummary>, WorkbenchError> {
    let rows = sqlx::query_as::<_, DatasetSummary>(
        r#"
    SELECT id, name, description, json_array_length(records) AS row_count, created_at, updated_at
    FROM datasets
    ORDER BY id
    "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn get_settings(pool: &SqlitePool) -> Result<BTreeMap<String, Value>, WorkbenchError> {
    let rows = sqlx::query_as::<_, DbSetting>(
        r#"
    SELECT key, value, updated_at
    FROM settings
    "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.key, row.value.0))
        .collect())
}

async fn put_settings(
    pool: &SqlitePool,
    settings: BTreeMap<String, Value>,
) -> Result<BTreeMap<String, Value>, WorkbenchError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    for (key, value) in settings {
        if value.is_null() {
            sqlx::query("DELETE FROM settings WHERE key = ?")
                .bind(key)
                .execute(&mut *tx)
                .await?;
            continue;
        }
        sqlx::query(
            r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(Json(value))
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    get_settings(pool).await
}

async fn upsert_model_override(
    pool: &SqlitePool,
    upsert: ModelOverrideUpsert,
) -> Result<DbModelOverride, WorkbenchError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, DbModelOverride>(
        r#"
    INSERT INTO model_overrides (
        provider, model, display_name, enabled, max_tokens, temperature, created_at, updated_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(provider, model) DO UPDATE SET
        display_name = excluded.display_name,
        enabled = excluded.enabled,
        max_tokens = excluded.max_tokens,
        temperature = excluded.temperature,
        updated_at = excluded.updated_at
    RETURNING id, provider, model, display_name, enabled, max_tokens, temperature, created_at, updated_at
    "#,
    )
    .bind(upsert.provider.name())
    .bind(upsert.model)
    .bind(upsert.display_name)
    .bind(upsert.enabled)
    .bind(upsert.max_tokens.map(i64::from))
    .bind(upsert.temperature.map(f64::from))
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

async fn get_model_override(
    pool: &SqlitePool,
    provider: ProviderKind,
    model: &str,
) -> Result<Option<DbModelOverride>, WorkbenchError> {
    let row = sqlx::query_as::<_, DbModelOverride>(
        r#"
    SELECT id, provider, model, display_name, enabled, max_tokens, temperature, created_at, updated_at
    FROM model_overrides
    WHERE provider = ? AND model = ?
    "#,
    )
    .bind(provider.name())
    .bind(model)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

async fn list_model_overrides(pool: &SqlitePool) -> Result<Vec<DbModelOverride>, WorkbenchError> {
    let rows = sqlx::query_as::<_, DbModelOverride>(
        r#"
    SELECT id, provider, model, display_name, enabled, max_tokens, temperature, created_at, updated_at
    FROM model_overrides
    ORDER BY provider, model
    "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn get_feedback(pool: &SqlitePool, id: i64) -> Result<DbFeedback, WorkbenchError> {
    sqlx::query_as::<_, DbFeedback>(
        r#"
    SELECT id, chat_id, message_id, rating, comment, created_at
    FROM feedback
    WHERE id = ?
    "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| WorkbenchError::NotFound(format!("feedback id={id}")))
}

async fn list_feedback(pool: &SqlitePool) -> Result<Vec<DbFeedback>, WorkbenchError> {
    let rows = sqlx::query_as::<_, DbFeedback>(
        r#"
    SELECT id, chat_id, message_id, rating, comment, created_at
    FROM feedback
    ORDER BY id DESC
    "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn get_mcp_server(pool: &SqlitePool, id: i64) -> Result<DbMcpServer, WorkbenchError> {
    sqlx::query_as::<_, DbMcpServer>(
        r#"
    SELECT id, name, command, args, env, source, enabled, created_at, updated_at
    FROM mcp_servers
    WHERE id = ?
    "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| WorkbenchError::NotFound(format!("mcp server id={id}")))
}

async fn list_mcp_servers(pool: &SqlitePool) -> Result<Vec<DbMcpServer>, WorkbenchError> {
    let rows = sqlx::query_as::<_, DbMcpServer>(
        r#"
    SELECT id, name, command, args, env, source, enabled, created_at, updated_at
    FROM mcp_servers
    ORDER BY name
    "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn stats(pool: &SqlitePool) -> Result<DbStats, WorkbenchError> {
    let row = sqlx::query_as::<_, DbStats>(
        r#"
    SELECT
        (SELECT COUNT(*) FROM chats) AS chats,
        (SELECT COUNT(*) FROM messages) AS messages,
        (SELECT COUNT(*) FROM attachments) AS attachments,
        (SELECT COUNT(*) FROM datasets) AS datasets,
        (SELECT COUNT(*) FROM provider_configs) AS provider_configs,
        (SELECT COUNT(*) FROM model_overrides) AS model_overrides,
        (SELECT COUNT(*) FROM feedback) AS feedback,
        (SELECT COUNT(*) FROM mcp_servers) AS mcp_servers
    "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(args: DbActorArgs) -> Result<DbActorHandle, WorkbenchError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, args)
        .await
        .map_err(|e| WorkbenchError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), WorkbenchError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
