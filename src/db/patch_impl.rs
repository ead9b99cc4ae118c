//! RecordPatch -> DbPatchable implementation.
//!
//! This sits in the `db` module because it contains SQL/table knowledge.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqlitePool, types::Json};
use tracing::debug;

use crate::db::patch::{ChatPatch, DatasetPatch, DbPatchable, McpServerPatch, RecordPatch};
use crate::error::WorkbenchError;

#[async_trait]
impl DbPatchable for RecordPatch {
    async fn apply_patch(&self, pool: &SqlitePool) -> Result<(), WorkbenchError> {
        let updated_at = Utc::now();
        let (table, affected) = match self {
            RecordPatch::Chat { id, patch } => {
                let ChatPatch {
                    title,
                    provider,
                    model,
                    system_prompt,
                } = patch.clone();

                let res = sqlx::query(
                    r#"
                    UPDATE chats
                    SET
                        title = COALESCE(?, title),
                        provider = COALESCE(?, provider),
                        model = COALESCE(?, model),
                        system_prompt = COALESCE(?, system_prompt),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(title)
                .bind(provider)
                .bind(model)
                .bind(system_prompt)
                .bind(updated_at)
                .bind(id)
                .execute(pool)
                .await?;

                ("chats", res.rows_affected())
            }

            RecordPatch::Dataset { id, patch } => {
                let DatasetPatch {
                    name,
                    description,
                    records,
                } = patch.clone();

                let records_set = records.is_some();
                let res = sqlx::query(
                    r#"
                    UPDATE datasets
                    SET
                        name = COALESCE(?, name),
                        description = COALESCE(?, description),
                        records = COALESCE(?, records),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(name)
                .bind(description)
                .bind(records.map(Json))
                .bind(updated_at)
                .bind(id)
                .execute(pool)
                .await?;

                debug!(id, records_set, "dataset patch");
                ("datasets", res.rows_affected())
            }

            RecordPatch::McpServer { id, patch } => {
                let McpServerPatch {
                    command,
                    args,
                    env,
                    enabled,
                } = patch.clone();

                let res = sqlx::query(
                    r#"
                    UPDATE mcp_servers
                    SET
                        command = COALESCE(?, command),
                        args = COALESCE(?, args),
                        env = COALESCE(?, env),
                        enabled = COALESCE(?, enabled),
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(command)
                .bind(args.map(Json))
                .bind(env.map(Json))
                .bind(enabled)
                .bind(updated_at)
                .bind(id)
                .execute(pool)
                .await?;

                ("mcp_servers", res.rows_affected())
            }
        };

        let id = self.id();
        debug!(
            table,
            id,
            affected,
            updated_at = %updated_at,
            "db patch applied"
        );

        if affected == 0 {
            return Err(WorkbenchError::NotFound(format!("{table} id={id}")));
        }

        Ok(())
    }
}
