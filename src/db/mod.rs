//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and derived read models
//! - `patch.rs`: create / patch / delete payloads and upserts
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `actor.rs`: the actor owning the pool, and its cloneable handle

pub mod actor;
pub mod models;
pub mod patch;
pub mod schema;

mod patch_impl;

pub use models::{
    ChatDetail, DatasetSummary, DbAttachment, DbChat, DbDataset, DbFeedback, DbMcpServer,
    DbMessage, DbModelOverride, DbProviderConfig, DbStats, MessageWithAttachments,
};
pub use patch::{
    AttachmentCreate, ChatCreate, ChatPatch, DatasetCreate, DatasetPatch, DbPatchable,
    FeedbackCreate, McpServerCreate, McpServerPatch, MessageCreate, ModelOverrideUpsert,
    ProviderConfigUpsert, RecordCreate, RecordPatch, RecordRef,
};
pub use schema::SQLITE_INIT;

pub use actor::{DbActorArgs, DbActorHandle, spawn};
