//! SQL DDL for initializing the database schema.
//! Every statement is idempotent; there is no migration history.

/// SQLite schema includes:
/// - `chats` / `messages` / `attachments` (cascade on delete, top-down)
/// - `provider_configs` (one row per provider name)
/// - `datasets` (records stored as a JSON array)
/// - `settings` (key/value, JSON values)
/// - `model_overrides` (one row per (provider, model))
/// - `feedback` (links are set to NULL when the chat or message goes away)
/// - `mcp_servers` (installed MCP tool servers)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Conversations
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chats (
    id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    provider TEXT NOT NULL,
    model TEXT NOT NULL,
    system_prompt TEXT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL  -- RFC3339
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY NOT NULL,
    chat_id INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
    role TEXT NOT NULL CHECK (role IN ('system', 'user', 'assistant')),
    content TEXT NOT NULL,
    provider TEXT NULL,
    model TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_chat_id ON messages(chat_id);

CREATE TABLE IF NOT EXISTS attachments (
    id INTEGER PRIMARY KEY NOT NULL,
    message_id INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
    file_name TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    size_bytes INTEGER NOT NULL DEFAULT 0,
    url TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_attachments_message_id ON attachments(message_id);

-- ---------------------------------------------------------------------------
-- Provider credentials and model tuning
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS provider_configs (
    id INTEGER PRIMARY KEY NOT NULL,
    provider TEXT NOT NULL UNIQUE,
    api_key TEXT NULL,
    base_url TEXT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS model_overrides (
    id INTEGER PRIMARY KEY NOT NULL,
    provider TEXT NOT NULL,
    model TEXT NOT NULL,
    display_name TEXT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    max_tokens INTEGER NULL,
    temperature REAL NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(provider, model)
);

-- ---------------------------------------------------------------------------
-- Datasets and settings
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS datasets (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    description TEXT NULL,
    records TEXT NOT NULL DEFAULT '[]', -- JSON array
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL, -- JSON
    updated_at TEXT NOT NULL
);

-- ---------------------------------------------------------------------------
-- Feedback and MCP servers
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY NOT NULL,
    chat_id INTEGER NULL REFERENCES chats(id) ON DELETE SET NULL,
    message_id INTEGER NULL REFERENCES messages(id) ON DELETE SET NULL,
    rating INTEGER NOT NULL CHECK (rating IN (-1, 1)),
    comment TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mcp_servers (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    command TEXT NOT NULL,
    args TEXT NOT NULL DEFAULT '[]', -- JSON array of strings
    env TEXT NOT NULL DEFAULT '{}',  -- JSON object of strings
    source TEXT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
