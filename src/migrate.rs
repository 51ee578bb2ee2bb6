//! Schema migrations.
//!
//! Every statement is `IF NOT EXISTS`, so running `kp init` repeatedly is
//! safe. Foreign keys are plain indexed integer columns without `REFERENCES`
//! constraints: a citation may outlive the source data it points at, and
//! the repository reports that as `NotFound` instead of the database
//! refusing the delete.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

const AUDIT_COLUMNS: &str = "
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            deleted_at TEXT";

/// `(table, entity columns)`; audit columns are appended to each.
const TABLES: &[(&str, &str)] = &[
    ("users", "sid TEXT NOT NULL UNIQUE"),
    (
        "knowledge_sources",
        "source TEXT NOT NULL,
            content_metadata TEXT NOT NULL DEFAULT '{}'",
    ),
    (
        "source_data",
        "name TEXT NOT NULL,
            \"type\" TEXT NOT NULL,
            lfn TEXT NOT NULL,
            status TEXT NOT NULL,
            knowledge_source_id INTEGER",
    ),
    (
        "research_contexts",
        "title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            user_id INTEGER",
    ),
    (
        "conversations",
        "title TEXT NOT NULL,
            research_context_id INTEGER",
    ),
    (
        "messages",
        "content TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            sender TEXT NOT NULL,
            sender_type TEXT NOT NULL,
            conversation_id INTEGER",
    ),
    (
        "citations",
        "citation_metadata TEXT NOT NULL DEFAULT '{}',
            message_id INTEGER,
            source_data_id INTEGER",
    ),
];

/// `(index, table, column)` for every foreign-key column.
const INDEXES: &[(&str, &str, &str)] = &[
    ("idx_source_data_ks", "source_data", "knowledge_source_id"),
    ("idx_research_contexts_user", "research_contexts", "user_id"),
    ("idx_conversations_rc", "conversations", "research_context_id"),
    ("idx_messages_conversation", "messages", "conversation_id"),
    ("idx_citations_message", "citations", "message_id"),
    ("idx_citations_source_data", "citations", "source_data_id"),
];

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db).await?;
    migrate_pool(&pool).await?;
    pool.close().await;

    tracing::info!(path = %config.db.path.display(), "database initialized");
    Ok(())
}

/// Applies the schema to an open pool.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    for (table, columns) in TABLES {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY,
            {columns},{AUDIT_COLUMNS}
        )"
        );
        sqlx::query(&sql)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create table {table}"))?;
    }

    for (index, table, column) in INDEXES {
        let sql = format!("CREATE INDEX IF NOT EXISTS {index} ON {table}({column})");
        sqlx::query(&sql)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create index {index}"))?;
    }

    tracing::debug!(tables = TABLES.len(), indexes = INDEXES.len(), "schema applied");
    Ok(())
}
