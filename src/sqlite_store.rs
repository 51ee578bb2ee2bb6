//! SQLite-backed [`PersistenceLookup`].
//!
//! Rows are read column by column into the JSON field map of a core
//! [`Row`]. Each entity kind has a fixed column list describing how its
//! values are stored:
//!
//! | Column type | SQLite storage | Row value |
//! |-------------|----------------|-----------|
//! | `Integer` | `INTEGER` | number or null |
//! | `Text` | `TEXT` (timestamps as RFC 3339) | string or null |
//! | `Bool` | `INTEGER` 0/1 | bool |
//! | `Json` | `TEXT` holding JSON | parsed value |

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row as _, SqlitePool};

use kernel_planckster_core::models::EntityKind;
use kernel_planckster_core::store::{Link, PersistenceLookup, Relation, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Integer,
    Text,
    Bool,
    Json,
}

use ColumnType::{Bool, Integer, Json, Text};

const AUDIT: Columns = &[
    ("created_at", Text),
    ("updated_at", Text),
    ("deleted", Bool),
    ("deleted_at", Text),
];

type Columns = &'static [(&'static str, ColumnType)];

const USERS: Columns = &[("id", Integer), ("sid", Text)];

const KNOWLEDGE_SOURCES: Columns = &[("id", Integer), ("source", Text), ("content_metadata", Text)];

const SOURCE_DATA: Columns = &[
    ("id", Integer),
    ("name", Text),
    ("type", Text),
    ("lfn", Json),
    ("status", Text),
    ("knowledge_source_id", Integer),
];

const RESEARCH_CONTEXTS: Columns = &[
    ("id", Integer),
    ("title", Text),
    ("description", Text),
    ("user_id", Integer),
];

const CONVERSATIONS: Columns = &[
    ("id", Integer),
    ("title", Text),
    ("research_context_id", Integer),
];

const MESSAGES: Columns = &[
    ("id", Integer),
    ("content", Text),
    ("timestamp", Text),
    ("sender", Text),
    ("sender_type", Text),
    ("conversation_id", Integer),
];

const CITATIONS: Columns = &[
    ("id", Integer),
    ("citation_metadata", Text),
    ("message_id", Integer),
    ("source_data_id", Integer),
];

struct Table {
    name: &'static str,
    columns: Columns,
}

impl Table {
    fn of(kind: EntityKind) -> Self {
        let (name, columns) = match kind {
            EntityKind::User => ("users", USERS),
            EntityKind::KnowledgeSource => ("knowledge_sources", KNOWLEDGE_SOURCES),
            EntityKind::SourceData => ("source_data", SOURCE_DATA),
            EntityKind::ResearchContext => ("research_contexts", RESEARCH_CONTEXTS),
            EntityKind::Conversation => ("conversations", CONVERSATIONS),
            EntityKind::Message => ("messages", MESSAGES),
            EntityKind::Citation => ("citations", CITATIONS),
        };
        Self { name, columns }
    }

    fn all_columns(&self) -> impl Iterator<Item = (&'static str, ColumnType)> + '_ {
        self.columns.iter().chain(AUDIT.iter()).copied()
    }

    fn column_list(&self) -> String {
        self.all_columns()
            .map(|(name, _)| format!("\"{name}\""))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn has_column(&self, column: &str) -> bool {
        self.all_columns().any(|(name, _)| name == column)
    }
}

/// SQLite implementation of [`PersistenceLookup`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces a row. Fields without a column are ignored;
    /// columns without a field are stored as NULL.
    pub async fn insert(&self, row: &Row) -> Result<()> {
        let table = Table::of(row.kind);
        let placeholders = vec!["?"; table.all_columns().count()].join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            table.name,
            table.column_list(),
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for (column, ty) in table.all_columns() {
            let value = row.fields.get(column).unwrap_or(&Value::Null);
            query = match ty {
                Integer => query.bind(value.as_i64()),
                Text => query.bind(value.as_str().map(str::to_string)),
                Bool => query.bind(i64::from(value.as_bool().unwrap_or(false))),
                Json if value.is_null() => query.bind(None::<String>),
                Json => query.bind(Some(serde_json::to_string(value)?)),
            };
        }

        query
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert {} {}", row.kind.name(), row.id))?;
        Ok(())
    }

    /// Hard-deletes a row. Returns whether it existed.
    pub async fn remove(&self, kind: EntityKind, id: i64) -> Result<bool> {
        let table = Table::of(kind);
        let sql = format!("DELETE FROM {} WHERE id = ?", table.name);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    fn decode(kind: EntityKind, table: &Table, record: &SqliteRow) -> Result<Row> {
        let mut fields = Map::new();
        for (column, ty) in table.all_columns() {
            let value = match ty {
                Integer => record
                    .try_get::<Option<i64>, _>(column)?
                    .map_or(Value::Null, Value::from),
                Text => record
                    .try_get::<Option<String>, _>(column)?
                    .map_or(Value::Null, Value::from),
                Bool => Value::Bool(record.try_get::<i64, _>(column)? != 0),
                Json => match record.try_get::<Option<String>, _>(column)? {
                    Some(text) => serde_json::from_str(&text).with_context(|| {
                        format!("{}.{} holds invalid JSON", table.name, column)
                    })?,
                    None => Value::Null,
                },
            };
            fields.insert(column.to_string(), value);
        }

        let id = fields
            .get("id")
            .and_then(Value::as_i64)
            .with_context(|| format!("{} row without id", table.name))?;
        Ok(Row { kind, id, fields })
    }
}

#[async_trait]
impl PersistenceLookup for SqliteStore {
    async fn get_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Row>> {
        let table = Table::of(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            table.column_list(),
            table.name
        );
        let record = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        record
            .map(|record| Self::decode(kind, &table, &record))
            .transpose()
    }

    async fn get_related(&self, row: &Row, relation: Relation) -> Result<Vec<Row>> {
        relation.check_source(row)?;
        let target = relation.target();

        match relation.link() {
            Link::Parent { foreign_key } => match row.foreign_key(foreign_key) {
                Some(id) => Ok(self.get_by_id(target, id).await?.into_iter().collect()),
                None => Ok(Vec::new()),
            },
            Link::Child { foreign_key } => {
                let table = Table::of(target);
                if !table.has_column(foreign_key) {
                    bail!("{} has no column {}", table.name, foreign_key);
                }
                let sql = format!(
                    "SELECT {} FROM {} WHERE \"{}\" = ? ORDER BY id",
                    table.column_list(),
                    table.name,
                    foreign_key
                );
                let records = sqlx::query(&sql)
                    .bind(row.id)
                    .fetch_all(&self.pool)
                    .await?;

                records
                    .iter()
                    .map(|record| Self::decode(target, &table, record))
                    .collect()
            }
        }
    }
}
