//! Persistence lookup abstraction.
//!
//! The repository layer needs only two capabilities from a backend: fetch a
//! row by id, and fetch the rows related to a row. [`PersistenceLookup`]
//! captures exactly that, so SQLite, in-memory, or any other store can sit
//! behind the same operations.
//!
//! Rows are loosely typed ([`Row`]): a kind, an id, and a JSON field map
//! that includes foreign-key columns. Entities are decoded from rows with
//! [`Row::decode`].

pub mod memory;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::models::{Entity, EntityKind};

/// A persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub kind: EntityKind,
    pub id: i64,
    /// Column values, including `id` and foreign keys.
    pub fields: Map<String, Value>,
}

impl Row {
    /// Builds a row from any serializable value plus extra columns.
    ///
    /// `id` is taken from the serialized value's `id` field.
    pub fn from_entity<E: Entity>(entity: &E, links: &[(&str, Option<i64>)]) -> Result<Self> {
        let mut fields = match serde_json::to_value(entity)? {
            Value::Object(map) => map,
            other => bail!("{} did not serialize to an object: {}", E::KIND.name(), other),
        };
        let id = fields
            .get("id")
            .and_then(Value::as_i64)
            .with_context(|| format!("{} has no integer id", E::KIND.name()))?;
        for (column, value) in links {
            fields.insert(column.to_string(), value.map_or(Value::Null, Value::from));
        }
        Ok(Self {
            kind: E::KIND,
            id,
            fields,
        })
    }

    /// Integer value of a foreign-key column, if set.
    pub fn foreign_key(&self, column: &str) -> Option<i64> {
        self.fields.get(column).and_then(Value::as_i64)
    }

    /// Decodes the row into its entity type.
    pub fn decode<E: Entity>(&self) -> Result<E> {
        if self.kind != E::KIND {
            bail!(
                "cannot decode {} row {} as {}",
                self.kind.name(),
                self.id,
                E::KIND.name()
            );
        }
        serde_json::from_value(Value::Object(self.fields.clone()))
            .with_context(|| format!("malformed {} row {}", self.kind.name(), self.id))
    }
}

/// How two kinds are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Target rows hold `foreign_key = row.id`.
    Child { foreign_key: &'static str },
    /// The row holds the target id in `foreign_key`.
    Parent { foreign_key: &'static str },
}

/// Named relations between entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    ResearchContextUser,
    ResearchContextConversations,
    ConversationMessages,
    MessageCitations,
    CitationSourceData,
    KnowledgeSourceData,
}

impl Relation {
    pub const fn source(self) -> EntityKind {
        match self {
            Self::ResearchContextUser | Self::ResearchContextConversations => {
                EntityKind::ResearchContext
            }
            Self::ConversationMessages => EntityKind::Conversation,
            Self::MessageCitations => EntityKind::Message,
            Self::CitationSourceData => EntityKind::Citation,
            Self::KnowledgeSourceData => EntityKind::KnowledgeSource,
        }
    }

    pub const fn target(self) -> EntityKind {
        match self {
            Self::ResearchContextUser => EntityKind::User,
            Self::ResearchContextConversations => EntityKind::Conversation,
            Self::ConversationMessages => EntityKind::Message,
            Self::MessageCitations => EntityKind::Citation,
            Self::CitationSourceData | Self::KnowledgeSourceData => EntityKind::SourceData,
        }
    }

    pub const fn link(self) -> Link {
        match self {
            Self::ResearchContextUser => Link::Parent {
                foreign_key: "user_id",
            },
            Self::ResearchContextConversations => Link::Child {
                foreign_key: "research_context_id",
            },
            Self::ConversationMessages => Link::Child {
                foreign_key: "conversation_id",
            },
            Self::MessageCitations => Link::Child {
                foreign_key: "message_id",
            },
            Self::CitationSourceData => Link::Parent {
                foreign_key: "source_data_id",
            },
            Self::KnowledgeSourceData => Link::Child {
                foreign_key: "knowledge_source_id",
            },
        }
    }

    /// Column on the source row holding the target id, for parent links.
    pub const fn parent_key(self) -> Option<&'static str> {
        match self.link() {
            Link::Parent { foreign_key } => Some(foreign_key),
            Link::Child { .. } => None,
        }
    }

    /// Fails if `row` is not of this relation's source kind.
    pub fn check_source(self, row: &Row) -> Result<()> {
        if row.kind != self.source() {
            bail!(
                "relation {:?} starts at {}, got a {} row",
                self,
                self.source().name(),
                row.kind.name()
            );
        }
        Ok(())
    }
}

/// Read access to a relational store, scoped to one operation.
///
/// Soft-deleted rows are returned like any other; deletion is data.
/// Related rows come back ordered by id.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_by_id`](PersistenceLookup::get_by_id) | One row by primary key |
/// | [`get_related`](PersistenceLookup::get_related) | Rows reached through a [`Relation`] |
#[async_trait]
pub trait PersistenceLookup: Send + Sync {
    /// Fetch a row by kind and id. `Ok(None)` when absent.
    async fn get_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Row>>;

    /// Fetch rows related to `row`. A parent link with an unset or dangling
    /// id yields an empty list.
    async fn get_related(&self, row: &Row, relation: Relation) -> Result<Vec<Row>>;
}
