//! Domain entities for research contexts, conversations and their sources.
//!
//! Entities are read from a [`PersistenceLookup`](crate::store::PersistenceLookup)
//! as [`Row`](crate::store::Row)s and decoded with serde. Foreign keys live
//! on rows only; they are not part of the entities.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::lfn::Lfn;

/// Every kind of entity the lookup layer can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    KnowledgeSource,
    SourceData,
    ResearchContext,
    Conversation,
    Message,
    Citation,
}

impl EntityKind {
    /// Name used in error envelopes (`"ResearchContext not found"`).
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::KnowledgeSource => "KnowledgeSource",
            Self::SourceData => "SourceData",
            Self::ResearchContext => "ResearchContext",
            Self::Conversation => "Conversation",
            Self::Message => "Message",
            Self::Citation => "Citation",
        }
    }
}

/// Binds an entity type to its [`EntityKind`].
pub trait Entity: Serialize + DeserializeOwned {
    const KIND: EntityKind;
}

/// Kind of knowledge source a research context draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A Telegram channel.
    Telegram,
    /// A Twitter account.
    Twitter,
    /// A collection of user uploads augmented by the system.
    Augmented,
    /// User uploads with notification on new arrivals.
    Sentinel,
    /// Plain user uploads.
    User,
}

/// Storage backend holding an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Object store bucket.
    S3,
    /// Network-attached storage.
    Nas,
    /// Local disk.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDataStatus {
    Created,
    Unavailable,
    Available,
    InconsistentDataset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    User,
    Agent,
}

/// Creation, update and soft-delete bookkeeping shared by all entities.
///
/// A soft-deleted entity is still a present entity: lookups return it and
/// envelopes carry it like any other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Audit {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            updated_at: at,
            deleted: false,
            deleted_at: None,
        }
    }

    pub fn deleted_at(at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            updated_at: at,
            deleted: true,
            deleted_at: Some(at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub sid: String,
    #[serde(flatten)]
    pub audit: Audit,
}

/// A collection of sources defined by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSource {
    pub id: i64,
    pub source: SourceKind,
    /// Query made to the source or list of uploads, as JSON text.
    pub content_metadata: String,
    #[serde(flatten)]
    pub audit: Audit,
}

/// A stored file, addressed by its [`Lfn`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceData {
    pub id: i64,
    pub name: String,
    /// File type such as `pdf` or `txt`.
    #[serde(rename = "type")]
    pub source_type: String,
    pub lfn: Lfn,
    pub status: SourceDataStatus,
    #[serde(flatten)]
    pub audit: Audit,
}

/// The context in which conversations happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchContext {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    #[serde(flatten)]
    pub audit: Audit,
}

/// A user query or an agent response within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub sender_type: SenderType,
    #[serde(flatten)]
    pub audit: Audit,
}

/// Points an agent response at part of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: i64,
    pub citation_metadata: String,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
}
impl Entity for KnowledgeSource {
    const KIND: EntityKind = EntityKind::KnowledgeSource;
}
impl Entity for SourceData {
    const KIND: EntityKind = EntityKind::SourceData;
}
impl Entity for ResearchContext {
    const KIND: EntityKind = EntityKind::ResearchContext;
}
impl Entity for Conversation {
    const KIND: EntityKind = EntityKind::Conversation;
}
impl Entity for Message {
    const KIND: EntityKind = EntityKind::Message;
}
impl Entity for Citation {
    const KIND: EntityKind = EntityKind::Citation;
}
