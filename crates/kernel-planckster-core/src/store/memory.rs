//! In-memory [`PersistenceLookup`] implementation for testing and embedding.
//!
//! Rows live in a `BTreeMap` keyed by `(kind, id)` behind `std::sync::RwLock`,
//! so related rows come back in id order without sorting.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::EntityKind;

use super::{Link, PersistenceLookup, Relation, Row};

/// In-memory store.
pub struct InMemoryStore {
    rows: RwLock<BTreeMap<(EntityKind, i64), Row>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert or replace a row.
    pub fn insert(&self, row: Row) -> Result<()> {
        let mut rows = self.rows.write().map_err(|_| anyhow!("store lock poisoned"))?;
        rows.insert((row.kind, row.id), row);
        Ok(())
    }

    /// Hard-delete a row. Returns whether it existed.
    pub fn remove(&self, kind: EntityKind, id: i64) -> Result<bool> {
        let mut rows = self.rows.write().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(rows.remove(&(kind, id)).is_some())
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceLookup for InMemoryStore {
    async fn get_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Row>> {
        let rows = self.rows.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(rows.get(&(kind, id)).cloned())
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
                let rows = self.rows.read().map_err(|_| anyhow!("store lock poisoned"))?;
                Ok(rows
                    .range((target, i64::MIN)..=(target, i64::MAX))
                    .map(|(_, r)| r)
                    .filter(|r| r.foreign_key(foreign_key) == Some(row.id))
                    .cloned()
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Audit, Conversation, ResearchContext, User};
    use chrono::Utc;

    fn context(id: i64, user_id: Option<i64>) -> Row {
        let rc = ResearchContext {
            id,
            title: format!("rc{id}"),
            description: String::new(),
            audit: Audit::new(Utc::now()),
        };
        Row::from_entity(&rc, &[("user_id", user_id)]).unwrap()
    }

    fn conversation(id: i64, rc: i64) -> Row {
        let conv = Conversation {
            id,
            title: format!("c{id}"),
            audit: Audit::new(Utc::now()),
        };
        Row::from_entity(&conv, &[("research_context_id", Some(rc))]).unwrap()
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = InMemoryStore::new();
        store.insert(context(1, None)).unwrap();
        assert!(store.get_by_id(EntityKind::ResearchContext, 1).await.unwrap().is_some());
        assert!(store.get_by_id(EntityKind::ResearchContext, 2).await.unwrap().is_none());
        assert!(store.get_by_id(EntityKind::Conversation, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_children_in_id_order() {
        let store = InMemoryStore::new();
        let rc = context(1, None);
        store.insert(rc.clone()).unwrap();
        store.insert(conversation(30, 1)).unwrap();
        store.insert(conversation(10, 1)).unwrap();
        store.insert(conversation(20, 2)).unwrap();

        let related = store
            .get_related(&rc, Relation::ResearchContextConversations)
            .await
            .unwrap();
        let ids: Vec<i64> = related.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 30]);
    }

    #[tokio::test]
    async fn test_parent_link() {
        let store = InMemoryStore::new();
        let user = User {
            id: 5,
            sid: "s5".to_string(),
            audit: Audit::new(Utc::now()),
        };
        store.insert(Row::from_entity(&user, &[]).unwrap()).unwrap();
        let with_user = context(1, Some(5));
        let without_user = context(2, None);
        let dangling = context(3, Some(99));

        let found = store
            .get_related(&with_user, Relation::ResearchContextUser)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].decode::<User>().unwrap(), user);
        assert!(store
            .get_related(&without_user, Relation::ResearchContextUser)
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .get_related(&dangling, Relation::ResearchContextUser)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryStore::new();
        store.insert(context(1, None)).unwrap();
        assert!(store.remove(EntityKind::ResearchContext, 1).unwrap());
        assert!(!store.remove(EntityKind::ResearchContext, 1).unwrap());
        assert!(store.is_empty());
    }
}
