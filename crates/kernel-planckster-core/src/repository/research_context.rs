use anyhow::Result;

use crate::envelope::{Attribute, Envelope, ErrorKind};
use crate::models::{Conversation, EntityKind, ResearchContext, User};
use crate::store::Relation;

use super::{step, Repository};

impl Repository<'_> {
    /// Gets a research context by id.
    pub async fn get_research_context(&self, id: Option<i64>) -> Result<Envelope<ResearchContext>> {
        self.get(id).await
    }

    /// Gets the user owning a research context.
    ///
    /// A context with no user set is `MissingDependentData` on the context;
    /// a user id pointing at no row is `NotFound` on the user.
    pub async fn get_research_context_user(&self, id: Option<i64>) -> Result<Envelope<User>> {
        let relation = Relation::ResearchContextUser;
        let row = step!(self.find(EntityKind::ResearchContext, id).await?);

        if let Some(user) = self.session.get_related(&row, relation).await?.first() {
            return Ok(Envelope::Ok(user.decode()?));
        }

        let user_id = relation.parent_key().and_then(|key| row.foreign_key(key));
        let err = match user_id {
            Some(user_id) => self.fail(EntityKind::User, ErrorKind::not_found(Attribute::Id, user_id)),
            None => self.fail(
                EntityKind::ResearchContext,
                ErrorKind::missing_dependent_data(Attribute::Id, row.id, "user"),
            ),
        };
        Ok(Envelope::Err(err))
    }

    /// Lists the conversations of a research context, in id order.
    pub async fn list_conversations(
        &self,
        research_context_id: Option<i64>,
    ) -> Result<Envelope<Vec<Conversation>>> {
        self.list_children(Relation::ResearchContextConversations, research_context_id)
            .await
    }
}
