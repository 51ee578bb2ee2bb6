use anyhow::Result;

use crate::envelope::{Attribute, Envelope, ErrorKind};
use crate::models::{EntityKind, Message, SourceData};
use crate::store::Relation;

use super::{step, Repository};

impl Repository<'_> {
    /// Lists the messages of a conversation, in id order.
    pub async fn list_conversation_messages(
        &self,
        conversation_id: Option<i64>,
    ) -> Result<Envelope<Vec<Message>>> {
        self.list_children(Relation::ConversationMessages, conversation_id)
            .await
    }

    /// Lists the source data cited by a message, one entry per citation in
    /// citation order.
    ///
    /// Fails as a whole on the first citation that cannot be resolved: a
    /// citation without a source reference is `MissingDependentData` on the
    /// citation, a reference to a vanished row is `NotFound` on the source
    /// data.
    pub async fn list_message_sources(
        &self,
        message_id: Option<i64>,
    ) -> Result<Envelope<Vec<SourceData>>> {
        let message = step!(self.find(EntityKind::Message, message_id).await?);
        let citations = self
            .session
            .get_related(&message, Relation::MessageCitations)
            .await?;

        let relation = Relation::CitationSourceData;
        let mut sources = Vec::with_capacity(citations.len());
        for citation in &citations {
            let Some(source_data_id) = relation
                .parent_key()
                .and_then(|key| citation.foreign_key(key))
            else {
                let err = self.fail(
                    EntityKind::Citation,
                    ErrorKind::missing_dependent_data(Attribute::Id, citation.id, "source data"),
                );
                return Ok(Envelope::Err(err));
            };

            let resolved = self.session.get_related(citation, relation).await?;
            let Some(row) = resolved.first() else {
                let err = self.fail(
                    EntityKind::SourceData,
                    ErrorKind::not_found(Attribute::Id, source_data_id),
                );
                return Ok(Envelope::Err(err));
            };
            sources.push(row.decode()?);
        }

        Ok(Envelope::Ok(sources))
    }
}
