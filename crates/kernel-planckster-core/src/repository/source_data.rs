use anyhow::Result;

use crate::envelope::Envelope;
use crate::models::SourceData;
use crate::store::Relation;

use super::Repository;

impl Repository<'_> {
    pub async fn get_source_data(&self, id: Option<i64>) -> Result<Envelope<SourceData>> {
        self.get(id).await
    }

    /// Lists the source data collected by a knowledge source, in id order.
    pub async fn list_source_data(
        &self,
        knowledge_source_id: Option<i64>,
    ) -> Result<Envelope<Vec<SourceData>>> {
        self.list_children(Relation::KnowledgeSourceData, knowledge_source_id)
            .await
    }
}
