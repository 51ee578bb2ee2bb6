//! Repository operations.
//!
//! Every operation follows the same steps:
//!
//! 1. **Validate**: an absent key yields `MissingAttribute` without touching
//!    the store.
//! 2. **Primary lookup**: an absent row yields `NotFound`.
//! 3. **Dependent lookups**: any absence aborts the whole operation with a
//!    single error; lists are never returned with gaps.
//! 4. **Assembly**: rows are decoded into entities and wrapped in
//!    [`Envelope::Ok`].
//!
//! Error envelopes are logged through the [`OperationLog`] at the point they
//! are built. Backend failures (I/O, malformed rows) are not envelopes; they
//! surface as the outer `anyhow::Result`.
//!
//! A [`Repository`] borrows one session and one log and is meant to live for
//! a single request.

mod message;
mod research_context;
mod source_data;

use anyhow::Result;

use crate::envelope::{Attribute, Envelope, ErrorEnvelope, ErrorKind};
use crate::log::OperationLog;
use crate::models::{Entity, EntityKind};
use crate::store::{PersistenceLookup, Relation, Row};

/// Outcome of a lookup step: the row, or the error envelope to return.
type Step<T> = std::result::Result<T, ErrorEnvelope>;

/// Unwraps a [`Step`], returning its error envelope from the enclosing
/// operation.
macro_rules! step {
    ($step:expr) => {
        match $step {
            Ok(value) => value,
            Err(err) => return Ok($crate::envelope::Envelope::Err(err)),
        }
    };
}
pub(crate) use step;

pub struct Repository<'a> {
    session: &'a dyn PersistenceLookup,
    log: &'a dyn OperationLog,
}

impl<'a> Repository<'a> {
    pub fn new(session: &'a dyn PersistenceLookup, log: &'a dyn OperationLog) -> Self {
        Self { session, log }
    }

    /// Builds and logs an error envelope.
    fn fail(&self, entity: EntityKind, kind: ErrorKind) -> ErrorEnvelope {
        let err = ErrorEnvelope::build(entity, kind);
        self.log.error(&err);
        err
    }

    /// Validate-then-lookup by id.
    async fn find(&self, kind: EntityKind, id: Option<i64>) -> Result<Step<Row>> {
        let Some(id) = id else {
            return Ok(Err(
                self.fail(kind, ErrorKind::missing_attribute(Attribute::Id))
            ));
        };
        match self.session.get_by_id(kind, id).await? {
            Some(row) => Ok(Ok(row)),
            None => Ok(Err(self.fail(kind, ErrorKind::not_found(Attribute::Id, id)))),
        }
    }

    /// Fetches an entity by id.
    async fn get<E: Entity>(&self, id: Option<i64>) -> Result<Envelope<E>> {
        let row = step!(self.find(E::KIND, id).await?);
        Ok(Envelope::Ok(row.decode()?))
    }

    /// Lists the children of the entity with `id` through `relation`.
    async fn list_children<E: Entity>(
        &self,
        relation: Relation,
        id: Option<i64>,
    ) -> Result<Envelope<Vec<E>>> {
        let row = step!(self.find(relation.source(), id).await?);
        let children = self.session.get_related(&row, relation).await?;
        Ok(Envelope::Ok(decode_all(&children)?))
    }
}

fn decode_all<E: Entity>(rows: &[Row]) -> Result<Vec<E>> {
    rows.iter().map(Row::decode).collect()
}
