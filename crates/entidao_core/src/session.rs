//! The persistence context the repository runs against.

use crate::entity::{EntityId, Record};
use crate::error::{CoreError, CoreResult};
use crate::metamodel::{EntityType, Metamodel};
use crate::query::QueryDescriptor;

/// One result row: an identity and the record stored under it.
///
/// Records of rows produced by descriptors with fetches also carry the
/// fetched associations: a map for to-one relationships, an array of maps
/// for to-many ones. Each fetched map includes the related identity under
/// the target's identity field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Identity of the root instance.
    pub id: EntityId,
    /// State of the root instance.
    pub record: Record,
}

impl Row {
    /// Creates a row.
    #[must_use]
    pub fn new(id: EntityId, record: Record) -> Self {
        Self { id, record }
    }
}

/// A storage engine session.
///
/// A session tracks which instances are *managed*: loaded, created or
/// merged through it and not removed since. Removal is only allowed for
/// managed instances. Sessions are driven through `&mut` and are not shared
/// between threads; transaction boundaries belong to whoever owns the
/// session.
pub trait Session {
    /// Returns the entity metadata this session can serve.
    fn metamodel(&self) -> &Metamodel;

    /// Loads an instance by identity and marks it managed.
    ///
    /// Returns `Ok(None)` when no instance has that identity.
    fn find(&mut self, entity_type: EntityType, id: EntityId) -> CoreResult<Option<Record>>;

    /// Creates a new instance and returns its freshly assigned identity.
    fn persist(&mut self, entity_type: EntityType, record: Record) -> CoreResult<EntityId>;

    /// Writes `record` as the state of `id` and returns the managed state.
    ///
    /// An identity absent from the extent is inserted under that identity.
    fn merge(&mut self, entity_type: EntityType, id: EntityId, record: Record)
        -> CoreResult<Record>;

    /// Removes a managed instance.
    ///
    /// # Errors
    ///
    /// Returns `NotPersistent` if the instance is not managed.
    fn remove(&mut self, entity_type: EntityType, id: EntityId) -> CoreResult<()>;

    /// Returns true if the instance is managed by this session.
    fn contains(&self, entity_type: EntityType, id: EntityId) -> bool;

    /// Executes a descriptor and returns the rows inside its window.
    fn execute(&mut self, query: &QueryDescriptor) -> CoreResult<Vec<Row>>;

    /// Counts the roots matching a descriptor.
    fn count(&mut self, query: &QueryDescriptor) -> CoreResult<u64> {
        let _ = query;
        Err(CoreError::Unimplemented { operation: "count" })
    }

    /// Removes every root matching a descriptor and returns how many.
    fn delete_where(&mut self, query: &QueryDescriptor) -> CoreResult<u64> {
        let _ = query;
        Err(CoreError::Unimplemented {
            operation: "bulk delete",
        })
    }
}

impl<S: Session + ?Sized> Session for &mut S {
    fn metamodel(&self) -> &Metamodel {
        (**self).metamodel()
    }

    fn find(&mut self, entity_type: EntityType, id: EntityId) -> CoreResult<Option<Record>> {
        (**self).find(entity_type, id)
    }

    fn persist(&mut self, entity_type: EntityType, record: Record) -> CoreResult<EntityId> {
        (**self).persist(entity_type, record)
    }

    fn merge(
        &mut self,
        entity_type: EntityType,
        id: EntityId,
        record: Record,
    ) -> CoreResult<Record> {
        (**self).merge(entity_type, id, record)
    }

    fn remove(&mut self, entity_type: EntityType, id: EntityId) -> CoreResult<()> {
        (**self).remove(entity_type, id)
    }

    fn contains(&self, entity_type: EntityType, id: EntityId) -> bool {
        (**self).contains(entity_type, id)
    }

    fn execute(&mut self, query: &QueryDescriptor) -> CoreResult<Vec<Row>> {
        (**self).execute(query)
    }

    fn count(&mut self, query: &QueryDescriptor) -> CoreResult<u64> {
        (**self).count(query)
    }

    fn delete_where(&mut self, query: &QueryDescriptor) -> CoreResult<u64> {
        (**self).delete_where(query)
    }
}
