//! Entity trait for typed repository access.

use crate::entity::{EntityId, Record};
use crate::error::CoreResult;
use crate::metamodel::{EntityMetadata, EntityType};

/// Trait for types that can be persisted through a [`crate::Repository`].
///
/// Implementors provide:
/// - `ENTITY_TYPE`: the type descriptor the session's metamodel knows
/// - `metadata()`: the attributes and relationships used to register the type
/// - `id()` / `assign_id()`: access to the instance's identity
/// - `to_record()` / `from_record()`: conversion to and from a field map
///
/// # Example
///
/// ```rust
/// use entidao_core::{CoreResult, Entity, EntityId, EntityMetadata, EntityType, Record};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Tag {
///     id: Option<EntityId>,
///     label: String,
/// }
///
/// impl Entity for Tag {
///     const ENTITY_TYPE: EntityType = EntityType::new("tag");
///
///     fn metadata() -> EntityMetadata {
///         EntityMetadata::new(Self::ENTITY_TYPE).basic("label")
///     }
///
///     fn id(&self) -> Option<EntityId> {
///         self.id
///     }
///
///     fn assign_id(&mut self, id: EntityId) {
///         self.id = Some(id);
///     }
///
///     fn to_record(&self) -> Record {
///         Record::new().with("label", self.label.as_str())
///     }
///
///     fn from_record(id: EntityId, record: &Record) -> CoreResult<Self> {
///         Ok(Tag { id: Some(id), label: record.text("label")?.to_string() })
///     }
/// }
/// ```
pub trait Entity: Sized {
    /// Type descriptor of this entity.
    const ENTITY_TYPE: EntityType;

    /// Attribute and relationship metadata for metamodel registration.
    fn metadata() -> EntityMetadata;

    /// Returns the instance's identity, or `None` while transient.
    fn id(&self) -> Option<EntityId>;

    /// Stores a freshly assigned identity on a transient instance.
    fn assign_id(&mut self, id: EntityId);

    /// Flattens the instance into a record, without the identity.
    fn to_record(&self) -> Record;

    /// Rebuilds an instance from a stored record.
    ///
    /// Records produced by queries with fetches also carry the fetched
    /// associations under their attribute names; implementors may read or
    /// ignore them.
    fn from_record(id: EntityId, record: &Record) -> CoreResult<Self>;
}
