//! Entity type descriptors and the metamodel registry.
//!
//! The metamodel is what the storage engine knows about each entity type:
//! its identity field, its basic attributes and its relationships. The query
//! assembler consults it to reject unknown types, unknown attributes and
//! joins that do not traverse a relationship.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Default name of the identity field.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Opaque descriptor naming a persistent entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityType(&'static str);

impl EntityType {
    /// Creates a new entity type descriptor.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// How an attribute is stored and whether it can be traversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    /// A plain field stored in the record.
    Basic,
    /// Reference to at most one target instance; `join_column` is the field
    /// on this entity holding the target's identity.
    ToOne {
        /// Related entity type.
        target: EntityType,
        /// Field on this entity that stores the target identity.
        join_column: String,
    },
    /// Collection of target instances; `mapped_by` is the field on the
    /// target holding this entity's identity.
    ToMany {
        /// Related entity type.
        target: EntityType,
        /// Field on the target that stores this entity's identity.
        mapped_by: String,
    },
}

/// Metadata for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMetadata {
    name: String,
    kind: AttributeKind,
}

impl AttributeMetadata {
    /// Returns the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attribute kind.
    #[must_use]
    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// Returns the related entity type for relationships.
    #[must_use]
    pub fn target(&self) -> Option<EntityType> {
        match &self.kind {
            AttributeKind::Basic => None,
            AttributeKind::ToOne { target, .. } | AttributeKind::ToMany { target, .. } => {
                Some(*target)
            }
        }
    }

    /// Returns true if the attribute traverses a relationship.
    #[must_use]
    pub fn is_association(&self) -> bool {
        !matches!(self.kind, AttributeKind::Basic)
    }
}

/// Metadata describing one entity type.
///
/// # Example
///
/// ```rust
/// use entidao_core::{EntityMetadata, EntityType};
///
/// const PERSON: EntityType = EntityType::new("person");
/// const ADDRESS: EntityType = EntityType::new("address");
///
/// let meta = EntityMetadata::new(PERSON)
///     .basic("name")
///     .basic("age")
///     .to_one("address", ADDRESS, "address_id");
///
/// assert!(meta.has_field("address_id"));
/// assert!(meta.attribute("address").unwrap().is_association());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    entity_type: EntityType,
    id_field: String,
    attributes: Vec<AttributeMetadata>,
}

impl EntityMetadata {
    /// Creates metadata with the default identity field and no attributes.
    #[must_use]
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            id_field: DEFAULT_ID_FIELD.to_string(),
            attributes: Vec::new(),
        }
    }

    /// Sets the name of the identity field.
    #[must_use]
    pub fn id_field(mut self, name: impl Into<String>) -> Self {
        self.id_field = name.into();
        self
    }

    /// Declares a basic attribute.
    #[must_use]
    pub fn basic(self, name: impl Into<String>) -> Self {
        self.declare(name, AttributeKind::Basic)
    }

    /// Declares a to-one relationship stored in `join_column`.
    ///
    /// The join column is declared as a basic attribute when missing.
    #[must_use]
    pub fn to_one(
        self,
        name: impl Into<String>,
        target: EntityType,
        join_column: impl Into<String>,
    ) -> Self {
        let join_column = join_column.into();
        let this = if self.attribute_named(&join_column).is_none() {
            self.basic(join_column.clone())
        } else {
            self
        };
        this.declare(
            name,
            AttributeKind::ToOne {
                target,
                join_column,
            },
        )
    }

    /// Declares a to-many relationship mapped by a field on the target.
    #[must_use]
    pub fn to_many(
        self,
        name: impl Into<String>,
        target: EntityType,
        mapped_by: impl Into<String>,
    ) -> Self {
        self.declare(
            name,
            AttributeKind::ToMany {
                target,
                mapped_by: mapped_by.into(),
            },
        )
    }

    fn declare(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        let name = name.into();
        self.attributes.retain(|a| a.name != name);
        self.attributes.push(AttributeMetadata { name, kind });
        self
    }

    fn attribute_named(&self, name: &str) -> Option<&AttributeMetadata> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns the entity type.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Returns the identity field name.
    #[must_use]
    pub fn id_field_name(&self) -> &str {
        &self.id_field
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeMetadata> {
        self.attribute_named(name)
    }

    /// Iterates all declared attributes.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeMetadata> {
        self.attributes.iter()
    }

    /// Returns true if `name` can be used in a predicate or ordering:
    /// the identity field or a basic attribute.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        name == self.id_field
            || self
                .attribute_named(name)
                .is_some_and(|a| !a.is_association())
    }
}

/// Registry of the entity types a session can serve.
#[derive(Debug, Clone, Default)]
pub struct Metamodel {
    entities: HashMap<EntityType, Arc<EntityMetadata>>,
}

impl Metamodel {
    /// Starts building a metamodel.
    #[must_use]
    pub fn builder() -> MetamodelBuilder {
        MetamodelBuilder::default()
    }

    /// Looks up metadata for an entity type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` if the type is not registered.
    pub fn entity(&self, entity_type: EntityType) -> CoreResult<&Arc<EntityMetadata>> {
        self.entities
            .get(&entity_type)
            .ok_or_else(|| CoreError::unknown_entity_type(entity_type))
    }

    /// Returns true if the type is registered.
    #[must_use]
    pub fn contains(&self, entity_type: EntityType) -> bool {
        self.entities.contains_key(&entity_type)
    }

    /// Returns the registered entity types, sorted by name.
    #[must_use]
    pub fn entity_types(&self) -> Vec<EntityType> {
        let mut types: Vec<_> = self.entities.keys().copied().collect();
        types.sort();
        types
    }

    /// Returns the number of registered entity types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Builder for [`Metamodel`].
#[derive(Debug, Default)]
pub struct MetamodelBuilder {
    entities: Vec<EntityMetadata>,
}

impl MetamodelBuilder {
    /// Registers an entity type from its [`Entity`] implementation.
    #[must_use]
    pub fn register<T: Entity>(self) -> Self {
        self.entity(T::metadata())
    }

    /// Registers entity metadata directly.
    #[must_use]
    pub fn entity(mut self, metadata: EntityMetadata) -> Self {
        self.entities
            .retain(|m| m.entity_type != metadata.entity_type);
        self.entities.push(metadata);
        self
    }

    /// Builds the metamodel.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` if a relationship targets an entity type
    /// that was not registered.
    pub fn build(self) -> CoreResult<Metamodel> {
        let entities: HashMap<_, _> = self
            .entities
            .into_iter()
            .map(|m| (m.entity_type, Arc::new(m)))
            .collect();

        for metadata in entities.values() {
            for target in metadata.attributes().filter_map(AttributeMetadata::target) {
                if !entities.contains_key(&target) {
                    return Err(CoreError::unknown_entity_type(target));
                }
            }
        }

        Ok(Metamodel { entities })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON: EntityType = EntityType::new("person");
    const ADDRESS: EntityType = EntityType::new("address");

    fn person() -> EntityMetadata {
        EntityMetadata::new(PERSON)
            .basic("name")
            .to_one("address", ADDRESS, "address_id")
    }

    #[test]
    fn to_one_declares_join_column() {
        let meta = person();
        assert_eq!(meta.attribute("address_id").unwrap().kind(), &AttributeKind::Basic);
        assert_eq!(meta.attribute("address").unwrap().target(), Some(ADDRESS));
    }

    #[test]
    fn has_field_excludes_associations() {
        let meta = person();
        assert!(meta.has_field("id"));
        assert!(meta.has_field("name"));
        assert!(!meta.has_field("address"));
        assert!(!meta.has_field("missing"));
    }

    #[test]
    fn redeclaring_replaces_attribute() {
        let meta = EntityMetadata::new(PERSON).basic("x").basic("x");
        assert_eq!(meta.attributes().count(), 1);
    }

    #[test]
    fn build_rejects_dangling_relationship() {
        let result = Metamodel::builder().entity(person()).build();
        assert!(matches!(
            result,
            Err(CoreError::UnknownEntityType { name }) if name == "address"
        ));
    }

    #[test]
    fn lookup() {
        let metamodel = Metamodel::builder()
            .entity(person())
            .entity(EntityMetadata::new(ADDRESS).basic("city"))
            .build()
            .unwrap();

        assert_eq!(metamodel.len(), 2);
        assert_eq!(metamodel.entity_types(), vec![ADDRESS, PERSON]);
        assert!(metamodel.entity(PERSON).is_ok());
        assert!(metamodel.entity(EntityType::new("ghost")).is_err());
    }
}
