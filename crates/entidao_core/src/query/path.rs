//! Query roots, joins, fetches and field handles.
//!
//! These are the building blocks predicates and orderings are made from.
//! A [`Root`] stands for the entity type being selected; a [`Join`] brings a
//! related entity into scope under an alias; a [`Fetch`] asks the engine to
//! load an association together with each result.

use crate::error::CoreResult;
use crate::metamodel::{EntityMetadata, EntityType, Metamodel};
use crate::query::order::Order;
use crate::query::predicate::{CompareOp, Predicate, TextOp};
use entidao_codec::Value;
use std::fmt;
use std::sync::Arc;

/// Where a field path starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSource {
    /// The query root.
    Root,
    /// A declared join, by alias.
    Join(String),
}

/// A reference to a field on the root or on a joined entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    /// Where the path starts.
    pub source: PathSource,
    /// Field name.
    pub field: String,
}

impl FieldPath {
    /// Creates a path to a root field.
    pub fn root(field: impl Into<String>) -> Self {
        Self {
            source: PathSource::Root,
            field: field.into(),
        }
    }

    /// Creates a path to a field of a joined entity.
    pub fn join(alias: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            source: PathSource::Join(alias.into()),
            field: field.into(),
        }
    }

    /// Returns the join alias, if the path does not start at the root.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match &self.source {
            PathSource::Root => None,
            PathSource::Join(alias) => Some(alias.as_str()),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            PathSource::Root => write!(f, "root.{}", self.field),
            PathSource::Join(alias) => write!(f, "{alias}.{}", self.field),
        }
    }
}

/// Kind of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// Drops roots without a related instance.
    Inner,
    /// Keeps roots without a related instance; joined fields read as null.
    Left,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => f.write_str("JOIN"),
            Self::Left => f.write_str("LEFT JOIN"),
        }
    }
}

/// The entity type a query selects.
#[derive(Debug, Clone)]
pub struct Root {
    metadata: Arc<EntityMetadata>,
}

impl Root {
    /// Creates a root for the given entity metadata.
    #[must_use]
    pub fn new(metadata: Arc<EntityMetadata>) -> Self {
        Self { metadata }
    }

    /// Creates a root for a type registered in `metamodel`.
    pub fn of(metamodel: &Metamodel, entity_type: EntityType) -> CoreResult<Self> {
        Ok(Self::new(Arc::clone(metamodel.entity(entity_type)?)))
    }

    /// Returns the selected entity type.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.metadata.entity_type()
    }

    /// Returns the root's metadata.
    #[must_use]
    pub fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    /// Returns a handle to a root field.
    pub fn field(&self, name: impl Into<String>) -> Field {
        Field::new(FieldPath::root(name))
    }

    /// Returns a handle to the identity field.
    #[must_use]
    pub fn id(&self) -> Field {
        self.field(self.metadata.id_field_name())
    }

    /// Inner-joins a relationship of the root under `alias`.
    pub fn join(&self, attribute: impl Into<String>, alias: impl Into<String>) -> Join {
        Join::new(PathSource::Root, attribute, alias, JoinType::Inner)
    }

    /// Left-joins a relationship of the root under `alias`.
    pub fn left_join(&self, attribute: impl Into<String>, alias: impl Into<String>) -> Join {
        Join::new(PathSource::Root, attribute, alias, JoinType::Left)
    }

    /// Asks for `attribute` to be loaded with every result.
    pub fn fetch(&self, attribute: impl Into<String>) -> Fetch {
        self.fetch_with(attribute, JoinType::Left)
    }

    /// Like [`Root::fetch`], with an explicit join type.
    pub fn fetch_with(&self, attribute: impl Into<String>, join_type: JoinType) -> Fetch {
        let attribute = attribute.into();
        let kind = match self.metadata.attribute(&attribute) {
            Some(meta) if meta.is_association() => FetchKind::Association,
            _ => FetchKind::Attribute,
        };
        Fetch {
            attribute,
            join_type,
            kind,
        }
    }
}

/// A related entity brought into scope under an alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Join {
    /// The root or join the relationship is declared on.
    pub source: PathSource,
    /// Relationship attribute being traversed.
    pub attribute: String,
    /// Alias used by field paths.
    pub alias: String,
    /// Inner or left.
    pub join_type: JoinType,
}

impl Join {
    /// Creates a join specification.
    pub fn new(
        source: PathSource,
        attribute: impl Into<String>,
        alias: impl Into<String>,
        join_type: JoinType,
    ) -> Self {
        Self {
            source,
            attribute: attribute.into(),
            alias: alias.into(),
            join_type,
        }
    }

    /// Returns a handle to a field of the joined entity.
    pub fn field(&self, name: impl Into<String>) -> Field {
        Field::new(FieldPath::join(self.alias.clone(), name))
    }

    /// Inner-joins a relationship of this join's target.
    pub fn join(&self, attribute: impl Into<String>, alias: impl Into<String>) -> Join {
        Join::new(
            PathSource::Join(self.alias.clone()),
            attribute,
            alias,
            JoinType::Inner,
        )
    }

    /// Left-joins a relationship of this join's target.
    pub fn left_join(&self, attribute: impl Into<String>, alias: impl Into<String>) -> Join {
        Join::new(
            PathSource::Join(self.alias.clone()),
            attribute,
            alias,
            JoinType::Left,
        )
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            PathSource::Root => "root",
            PathSource::Join(alias) => alias.as_str(),
        };
        write!(
            f,
            "{} {source}.{} {}",
            self.join_type, self.attribute, self.alias
        )
    }
}

/// What a fetch was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    /// A relationship; the fetch also behaves as a join.
    Association,
    /// Anything else; not traversable.
    Attribute,
}

/// An association loaded together with each result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fetch {
    /// Attribute being fetched.
    pub attribute: String,
    /// Inner or left.
    pub join_type: JoinType,
    /// Whether the attribute is a relationship.
    pub kind: FetchKind,
}

impl Fetch {
    /// Returns the join view of this fetch, aliased by the attribute name.
    ///
    /// Fetches of non-relationship attributes have no join view.
    #[must_use]
    pub fn as_join(&self) -> Option<Join> {
        match self.kind {
            FetchKind::Association => Some(Join::new(
                PathSource::Root,
                self.attribute.clone(),
                self.attribute.clone(),
                self.join_type,
            )),
            FetchKind::Attribute => None,
        }
    }
}

impl fmt::Display for Fetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} FETCH root.{}", self.join_type, self.attribute)
    }
}

/// A field handle that builds predicates and orderings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    path: FieldPath,
}

impl Field {
    /// Wraps a field path.
    #[must_use]
    pub fn new(path: FieldPath) -> Self {
        Self { path }
    }

    /// Returns the underlying path.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    fn compare(&self, op: CompareOp, value: impl Into<Value>) -> Predicate {
        Predicate::Compare {
            path: self.path.clone(),
            op,
            value: value.into(),
        }
    }

    fn text(&self, op: TextOp, pattern: impl Into<String>) -> Predicate {
        Predicate::Text {
            path: self.path.clone(),
            op,
            pattern: pattern.into(),
        }
    }

    /// `field = value`
    pub fn eq(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    /// `field <> value`
    pub fn ne(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ne, value)
    }

    /// `field < value`
    pub fn lt(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Lt, value)
    }

    /// `field <= value`
    pub fn le(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Le, value)
    }

    /// `field > value`
    pub fn gt(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Gt, value)
    }

    /// `field >= value`
    pub fn ge(&self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ge, value)
    }

    /// `low <= field <= high`
    pub fn between(&self, low: impl Into<Value>, high: impl Into<Value>) -> Predicate {
        Predicate::all([self.ge(low), self.le(high)])
    }

    /// `field IN (values)`
    pub fn is_in<V, I>(&self, values: I) -> Predicate
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Predicate::In {
            path: self.path.clone(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `field IS NULL`
    #[must_use]
    pub fn is_null(&self) -> Predicate {
        Predicate::IsNull(self.path.clone())
    }

    /// `field IS NOT NULL`
    #[must_use]
    pub fn is_not_null(&self) -> Predicate {
        Predicate::IsNotNull(self.path.clone())
    }

    /// Text field starts with `prefix`.
    pub fn starts_with(&self, prefix: impl Into<String>) -> Predicate {
        self.text(TextOp::StartsWith, prefix)
    }

    /// Text field ends with `suffix`.
    pub fn ends_with(&self, suffix: impl Into<String>) -> Predicate {
        self.text(TextOp::EndsWith, suffix)
    }

    /// Text field contains `needle`.
    pub fn contains(&self, needle: impl Into<String>) -> Predicate {
        self.text(TextOp::Contains, needle)
    }

    /// Ascending order on this field.
    #[must_use]
    pub fn asc(&self) -> Order {
        Order::asc(self.path.clone())
    }

    /// Descending order on this field.
    #[must_use]
    pub fn desc(&self) -> Order {
        Order::desc(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON: EntityType = EntityType::new("person");
    const ADDRESS: EntityType = EntityType::new("address");

    fn root() -> Root {
        Root::new(Arc::new(
            EntityMetadata::new(PERSON)
                .basic("name")
                .to_one("address", ADDRESS, "address_id"),
        ))
    }

    #[test]
    fn fetch_of_basic_attribute_has_no_join_view() {
        let root = root();
        assert_eq!(root.fetch("name").kind, FetchKind::Attribute);
        assert!(root.fetch("name").as_join().is_none());
        assert!(root.fetch("missing").as_join().is_none());
    }

    #[test]
    fn fetch_of_association_is_a_join() {
        let join = root().fetch("address").as_join().unwrap();
        assert_eq!(join.alias, "address");
        assert_eq!(join.source, PathSource::Root);
        assert_eq!(join.join_type, JoinType::Left);
    }

    #[test]
    fn join_fields_are_aliased() {
        let address = root().join("address", "a");
        let field = address.field("city");
        assert_eq!(field.path().alias(), Some("a"));
        assert_eq!(field.path().to_string(), "a.city");
    }

    #[test]
    fn nested_join_starts_at_parent_alias() {
        let nested = root().join("address", "a").left_join("country", "c");
        assert_eq!(nested.source, PathSource::Join("a".into()));
        assert_eq!(nested.to_string(), "LEFT JOIN a.country c");
    }

    #[test]
    fn id_uses_declared_identity_field() {
        let root = Root::new(Arc::new(EntityMetadata::new(PERSON).id_field("pk")));
        assert_eq!(root.id().path(), &FieldPath::root("pk"));
    }
}
