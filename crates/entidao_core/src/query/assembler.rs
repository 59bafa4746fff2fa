//! Criteria query assembly.
//!
//! The assembler turns loose query parts into a [`QueryDescriptor`] after
//! checking them against the metamodel:
//!
//! - the entity type must be registered
//! - every join and fetch must traverse a relationship
//! - join aliases must be unique and declared before use
//! - field paths must name a declared field (when path validation is on)

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::metamodel::{AttributeKind, EntityMetadata, EntityType, Metamodel};
use crate::query::descriptor::{Projection, QueryDescriptor};
use crate::query::order::Order;
use crate::query::path::{Fetch, FetchKind, FieldPath, Join, PathSource};
use crate::query::predicate::Predicate;
use crate::query::window::ResultWindow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Builds query descriptors against a metamodel.
#[derive(Debug, Clone, Copy)]
pub struct QueryAssembler<'m> {
    metamodel: &'m Metamodel,
    validate_paths: bool,
}

impl<'m> QueryAssembler<'m> {
    /// Creates an assembler that validates field paths.
    #[must_use]
    pub fn new(metamodel: &'m Metamodel) -> Self {
        Self {
            metamodel,
            validate_paths: true,
        }
    }

    /// Creates an assembler following `config`.
    #[must_use]
    pub fn with_config(metamodel: &'m Metamodel, config: &Config) -> Self {
        Self {
            metamodel,
            validate_paths: config.validate_paths,
        }
    }

    /// Returns the metamodel queries are checked against.
    #[must_use]
    pub fn metamodel(&self) -> &'m Metamodel {
        self.metamodel
    }

    /// Builds a descriptor selecting every instance of `entity_type`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` if the type is not registered.
    pub fn select_all(&self, entity_type: EntityType) -> CoreResult<QueryDescriptor> {
        self.assemble(entity_type, [], [], [], [])
    }

    /// Assembles a descriptor.
    ///
    /// Predicates are combined with AND; none means no filter. Orderings are
    /// applied most significant first; none means the engine's natural order.
    ///
    /// # Errors
    ///
    /// - `UnknownEntityType` if the type, or a join target, is not registered
    /// - `InvalidJoin` if a join or fetch does not traverse a relationship,
    ///   or reuses an alias
    /// - `UnknownJoin` if a join or field path names an undeclared alias
    /// - `UnknownAttribute` if a field path names an undeclared field
    pub fn assemble(
        &self,
        entity_type: EntityType,
        predicates: impl IntoIterator<Item = Predicate>,
        orderings: impl IntoIterator<Item = Order>,
        joins: impl IntoIterator<Item = Join>,
        fetches: impl IntoIterator<Item = Fetch>,
    ) -> CoreResult<QueryDescriptor> {
        let root = self.metamodel.entity(entity_type)?;
        let mut scope = Scope {
            metamodel: self.metamodel,
            root,
            aliases: HashMap::new(),
            joins: Vec::new(),
        };

        for join in joins {
            scope.declare(join)?;
        }

        let fetches: Vec<Fetch> = fetches.into_iter().collect();
        for fetch in &fetches {
            scope.declare_fetch(fetch)?;
        }

        let filter = Predicate::all(predicates);
        let orderings: Vec<Order> = orderings.into_iter().collect();

        for path in filter.paths().into_iter().chain(orderings.iter().map(|o| &o.path)) {
            scope.check_path(path, self.validate_paths)?;
        }

        let descriptor = QueryDescriptor {
            entity_type,
            filter,
            joins: scope.joins,
            fetches,
            orderings,
            window: ResultWindow::UNBOUNDED,
            projection: Projection::Entities,
        };
        trace!(query = %descriptor, "assembled query");
        Ok(descriptor)
    }
}

/// Aliases visible while a descriptor is assembled.
struct Scope<'a> {
    metamodel: &'a Metamodel,
    root: &'a Arc<EntityMetadata>,
    aliases: HashMap<String, &'a Arc<EntityMetadata>>,
    joins: Vec<Join>,
}

impl<'a> Scope<'a> {
    fn source(&self, source: &PathSource) -> CoreResult<&'a Arc<EntityMetadata>> {
        match source {
            PathSource::Root => Ok(self.root),
            PathSource::Join(alias) => self
                .aliases
                .get(alias)
                .copied()
                .ok_or_else(|| CoreError::UnknownJoin {
                    alias: alias.clone(),
                }),
        }
    }

    fn declare(&mut self, join: Join) -> CoreResult<()> {
        let owner = self.source(&join.source)?;
        let attribute = owner.attribute(&join.attribute).ok_or_else(|| {
            CoreError::invalid_join(owner.entity_type(), &join.attribute, "no such attribute")
        })?;
        let target = match attribute.kind() {
            AttributeKind::Basic => {
                return Err(CoreError::invalid_join(
                    owner.entity_type(),
                    &join.attribute,
                    "not a relationship",
                ))
            }
            AttributeKind::ToOne { target, .. } | AttributeKind::ToMany { target, .. } => *target,
        };
        if self.aliases.contains_key(&join.alias) {
            return Err(CoreError::invalid_join(
                owner.entity_type(),
                &join.attribute,
                format!("alias {} is already declared", join.alias),
            ));
        }

        let target = self.metamodel.entity(target)?;
        self.aliases.insert(join.alias.clone(), target);
        self.joins.push(join);
        Ok(())
    }

    fn declare_fetch(&mut self, fetch: &Fetch) -> CoreResult<()> {
        let not_traversable = || {
            CoreError::invalid_join(
                self.root.entity_type(),
                &fetch.attribute,
                "fetch does not traverse a relationship",
            )
        };
        if fetch.kind == FetchKind::Attribute {
            return Err(not_traversable());
        }
        let join = fetch.as_join().ok_or_else(not_traversable)?;

        // A join declared explicitly on the same relationship doubles as the fetch.
        if let Some(existing) = self.joins.iter().find(|j| j.alias == join.alias) {
            if existing.source == join.source && existing.attribute == join.attribute {
                return Ok(());
            }
        }
        self.declare(join)
    }

    fn check_path(&self, path: &FieldPath, validate_fields: bool) -> CoreResult<()> {
        let owner = self.source(&path.source)?;
        if validate_fields && !owner.has_field(&path.field) {
            return Err(CoreError::unknown_attribute(
                owner.entity_type(),
                &path.field,
            ));
        }
        Ok(())
    }
}
