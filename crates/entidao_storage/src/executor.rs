//! Descriptor execution by scanning.
//!
//! Every query decodes the extents it touches, expands joins into bindings,
//! keeps the roots with at least one binding that satisfies the filter,
//! sorts, applies the window and finally embeds fetched associations.

use crate::store::Extent;
use entidao_codec::Value;
use entidao_core::query::{FieldPath, FieldResolver, JoinType, PathSource, QueryDescriptor};
use entidao_core::{
    AttributeKind, CoreError, CoreResult, EntityId, EntityMetadata, EntityType, Metamodel, Record,
    Row,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::trace;

/// Decoded rows of one entity type.
struct Table {
    rows: Vec<(EntityId, Record)>,
    index: HashMap<EntityId, usize>,
}

impl Table {
    fn decode(extent: Option<&Extent>) -> CoreResult<Self> {
        let mut rows = Vec::new();
        let mut index = HashMap::new();
        for stored in extent.into_iter().flat_map(Extent::iter) {
            index.insert(stored.id, rows.len());
            rows.push((stored.id, Record::decode(&stored.payload)?));
        }
        Ok(Self { rows, index })
    }
}

/// A root row with one row (or none, for left joins) bound per alias.
#[derive(Clone)]
struct Binding {
    root: usize,
    joins: HashMap<String, Option<usize>>,
}

/// Resolved join: the type behind an alias and how to reach it.
struct JoinPlan<'q> {
    alias: &'q str,
    source: Option<&'q str>,
    source_type: EntityType,
    target_type: EntityType,
    kind: AttributeKind,
    join_type: JoinType,
}

/// Executes a descriptor against committed extents merged with a session's
/// pending writes.
pub(crate) struct Executor<'a> {
    metamodel: &'a Metamodel,
    extents: &'a HashMap<EntityType, Extent>,
    tables: HashMap<EntityType, Table>,
}

impl<'a> Executor<'a> {
    pub fn new(metamodel: &'a Metamodel, extents: &'a HashMap<EntityType, Extent>) -> Self {
        Self {
            metamodel,
            extents,
            tables: HashMap::new(),
        }
    }

    fn load(&mut self, entity_type: EntityType) -> CoreResult<()> {
        if !self.tables.contains_key(&entity_type) {
            let table = Table::decode(self.extents.get(&entity_type))?;
            self.tables.insert(entity_type, table);
        }
        Ok(())
    }

    fn table(&self, entity_type: EntityType) -> CoreResult<&Table> {
        self.tables
            .get(&entity_type)
            .ok_or_else(|| CoreError::unknown_entity_type(entity_type))
    }

    fn plan<'q>(&mut self, query: &'q QueryDescriptor) -> CoreResult<Vec<JoinPlan<'q>>> {
        let root_type = query.entity_type();
        self.load(root_type)?;

        let mut alias_types: HashMap<&'q str, EntityType> = HashMap::new();
        let mut plans = Vec::with_capacity(query.joins().len());
        for join in query.joins() {
            let (source, source_type) = match &join.source {
                PathSource::Root => (None, root_type),
                PathSource::Join(alias) => {
                    let ty = alias_types.get(alias.as_str()).copied().ok_or_else(|| {
                        CoreError::UnknownJoin {
                            alias: alias.clone(),
                        }
                    })?;
                    (Some(alias.as_str()), ty)
                }
            };
            let owner = self.metamodel.entity(source_type)?;
            let kind = owner
                .attribute(&join.attribute)
                .map(|a| a.kind().clone())
                .ok_or_else(|| {
                    CoreError::invalid_join(source_type, &join.attribute, "no such attribute")
                })?;
            let target_type = match &kind {
                AttributeKind::ToOne { target, .. } | AttributeKind::ToMany { target, .. } => {
                    *target
                }
                AttributeKind::Basic => {
                    return Err(CoreError::invalid_join(
                        source_type,
                        &join.attribute,
                        "not a relationship",
                    ))
                }
            };
            self.load(target_type)?;
            alias_types.insert(join.alias.as_str(), target_type);
            plans.push(JoinPlan {
                alias: &join.alias,
                source,
                source_type,
                target_type,
                kind,
                join_type: join.join_type,
            });
        }
        Ok(plans)
    }

    /// Returns the matching roots in order, before the window is applied.
    fn matching(&mut self, query: &QueryDescriptor) -> CoreResult<Vec<Binding>> {
        let plans = self.plan(query)?;
        let aliases: HashMap<&str, EntityType> =
            plans.iter().map(|p| (p.alias, p.target_type)).collect();
        let root_type = query.entity_type();
        let root_meta = self.metamodel.entity(root_type)?;
        let root_table = self.table(root_type)?;

        let mut matched = Vec::new();
        for root in 0..root_table.rows.len() {
            let mut bindings = vec![Binding {
                root,
                joins: HashMap::new(),
            }];
            for plan in &plans {
                bindings = self.expand(bindings, plan)?;
                if bindings.is_empty() {
                    break;
                }
            }

            let hit = bindings.into_iter().find(|binding| {
                query.filter().matches(&Resolver {
                    executor: self,
                    aliases: &aliases,
                    root_meta,
                    binding,
                })
            });
            if let Some(binding) = hit {
                matched.push(binding);
            }
        }

        if !query.orderings().is_empty() {
            let keys: Vec<Vec<Value>> = matched
                .iter()
                .map(|binding| {
                    let resolver = Resolver {
                        executor: self,
                        aliases: &aliases,
                        root_meta,
                        binding,
                    };
                    query
                        .orderings()
                        .iter()
                        .map(|order| resolver.resolve(&order.path))
                        .collect()
                })
                .collect();

            let mut order: Vec<usize> = (0..matched.len()).collect();
            order.sort_by(|&a, &b| {
                query
                    .orderings()
                    .iter()
                    .zip(keys[a].iter().zip(&keys[b]))
                    .map(|(o, (x, y))| o.apply(x.sort_cmp(y)))
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
            let mut slots: Vec<Option<Binding>> = matched.into_iter().map(Some).collect();
            matched = order.into_iter().filter_map(|i| slots[i].take()).collect();
        }

        trace!(query = %query, matched = matched.len(), "scanned");
        Ok(matched)
    }

    fn expand(
        &self,
        bindings: Vec<Binding>,
        plan: &JoinPlan<'_>,
    ) -> CoreResult<Vec<Binding>> {
        let source_table = self.table(plan.source_type)?;
        let target_table = self.table(plan.target_type)?;
        let mut out = Vec::with_capacity(bindings.len());

        for binding in bindings {
            let source_row = match plan.source {
                None => Some(binding.root),
                Some(alias) => binding.joins.get(alias).copied().flatten(),
            };

            let targets: Vec<usize> = match source_row {
                None => Vec::new(),
                Some(row) => {
                    let (source_id, source_record) = &source_table.rows[row];
                    related(&plan.kind, *source_id, source_record, target_table)
                }
            };

            if targets.is_empty() {
                if plan.join_type == JoinType::Left {
                    let mut next = binding;
                    next.joins.insert(plan.alias.to_string(), None);
                    out.push(next);
                }
                continue;
            }
            for target in targets {
                let mut next = binding.clone();
                next.joins.insert(plan.alias.to_string(), Some(target));
                out.push(next);
            }
        }
        Ok(out)
    }

    /// Executes an entity query and returns the rows inside its window.
    pub fn rows(&mut self, query: &QueryDescriptor) -> CoreResult<Vec<Row>> {
        let matched = self.matching(query)?;
        let root_type = query.entity_type();
        let root_table = self.table(root_type)?;

        let mut rows = Vec::new();
        for binding in query.window().apply(matched) {
            let (id, record) = &root_table.rows[binding.root];
            let mut record = record.clone();
            self.embed_fetches(query, *id, &mut record)?;
            rows.push(Row::new(*id, record));
        }
        Ok(rows)
    }

    /// Counts matching roots, ignoring the window.
    pub fn count(&mut self, query: &QueryDescriptor) -> CoreResult<u64> {
        let matched = self.matching(query)?;
        Ok(matched.len() as u64)
    }

    /// Returns the identities of all matching roots, ignoring the window.
    pub fn ids(&mut self, query: &QueryDescriptor) -> CoreResult<Vec<EntityId>> {
        let matched = self.matching(query)?;
        let root_table = self.table(query.entity_type())?;
        Ok(matched
            .into_iter()
            .map(|binding| root_table.rows[binding.root].0)
            .collect())
    }

    fn embed_fetches(
        &self,
        query: &QueryDescriptor,
        id: EntityId,
        record: &mut Record,
    ) -> CoreResult<()> {
        let root_meta = self.metamodel.entity(query.entity_type())?;
        for fetch in query.fetches() {
            let Some(attribute) = root_meta.attribute(&fetch.attribute) else {
                continue;
            };
            let Some(target_type) = attribute.target() else {
                continue;
            };
            let target_meta = self.metamodel.entity(target_type)?;
            let target_table = self.table(target_type)?;
            let related = related(attribute.kind(), id, record, target_table);

            let value = match attribute.kind() {
                AttributeKind::ToMany { .. } => Value::Array(
                    related
                        .iter()
                        .map(|&i| embedded(target_meta, &target_table.rows[i]))
                        .collect(),
                ),
                _ => related
                    .first()
                    .map_or(Value::Null, |&i| embedded(target_meta, &target_table.rows[i])),
            };
            record.set(fetch.attribute.clone(), value);
        }
        Ok(())
    }
}

/// Rows of `target` related to a source instance through `kind`.
fn related(kind: &AttributeKind, source_id: EntityId, source: &Record, target: &Table) -> Vec<usize> {
    match kind {
        AttributeKind::Basic => Vec::new(),
        AttributeKind::ToOne { join_column, .. } => source
            .get(join_column)
            .and_then(EntityId::from_value)
            .and_then(|id| target.index.get(&id).copied())
            .into_iter()
            .collect(),
        AttributeKind::ToMany { mapped_by, .. } => target
            .rows
            .iter()
            .enumerate()
            .filter(|(_, (_, record))| {
                record
                    .get(mapped_by)
                    .and_then(EntityId::from_value)
                    .is_some_and(|owner| owner == source_id)
            })
            .map(|(i, _)| i)
            .collect(),
    }
}

fn embedded(metadata: &EntityMetadata, (id, record): &(EntityId, Record)) -> Value {
    let mut record = record.clone();
    record.set(metadata.id_field_name(), *id);
    record.to_value()
}

struct Resolver<'r, 'a> {
    executor: &'r Executor<'a>,
    aliases: &'r HashMap<&'r str, EntityType>,
    root_meta: &'r EntityMetadata,
    binding: &'r Binding,
}

impl Resolver<'_, '_> {
    fn field(&self, entity_type: EntityType, row: usize, field: &str) -> Value {
        let Ok(table) = self.executor.table(entity_type) else {
            return Value::Null;
        };
        let (id, record) = &table.rows[row];
        let is_id = self
            .executor
            .metamodel
            .entity(entity_type)
            .is_ok_and(|meta| meta.id_field_name() == field);
        if is_id {
            Value::from(*id)
        } else {
            record.value(field)
        }
    }
}

impl FieldResolver for Resolver<'_, '_> {
    fn resolve(&self, path: &FieldPath) -> Value {
        match &path.source {
            PathSource::Root => {
                self.field(self.root_meta.entity_type(), self.binding.root, &path.field)
            }
            PathSource::Join(alias) => {
                let Some(Some(row)) = self.binding.joins.get(alias) else {
                    return Value::Null;
                };
                match self.aliases.get(alias.as_str()) {
                    Some(ty) => self.field(*ty, *row, &path.field),
                    None => Value::Null,
                }
            }
        }
    }
}
