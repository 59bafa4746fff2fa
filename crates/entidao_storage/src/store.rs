//! The shared in-memory store.

use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::session::MemorySession;
use entidao_core::{EntityId, EntityType, Metamodel};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A write buffered by a session until commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingWrite {
    /// Insert or update. `seq` positions a new instance in natural order;
    /// an existing instance keeps its position.
    Put {
        /// Insertion sequence.
        seq: u64,
        /// Canonical CBOR record.
        payload: Vec<u8>,
    },
    /// Delete.
    Delete,
}

#[derive(Debug, Clone)]
pub(crate) struct StoredRow {
    pub id: EntityId,
    pub payload: Vec<u8>,
}

/// All instances of one entity type, in insertion order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Extent {
    rows: BTreeMap<u64, StoredRow>,
    by_id: HashMap<EntityId, u64>,
}

impl Extent {
    pub fn get(&self, id: EntityId) -> Option<&[u8]> {
        let seq = self.by_id.get(&id)?;
        self.rows.get(seq).map(|row| row.payload.as_slice())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredRow> {
        self.rows.values()
    }

    pub fn apply(&mut self, id: EntityId, write: &PendingWrite) {
        match write {
            PendingWrite::Put { seq, payload } => match self.by_id.get(&id) {
                Some(existing) => {
                    if let Some(row) = self.rows.get_mut(existing) {
                        row.payload.clone_from(payload);
                    }
                }
                None => {
                    self.rows.insert(
                        *seq,
                        StoredRow {
                            id,
                            payload: payload.clone(),
                        },
                    );
                    self.by_id.insert(id, *seq);
                }
            },
            PendingWrite::Delete => {
                if let Some(seq) = self.by_id.remove(&id) {
                    self.rows.remove(&seq);
                }
            }
        }
    }
}

/// A thread-safe in-memory store shared by many sessions.
///
/// Each entity type registered in the metamodel has an *extent*: its
/// instances in insertion order, stored as canonical CBOR records. Sessions
/// read committed state plus their own buffered writes, and publish those
/// writes atomically on commit.
///
/// # Example
///
/// ```rust
/// use entidao_core::{EntityMetadata, EntityType, Metamodel, Record, Session};
/// use entidao_storage::MemoryStore;
/// use std::sync::Arc;
///
/// const NOTE: EntityType = EntityType::new("note");
///
/// let metamodel = Metamodel::builder()
///     .entity(EntityMetadata::new(NOTE).basic("text"))
///     .build()
///     .unwrap();
/// let store = Arc::new(MemoryStore::new(metamodel));
///
/// let mut session = store.session();
/// let id = session.persist(NOTE, Record::new().with("text", "hello")).unwrap();
/// session.commit().unwrap();
///
/// assert!(store.get(NOTE, id).is_some());
/// ```
pub struct MemoryStore {
    metamodel: Arc<Metamodel>,
    config: StoreConfig,
    extents: RwLock<HashMap<EntityType, Extent>>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store for the given metamodel.
    #[must_use]
    pub fn new(metamodel: Metamodel) -> Self {
        Self::with_config(metamodel, StoreConfig::default())
    }

    /// Creates an empty store with a custom configuration.
    #[must_use]
    pub fn with_config(metamodel: Metamodel, config: StoreConfig) -> Self {
        let extents = metamodel
            .entity_types()
            .into_iter()
            .map(|ty| (ty, Extent::default()))
            .collect();
        Self {
            metamodel: Arc::new(metamodel),
            config,
            extents: RwLock::new(extents),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Opens a new session on this store.
    #[must_use]
    pub fn session(self: &Arc<Self>) -> MemorySession {
        MemorySession::new(Arc::clone(self))
    }

    /// Returns the metamodel.
    #[must_use]
    pub fn metamodel(&self) -> &Metamodel {
        &self.metamodel
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the committed payload of an instance.
    #[must_use]
    pub fn get(&self, entity_type: EntityType, id: EntityId) -> Option<Vec<u8>> {
        self.extents
            .read()
            .get(&entity_type)
            .and_then(|extent| extent.get(id))
            .map(<[u8]>::to_vec)
    }

    /// Returns the number of committed instances of a type.
    #[must_use]
    pub fn len(&self, entity_type: EntityType) -> usize {
        self.extents
            .read()
            .get(&entity_type)
            .map_or(0, Extent::len)
    }

    /// Returns the number of committed instances across all types.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.extents.read().values().map(Extent::len).sum()
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn contains(&self, entity_type: EntityType, id: EntityId) -> bool {
        self.extents
            .read()
            .get(&entity_type)
            .is_some_and(|extent| extent.contains(id))
    }

    /// Copies the committed extents.
    pub(crate) fn snapshot(&self) -> HashMap<EntityType, Extent> {
        self.extents.read().clone()
    }

    /// Applies a batch of writes atomically.
    ///
    /// Either every write becomes visible or, when an extent limit would be
    /// exceeded, none does.
    pub(crate) fn apply(
        &self,
        writes: &HashMap<(EntityType, EntityId), PendingWrite>,
    ) -> StorageResult<()> {
        let mut extents = self.extents.write();

        let mut touched: HashMap<EntityType, Extent> = HashMap::new();
        for ((entity_type, id), write) in writes {
            let extent = touched.entry(*entity_type).or_insert_with(|| {
                extents.get(entity_type).cloned().unwrap_or_default()
            });
            extent.apply(*id, write);
        }

        if let Some(limit) = self.config.max_extent_size {
            for (entity_type, extent) in &touched {
                if extent.len() > limit {
                    return Err(StorageError::ExtentFull {
                        entity: entity_type.name().to_string(),
                        size: extent.len(),
                        limit,
                    });
                }
            }
        }

        debug!(writes = writes.len(), extents = touched.len(), "applied commit");
        extents.extend(touched);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entity_types", &self.metamodel.len())
            .field("entity_count", &self.entity_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entidao_core::EntityMetadata;

    const NOTE: EntityType = EntityType::new("note");

    fn store(config: StoreConfig) -> MemoryStore {
        let metamodel = Metamodel::builder()
            .entity(EntityMetadata::new(NOTE).basic("text"))
            .build()
            .unwrap();
        MemoryStore::with_config(metamodel, config)
    }

    fn put(seq: u64, payload: &[u8]) -> PendingWrite {
        PendingWrite::Put {
            seq,
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn update_keeps_position() {
        let mut extent = Extent::default();
        let (a, b) = (EntityId::new(), EntityId::new());
        extent.apply(a, &put(1, b"a1"));
        extent.apply(b, &put(2, b"b1"));
        extent.apply(a, &put(3, b"a2"));

        let order: Vec<_> = extent.iter().map(|row| row.id).collect();
        assert_eq!(order, vec![a, b]);
        assert_eq!(extent.get(a), Some(&b"a2"[..]));
    }

    #[test]
    fn delete_of_unknown_id_is_ignored() {
        let mut extent = Extent::default();
        extent.apply(EntityId::new(), &PendingWrite::Delete);
        assert_eq!(extent.len(), 0);
    }

    #[test]
    fn apply_is_atomic() {
        let store = store(StoreConfig::new().max_extent_size(Some(1)));
        let first = EntityId::new();
        let writes = HashMap::from([((NOTE, first), put(1, b"x"))]);
        store.apply(&writes).unwrap();

        let writes = HashMap::from([
            ((NOTE, first), PendingWrite::Delete),
            ((NOTE, EntityId::new()), put(2, b"y")),
            ((NOTE, EntityId::new()), put(3, b"z")),
        ]);
        let err = store.apply(&writes).unwrap_err();
        assert!(matches!(err, StorageError::ExtentFull { size: 2, limit: 1, .. }));
        assert_eq!(store.len(NOTE), 1);
        assert!(store.get(NOTE, first).is_some());
    }

    #[test]
    fn sequences_increase() {
        let store = store(StoreConfig::default());
        let a = store.next_seq();
        let b = store.next_seq();
        assert!(b > a);
    }
}
