//! Per-request persistence context over a [`MemoryStore`].

use crate::executor::Executor;
use crate::store::{Extent, MemoryStore, PendingWrite};
use entidao_core::query::QueryDescriptor;
use entidao_core::{CoreError, CoreResult, EntityId, EntityType, Metamodel, Record, Row, Session};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

type Key = (EntityType, EntityId);

/// A session on a [`MemoryStore`].
///
/// Writes are buffered in the session until [`commit`](Self::commit)
/// publishes them atomically; reads see committed state overlaid with the
/// session's own writes. The session also tracks which instances are
/// managed, so removal of unknown or detached instances is rejected.
pub struct MemorySession {
    store: Arc<MemoryStore>,
    managed: HashSet<Key>,
    removed: HashSet<Key>,
    writes: HashMap<Key, PendingWrite>,
    open: bool,
}

impl MemorySession {
    pub(crate) fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            managed: HashSet::new(),
            removed: HashSet::new(),
            writes: HashMap::new(),
            open: true,
        }
    }

    /// Returns the store this session writes to.
    #[must_use]
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Returns true until the session is closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns the number of buffered writes.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Publishes buffered writes to the store.
    ///
    /// On failure the writes stay buffered and nothing is published.
    pub fn commit(&mut self) -> CoreResult<()> {
        self.ensure_open()?;
        self.store.apply(&self.writes)?;
        debug!(writes = self.writes.len(), "session committed");
        self.writes.clear();
        Ok(())
    }

    /// Discards buffered writes and detaches every managed instance.
    pub fn rollback(&mut self) -> CoreResult<()> {
        self.ensure_open()?;
        debug!(writes = self.writes.len(), "session rolled back");
        self.writes.clear();
        self.managed.clear();
        self.removed.clear();
        Ok(())
    }

    /// Stops tracking an instance; buffered writes for it are kept.
    pub fn detach(&mut self, entity_type: EntityType, id: EntityId) {
        self.managed.remove(&(entity_type, id));
    }

    /// Closes the session, discarding buffered writes.
    ///
    /// Every later operation fails with `SessionClosed`.
    pub fn close(&mut self) {
        if self.open {
            debug!(discarded = self.writes.len(), "session closed");
        }
        self.open = false;
        self.writes.clear();
        self.managed.clear();
        self.removed.clear();
    }

    /// Runs `f` and commits if it succeeds, rolling back otherwise.
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
    /// let mut session = store.session();
    ///
    /// let id = session
    ///     .transaction(|s| s.persist(NOTE, Record::new().with("text", "hi")))
    ///     .unwrap();
    /// assert!(store.get(NOTE, id).is_some());
    /// ```
    pub fn transaction<F, T>(&mut self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Self) -> CoreResult<T>,
    {
        self.ensure_open()?;
        match f(self) {
            Ok(result) => {
                self.commit()?;
                Ok(result)
            }
            Err(e) => {
                // Keep the original error even if rollback fails.
                let _ = self.rollback();
                Err(e)
            }
        }
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(CoreError::SessionClosed)
        }
    }

    fn check_type(&self, entity_type: EntityType) -> CoreResult<()> {
        self.ensure_open()?;
        self.store.metamodel().entity(entity_type)?;
        Ok(())
    }

    /// Committed extents overlaid with this session's writes.
    fn view(&self) -> HashMap<EntityType, Extent> {
        let mut extents = self.store.snapshot();
        for ((entity_type, id), write) in &self.writes {
            extents.entry(*entity_type).or_default().apply(*id, write);
        }
        extents
    }

    fn put(&mut self, key: Key, record: &Record) -> CoreResult<()> {
        let payload = record.encode()?;
        let seq = match self.writes.get(&key) {
            Some(PendingWrite::Put { seq, .. }) => *seq,
            _ => self.store.next_seq(),
        };
        self.writes.insert(key, PendingWrite::Put { seq, payload });
        self.managed.insert(key);
        Ok(())
    }
}

impl Session for MemorySession {
    fn metamodel(&self) -> &Metamodel {
        self.store.metamodel()
    }

    fn find(&mut self, entity_type: EntityType, id: EntityId) -> CoreResult<Option<Record>> {
        self.check_type(entity_type)?;
        let key = (entity_type, id);
        let payload = match self.writes.get(&key) {
            Some(PendingWrite::Put { payload, .. }) => Some(payload.clone()),
            Some(PendingWrite::Delete) => None,
            None => self.store.get(entity_type, id),
        };
        trace!(entity = %entity_type, %id, found = payload.is_some(), "find");

        match payload {
            Some(payload) => {
                self.managed.insert(key);
                Record::decode(&payload).map(Some)
            }
            None => Ok(None),
        }
    }

    fn persist(&mut self, entity_type: EntityType, record: Record) -> CoreResult<EntityId> {
        self.check_type(entity_type)?;
        let id = EntityId::new();
        self.put((entity_type, id), &record)?;
        trace!(entity = %entity_type, %id, "persist");
        Ok(id)
    }

    fn merge(
        &mut self,
        entity_type: EntityType,
        id: EntityId,
        record: Record,
    ) -> CoreResult<Record> {
        self.check_type(entity_type)?;
        let key = (entity_type, id);
        if self.removed.contains(&key) {
            return Err(CoreError::Removed {
                entity: entity_type,
                id,
            });
        }
        self.put(key, &record)?;
        trace!(entity = %entity_type, %id, "merge");
        Ok(record)
    }

    fn remove(&mut self, entity_type: EntityType, id: EntityId) -> CoreResult<()> {
        self.check_type(entity_type)?;
        let key = (entity_type, id);
        if !self.managed.remove(&key) {
            return Err(CoreError::not_persistent(entity_type, Some(id)));
        }
        // Created and removed within the session: nothing to publish.
        if !self.store.contains(entity_type, id) {
            self.writes.remove(&key);
        } else {
            self.writes.insert(key, PendingWrite::Delete);
        }
        self.removed.insert(key);
        trace!(entity = %entity_type, %id, "remove");
        Ok(())
    }

    fn contains(&self, entity_type: EntityType, id: EntityId) -> bool {
        self.open && self.managed.contains(&(entity_type, id))
    }

    fn execute(&mut self, query: &QueryDescriptor) -> CoreResult<Vec<Row>> {
        self.check_type(query.entity_type())?;
        let view = self.view();
        let rows = Executor::new(self.store.metamodel(), &view).rows(query)?;
        for row in &rows {
            self.managed.insert((query.entity_type(), row.id));
        }
        Ok(rows)
    }

    fn count(&mut self, query: &QueryDescriptor) -> CoreResult<u64> {
        self.check_type(query.entity_type())?;
        let view = self.view();
        Executor::new(self.store.metamodel(), &view).count(query)
    }

    fn delete_where(&mut self, query: &QueryDescriptor) -> CoreResult<u64> {
        self.check_type(query.entity_type())?;
        let entity_type = query.entity_type();
        let view = self.view();
        let ids = Executor::new(self.store.metamodel(), &view).ids(query)?;
        for id in &ids {
            self.managed.insert((entity_type, *id));
            self.remove(entity_type, *id)?;
        }
        debug!(entity = %entity_type, removed = ids.len(), "bulk delete");
        Ok(ids.len() as u64)
    }
}

impl std::fmt::Debug for MemorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySession")
            .field("open", &self.open)
            .field("managed", &self.managed.len())
            .field("pending_writes", &self.writes.len())
            .finish_non_exhaustive()
    }
}
