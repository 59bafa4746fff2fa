//! The repository facade.
//!
//! [`Repository`] is the CRUD and query surface callers use. It owns (or
//! mutably borrows) a [`Session`] and routes every operation either straight
//! to the session's identity operations or through the assembler and the
//! materializer.

use crate::config::Config;
use crate::entity::{Entity, EntityId};
use crate::error::{CoreError, CoreResult};
use crate::materialize;
use crate::query::{CriteriaQuery, QueryAssembler, QueryDescriptor, ResultWindow};
use crate::session::Session;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Generic data-access object over a session.
///
/// # Example
///
/// ```rust,ignore
/// let mut repo = Repository::new(store.session());
///
/// let ada = repo.save_or_update(Some(Person::new("Ada", 36)), None)?.unwrap();
/// let id = ada.id.unwrap();
/// assert_eq!(repo.get::<Person>(id)?, Some(ada));
///
/// repo.delete_by_id::<Person>(id)?;
/// repo.delete_by_id::<Person>(id)?; // no-op
/// ```
pub struct Repository<S: Session> {
    session: S,
    config: Config,
}

impl<S: Session> Repository<S> {
    /// Creates a repository with the default configuration.
    pub fn new(session: S) -> Self {
        Self::with_config(session, Config::default())
    }

    /// Creates a repository with a custom configuration.
    pub fn with_config(session: S, config: Config) -> Self {
        Self { session, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the underlying session.
    #[must_use]
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Returns the underlying session mutably.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Consumes the repository and returns the session.
    pub fn into_session(self) -> S {
        self.session
    }

    /// Returns an assembler over the session's metamodel.
    #[must_use]
    pub fn assembler(&self) -> QueryAssembler<'_> {
        QueryAssembler::with_config(self.session.metamodel(), &self.config)
    }

    /// Starts a criteria query for `T`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` if `T` is not registered.
    pub fn criteria<T: Entity>(&self) -> CoreResult<CriteriaQuery<'_, T>> {
        CriteriaQuery::new(self.assembler())
    }

    /// Looks up an instance by identity.
    ///
    /// Returns `Ok(None)` when no instance has that identity.
    pub fn get<T: Entity>(&mut self, id: EntityId) -> CoreResult<Option<T>> {
        self.session.metamodel().entity(T::ENTITY_TYPE)?;
        let found = self.session.find(T::ENTITY_TYPE, id)?;
        debug!(entity = %T::ENTITY_TYPE, %id, found = found.is_some(), "get");
        found
            .map(|record| T::from_record(id, &record))
            .transpose()
    }

    /// Returns every instance of `T` in the engine's natural order.
    pub fn get_all<T: Entity>(&mut self) -> CoreResult<Vec<T>> {
        self.get_all_windowed(None, None)
    }

    /// Returns a window of instances of `T` in the engine's natural order.
    ///
    /// `max_rows` caps the result when positive; `from_row` skips that many
    /// leading instances when positive.
    pub fn get_all_windowed<T: Entity>(
        &mut self,
        max_rows: Option<i64>,
        from_row: Option<i64>,
    ) -> CoreResult<Vec<T>> {
        let query = self.assembler().select_all(T::ENTITY_TYPE)?;
        let window = self.clamp(ResultWindow::new(max_rows, from_row));
        self.log_query(&query);
        materialize::fetch_many(&mut self.session, &query, window)
    }

    /// Creates or updates an instance.
    ///
    /// - no entity: nothing happens and `Ok(None)` is returned
    /// - `id` is `None`: the instance is created and returned with its new
    ///   identity
    /// - `id` is `Some`: the instance's state is merged under `id` and the
    ///   managed state is returned
    ///
    /// # Errors
    ///
    /// - `IdentityAssigned` when creating an instance that already has an
    ///   identity
    /// - `IdentityMismatch` when `id` differs from the instance's identity
    pub fn save_or_update<T: Entity>(
        &mut self,
        entity: Option<T>,
        id: Option<EntityId>,
    ) -> CoreResult<Option<T>> {
        let Some(mut entity) = entity else {
            debug!(entity = %T::ENTITY_TYPE, "save_or_update without an instance");
            return Ok(None);
        };
        let entity_type = T::ENTITY_TYPE;
        self.session.metamodel().entity(entity_type)?;

        match id {
            None => {
                if let Some(existing) = entity.id() {
                    return Err(CoreError::IdentityAssigned {
                        entity: entity_type,
                        id: existing,
                    });
                }
                let id = self.session.persist(entity_type, entity.to_record())?;
                entity.assign_id(id);
                debug!(entity = %entity_type, %id, "created");
                Ok(Some(entity))
            }
            Some(id) => {
                if let Some(actual) = entity.id() {
                    if actual != id {
                        return Err(CoreError::IdentityMismatch {
                            entity: entity_type,
                            expected: id,
                            actual,
                        });
                    }
                }
                let record = self.session.merge(entity_type, id, entity.to_record())?;
                debug!(entity = %entity_type, %id, "merged");
                T::from_record(id, &record).map(Some)
            }
        }
    }

    /// Removes a managed instance.
    ///
    /// # Errors
    ///
    /// Returns `NotPersistent` if the instance is transient or not managed
    /// by the session.
    pub fn delete<T: Entity>(&mut self, entity: &T) -> CoreResult<()> {
        let id = self.managed_id(entity)?;
        self.session.remove(T::ENTITY_TYPE, id)?;
        debug!(entity = %T::ENTITY_TYPE, %id, "deleted");
        Ok(())
    }

    /// Removes the instance with `id`, if there is one.
    pub fn delete_by_id<T: Entity>(&mut self, id: EntityId) -> CoreResult<()> {
        self.session.metamodel().entity(T::ENTITY_TYPE)?;
        match self.session.find(T::ENTITY_TYPE, id)? {
            Some(_) => {
                self.session.remove(T::ENTITY_TYPE, id)?;
                debug!(entity = %T::ENTITY_TYPE, %id, "deleted by id");
            }
            None => debug!(entity = %T::ENTITY_TYPE, %id, "delete by id: not found"),
        }
        Ok(())
    }

    /// Removes several managed instances.
    ///
    /// Every instance is checked before any is removed, so either all of
    /// them are removed or none is.
    pub fn delete_many<T: Entity>(&mut self, entities: &[T]) -> CoreResult<()> {
        let mut ids = Vec::with_capacity(entities.len());
        let mut seen = HashSet::with_capacity(entities.len());
        for entity in entities {
            let id = self.managed_id(entity)?;
            if seen.insert(id) {
                ids.push(id);
            }
        }
        for id in &ids {
            self.session.remove(T::ENTITY_TYPE, *id)?;
        }
        debug!(entity = %T::ENTITY_TYPE, count = ids.len(), "deleted many");
        Ok(())
    }

    /// Removes every instance of `T` and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `Unimplemented` if the session cannot delete in bulk.
    pub fn delete_all<T: Entity>(&mut self) -> CoreResult<u64> {
        let query = self.assembler().select_all(T::ENTITY_TYPE)?;
        self.log_query(&query);
        let removed = self.session.delete_where(&query)?;
        debug!(entity = %T::ENTITY_TYPE, removed, "deleted all");
        Ok(removed)
    }

    /// Counts the instances of `T`.
    ///
    /// # Errors
    ///
    /// Returns `Unimplemented` if the session cannot count.
    pub fn count_all<T: Entity>(&mut self) -> CoreResult<u64> {
        let query = self.assembler().select_all(T::ENTITY_TYPE)?;
        self.count(&query)
    }

    /// Executes a single-result query.
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousResult` if more than one instance matches.
    pub fn find_one<T: Entity>(&mut self, query: &QueryDescriptor) -> CoreResult<Option<T>> {
        self.log_query(query);
        materialize::fetch_one(&mut self.session, query)
    }

    /// Executes a query and returns the first match under its ordering.
    pub fn find_first<T: Entity>(&mut self, query: &QueryDescriptor) -> CoreResult<Option<T>> {
        self.log_query(query);
        materialize::fetch_first(&mut self.session, query)
    }

    /// Executes a query and returns every match inside its window.
    pub fn find_many<T: Entity>(&mut self, query: &QueryDescriptor) -> CoreResult<Vec<T>> {
        let window = self.clamp(query.window());
        self.log_query(query);
        materialize::fetch_many(&mut self.session, query, window)
    }

    /// Counts the roots matching a query, ignoring its window.
    pub fn count(&mut self, query: &QueryDescriptor) -> CoreResult<u64> {
        self.log_query(query);
        materialize::count(&mut self.session, query)
    }

    fn managed_id<T: Entity>(&self, entity: &T) -> CoreResult<EntityId> {
        match entity.id() {
            Some(id) if self.session.contains(T::ENTITY_TYPE, id) => Ok(id),
            id => Err(CoreError::not_persistent(T::ENTITY_TYPE, id)),
        }
    }

    fn clamp(&self, window: ResultWindow) -> ResultWindow {
        let Some(limit) = self.config.max_rows_limit.filter(|n| *n > 0) else {
            return window;
        };
        if window.max_rows().is_some_and(|max| max <= limit) {
            return window;
        }
        warn!(requested = %window, limit, "row limit clamps result window");
        window.limit(limit)
    }

    fn log_query(&self, query: &QueryDescriptor) {
        if self.config.log_queries {
            debug!(query = %query, "executing query");
        }
    }
}

impl<S: Session + std::fmt::Debug> std::fmt::Debug for Repository<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("session", &self.session)
            .field("config", &self.config)
            .finish()
    }
}
