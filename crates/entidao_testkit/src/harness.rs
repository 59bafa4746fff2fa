//! Cross-crate test harness.
//!
//! Drives a repository over the in-memory engine while keeping its own
//! record of what should be stored, so tests can verify the two agree.

use crate::fixtures::{memory_store, Person};
use entidao_core::{Entity, EntityId, Repository};
use entidao_storage::{MemorySession, MemoryStore};
use std::collections::HashMap;
use std::sync::Arc;

/// A harness tracking every person saved through it.
pub struct RepositoryHarness {
    /// The repository under test.
    pub repo: Repository<MemorySession>,
    store: Arc<MemoryStore>,
    people: HashMap<EntityId, Person>,
}

impl RepositoryHarness {
    /// Creates a harness on a fresh store.
    pub fn new() -> Self {
        let store = memory_store();
        Self {
            repo: Repository::new(store.session()),
            store,
            people: HashMap::new(),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Creates a person and tracks it.
    pub fn create(&mut self, person: Person) -> Person {
        let saved = self
            .repo
            .save_or_update(Some(person), None)
            .expect("Failed to save person")
            .expect("save returns the instance");
        let id = saved.id.expect("saved person has an identity");
        self.people.insert(id, saved.clone());
        saved
    }

    /// Updates a tracked person under its identity.
    pub fn update(&mut self, person: Person) -> Person {
        let id = person.id.expect("updated person has an identity");
        let merged = self
            .repo
            .save_or_update(Some(person), Some(id))
            .expect("Failed to update person")
            .expect("update returns the instance");
        self.people.insert(id, merged.clone());
        merged
    }

    /// Deletes a person by identity and stops tracking it.
    pub fn delete(&mut self, id: EntityId) {
        self.repo
            .delete_by_id::<Person>(id)
            .expect("Failed to delete person");
        self.people.remove(&id);
    }

    /// Commits the repository's session.
    pub fn commit(&mut self) {
        self.repo
            .session_mut()
            .commit()
            .expect("Failed to commit");
    }

    /// Verifies every tracked person reads back unchanged and nothing
    /// untracked is stored.
    pub fn verify_all(&mut self) {
        for (id, expected) in &self.people {
            let actual = self
                .repo
                .get::<Person>(*id)
                .expect("Failed to get person");
            assert_eq!(actual.as_ref(), Some(expected), "person mismatch for {id}");
        }
        let stored = self.repo.count_all::<Person>().expect("Failed to count");
        assert_eq!(stored, self.people.len() as u64, "unexpected people stored");
    }

    /// Returns the number of tracked people.
    pub fn tracked_count(&self) -> usize {
        self.people.len()
    }

    /// Returns the number of committed people in the store.
    pub fn committed_count(&self) -> usize {
        self.store.len(Person::ENTITY_TYPE)
    }
}

impl Default for RepositoryHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harness_tracks_lifecycle() {
        let mut harness = RepositoryHarness::new();
        let ann = harness.create(Person::new("Ann", 34));
        let bob = harness.create(Person::new("Bob", 27));

        let mut older = ann.clone();
        older.age = 35;
        harness.update(older);
        harness.delete(bob.id.unwrap());

        harness.verify_all();
        assert_eq!(harness.tracked_count(), 1);
        assert_eq!(harness.committed_count(), 0);

        harness.commit();
        assert_eq!(harness.committed_count(), 1);
    }
}
