//! Repository contract tests against the in-memory engine.

use entidao_core::{Config, CoreError, Entity, EntityId, Repository};
use entidao_storage::StoreConfig;
use entidao_testkit::prelude::*;
use entidao_testkit::scenarios;

#[test]
fn get_missing_identity_is_absent() {
    with_repository(|repo| {
        let found = repo.get::<Person>(EntityId::new()).unwrap();
        assert!(found.is_none());
    });
}

#[test]
fn create_then_get_returns_equal_state() {
    with_repository(|repo| {
        let saved = repo
            .save_or_update(Some(Person::new("Ann", 34).with_email("ann@example.com")), None)
            .unwrap()
            .unwrap();
        let id = saved.id.unwrap();

        let loaded = repo.get::<Person>(id).unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.clone().transient(), Person::new("Ann", 34).with_email("ann@example.com"));
    });
}

#[test]
fn update_then_get_reflects_new_state() {
    with_repository(|repo| {
        let saved = repo
            .save_or_update(Some(Person::new("Ann", 34)), None)
            .unwrap()
            .unwrap();
        let id = saved.id.unwrap();

        let mut changed = saved.clone();
        changed.age = 35;
        changed.email = Some("ann@example.org".into());
        repo.save_or_update(Some(changed.clone()), Some(id)).unwrap();

        assert_eq!(repo.get::<Person>(id).unwrap(), Some(changed));
    });
}

#[test]
fn update_survives_commit_in_a_new_session() {
    let store = memory_store();
    let id = {
        let mut repo = Repository::new(store.session());
        let saved = repo
            .save_or_update(Some(Person::new("Ann", 34)), None)
            .unwrap()
            .unwrap();
        repo.session_mut().commit().unwrap();
        saved.id.unwrap()
    };

    let mut repo = Repository::new(store.session());
    let mut detached = Person::new("Ann", 40);
    detached.id = Some(id);
    repo.save_or_update(Some(detached), Some(id)).unwrap();
    repo.session_mut().commit().unwrap();

    let mut reader = Repository::new(store.session());
    assert_eq!(reader.get::<Person>(id).unwrap().unwrap().age, 40);
}

#[test]
fn transient_instance_adopts_explicit_identity() {
    with_repository(|repo| {
        let id = EntityId::new();
        let merged = repo
            .save_or_update(Some(Person::new("Bob", 27)), Some(id))
            .unwrap()
            .unwrap();
        assert_eq!(merged.id, Some(id));
        assert_eq!(repo.get::<Person>(id).unwrap(), Some(merged));
    });
}

#[test]
fn absent_entity_is_a_no_op() {
    with_repository(|repo| {
        let result = repo.save_or_update::<Person>(None, None).unwrap();
        assert!(result.is_none());
        assert_eq!(repo.count_all::<Person>().unwrap(), 0);
    });
}

#[test]
fn identity_rules_are_enforced() {
    with_repository(|repo| {
        let saved = repo
            .save_or_update(Some(Person::new("Ann", 34)), None)
            .unwrap()
            .unwrap();

        let err = repo.save_or_update(Some(saved.clone()), None).unwrap_err();
        assert!(matches!(err, CoreError::IdentityAssigned { .. }));

        let err = repo
            .save_or_update(Some(saved), Some(EntityId::new()))
            .unwrap_err();
        assert!(matches!(err, CoreError::IdentityMismatch { .. }));
    });
}

#[test]
fn delete_by_id_twice_is_not_an_error() {
    let (mut repo, people) = scenarios::numbered_people(3);
    let id = people[1].id.unwrap();

    repo.delete_by_id::<Person>(id).unwrap();
    repo.delete_by_id::<Person>(id).unwrap();
    repo.delete_by_id::<Person>(EntityId::new()).unwrap();

    assert!(repo.get::<Person>(id).unwrap().is_none());
    assert_eq!(repo.count_all::<Person>().unwrap(), 2);
}

#[test]
fn delete_requires_a_managed_instance() {
    let store = memory_store();
    let saved = {
        let mut repo = Repository::new(store.session());
        let saved = repo
            .save_or_update(Some(Person::new("Ann", 34)), None)
            .unwrap()
            .unwrap();
        repo.session_mut().commit().unwrap();
        saved
    };

    let mut repo = Repository::new(store.session());
    let err = repo.delete(&saved).unwrap_err();
    assert!(matches!(err, CoreError::NotPersistent { .. }));

    let err = repo.delete(&Person::new("Nobody", 1)).unwrap_err();
    assert!(matches!(err, CoreError::NotPersistent { id: None, .. }));

    let managed = repo.get::<Person>(saved.id.unwrap()).unwrap().unwrap();
    repo.delete(&managed).unwrap();
    assert!(repo.get::<Person>(saved.id.unwrap()).unwrap().is_none());
}

#[test]
fn removed_instance_cannot_come_back() {
    with_repository(|repo| {
        let saved = repo
            .save_or_update(Some(Person::new("Ann", 34)), None)
            .unwrap()
            .unwrap();
        let id = saved.id.unwrap();
        repo.delete(&saved).unwrap();

        let err = repo.save_or_update(Some(saved), Some(id)).unwrap_err();
        assert!(matches!(err, CoreError::Removed { .. }));
    });
}

#[test]
fn delete_many_is_all_or_nothing() {
    let (mut repo, people) = scenarios::numbered_people(3);
    let mut batch = people.clone();
    batch.push(Person::new("transient", 99));

    let err = repo.delete_many(&batch).unwrap_err();
    assert!(matches!(err, CoreError::NotPersistent { .. }));
    assert_eq!(repo.count_all::<Person>().unwrap(), 3);

    repo.delete_many(&people[..2]).unwrap();
    assert_eq!(repo.count_all::<Person>().unwrap(), 1);
}

#[test]
fn delete_all_empties_the_extent() {
    let (mut repo, _people) = scenarios::numbered_people(4);
    assert_eq!(repo.delete_all::<Person>().unwrap(), 4);
    assert!(repo.get_all::<Person>().unwrap().is_empty());

    repo.session_mut().commit().unwrap();
    assert_eq!(repo.session().store().len(Person::ENTITY_TYPE), 0);
}

#[test]
fn get_all_on_empty_extent_is_empty() {
    with_repository(|repo| {
        assert!(repo.get_all::<Order>().unwrap().is_empty());
        assert_eq!(repo.count_all::<Order>().unwrap(), 0);
    });
}

#[test]
fn get_all_windowed_pages_in_natural_order() {
    let (mut repo, people) = scenarios::numbered_people(10);

    let page = repo.get_all_windowed::<Person>(Some(3), Some(4)).unwrap();
    assert_eq!(page, people[4..7].to_vec());

    let all = repo.get_all_windowed::<Person>(Some(0), None).unwrap();
    assert_eq!(all, people);

    let tail = repo.get_all_windowed::<Person>(None, Some(8)).unwrap();
    assert_eq!(tail, people[8..].to_vec());

    let past_end = repo.get_all_windowed::<Person>(Some(5), Some(20)).unwrap();
    assert!(past_end.is_empty());
}

#[test]
fn row_limit_clamps_unbounded_reads() {
    let store = memory_store();
    let mut repo = Repository::with_config(store.session(), Config::default().max_rows_limit(Some(2)));
    for i in 0..5 {
        repo.save_or_update(Some(Person::new(format!("p{i}"), i)), None)
            .unwrap();
    }

    assert_eq!(repo.get_all::<Person>().unwrap().len(), 2);
    assert_eq!(repo.get_all_windowed::<Person>(Some(1), None).unwrap().len(), 1);
    assert_eq!(repo.count_all::<Person>().unwrap(), 5);
}

#[test]
fn extent_limit_fails_commit_and_keeps_writes() {
    let store = memory_store_with(StoreConfig::new().max_extent_size(Some(1)));
    let mut repo = Repository::new(store.session());
    repo.save_or_update(Some(Person::new("Ann", 34)), None).unwrap();
    repo.save_or_update(Some(Person::new("Bob", 27)), None).unwrap();

    let err = repo.session_mut().commit().unwrap_err();
    assert!(matches!(err, CoreError::Storage(_)));
    assert_eq!(store.len(Person::ENTITY_TYPE), 0);
    assert_eq!(repo.session().pending_writes(), 2);
}

#[test]
fn harness_roundtrip() {
    let mut harness = RepositoryHarness::new();
    let people: Vec<_> = (0..5)
        .map(|i| harness.create(Person::new(format!("p{i}"), i)))
        .collect();
    let mut first = people[0].clone();
    first.name = "renamed".into();
    harness.update(first);
    harness.delete(people[4].id.unwrap());
    harness.commit();

    harness.verify_all();
    assert_eq!(harness.committed_count(), 4);
}
