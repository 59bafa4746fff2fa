//! Criteria queries through the repository facade.

use entidao_core::query::{JoinType, Predicate, QueryDescriptor};
use entidao_core::{Config, CoreError, Repository};
use entidao_storage::MemorySession;
use entidao_testkit::prelude::*;
use entidao_testkit::scenarios::{self, Household};

fn names(people: &[Person]) -> Vec<&str> {
    people.iter().map(|p| p.name.as_str()).collect()
}

fn household() -> (Repository<MemorySession>, Household) {
    scenarios::household()
}

#[test]
fn conjunction_narrows_each_conjunct() {
    let (mut repo, _) = household();

    let (p1, p2, both) = {
        let root = repo.criteria::<Person>().unwrap().root();
        let p1 = root.field("age").eq(34);
        let p2 = root.field("email").is_not_null();
        let assembler = repo.assembler();
        (
            assembler
                .assemble(Person::ENTITY_TYPE, [p1.clone()], [], [], [])
                .unwrap(),
            assembler
                .assemble(Person::ENTITY_TYPE, [p2.clone()], [], [], [])
                .unwrap(),
            assembler
                .assemble(Person::ENTITY_TYPE, [p1, p2], [], [], [])
                .unwrap(),
        )
    };

    let only_p1: Vec<Person> = repo.find_many(&p1).unwrap();
    let only_p2: Vec<Person> = repo.find_many(&p2).unwrap();
    let conj: Vec<Person> = repo.find_many(&both).unwrap();

    assert_eq!(names(&only_p1), vec!["Ann", "Cid"]);
    assert_eq!(names(&only_p2), vec!["Ann", "Dee"]);
    assert_eq!(names(&conj), vec!["Ann"]);
    assert!(conj.iter().all(|p| only_p1.contains(p) && only_p2.contains(p)));
}

#[test]
fn empty_predicate_set_matches_everything() {
    let (mut repo, _) = household();
    let query = repo
        .assembler()
        .assemble(Person::ENTITY_TYPE, [], [], [], [])
        .unwrap();
    assert_eq!(query.filter(), &Predicate::True);
    assert_eq!(repo.count(&query).unwrap(), 4);
}

#[test]
fn find_one_cardinalities() {
    let (mut repo, household) = household();

    let by_age = |repo: &Repository<MemorySession>, age: i64| -> QueryDescriptor {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        query.filter(root.field("age").eq(age));
        query.build().unwrap()
    };

    let none = by_age(&repo, 99);
    let one = by_age(&repo, 27);
    let two = by_age(&repo, 34);

    assert_eq!(repo.find_one::<Person>(&none).unwrap(), None);
    assert_eq!(repo.find_one::<Person>(&one).unwrap(), Some(household.bob));

    let err = repo.find_one::<Person>(&two).unwrap_err();
    assert!(matches!(err, CoreError::AmbiguousResult { count: 2, .. }));

    let first = repo.find_first::<Person>(&two).unwrap();
    assert_eq!(first, Some(household.ann));
}

#[test]
fn join_filters_on_association_fields() {
    let (mut repo, _) = household();
    let query = {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        let address = query.join(root.join("address", "a"));
        query
            .filter(address.field("city").eq("Oslo"))
            .order_by(root.field("age").desc());
        query.build().unwrap()
    };

    let people: Vec<Person> = repo.find_many(&query).unwrap();
    assert_eq!(names(&people), vec!["Dee", "Ann"]);
}

#[test]
fn left_join_keeps_people_without_address() {
    let (mut repo, _) = household();
    let query = {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        let address = query.join(root.left_join("address", "a"));
        query.filter(address.field("city").ne("Oslo").or(address.field("city").is_null()));
        query.build().unwrap()
    };

    let people: Vec<Person> = repo.find_many(&query).unwrap();
    assert_eq!(names(&people), vec!["Bob", "Cid"]);
}

#[test]
fn to_many_join_matches_each_person_once() {
    let (mut repo, _) = household();
    let query = {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        let orders = query.join(root.join("orders", "o"));
        query.filter(orders.field("total").gt(400));
        query.build().unwrap()
    };

    let people: Vec<Person> = repo.find_many(&query).unwrap();
    assert_eq!(names(&people), vec!["Ann", "Cid"]);
    assert_eq!(repo.count(&query).unwrap(), 2);
}

#[test]
fn nested_join_through_order_customer() {
    let (mut repo, _) = household();
    let query = {
        let mut query = repo.criteria::<Order>().unwrap();
        let root = query.root();
        let customer = query.join(root.join("customer", "c"));
        let address = query.join(customer.join("address", "a"));
        query
            .filter(address.field("city").eq("Bergen"))
            .order_by(root.field("total").asc());
        query.build().unwrap()
    };

    let orders: Vec<Order> = repo.find_many(&query).unwrap();
    assert_eq!(orders.iter().map(|o| o.total).collect::<Vec<_>>(), vec![450]);
}

#[test]
fn fetch_does_not_change_the_result_set() {
    let (mut repo, _) = household();
    let query = {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        query
            .fetch(root.fetch("address"))
            .fetch(root.fetch_with("orders", JoinType::Left))
            .order_by(root.field("name").asc());
        query.build().unwrap()
    };

    let people: Vec<Person> = repo.find_many(&query).unwrap();
    assert_eq!(names(&people), vec!["Ann", "Bob", "Cid", "Dee"]);
}

#[test]
fn fetch_of_basic_attribute_is_rejected() {
    let (repo, _) = household();
    let mut query = repo.criteria::<Person>().unwrap();
    let root = query.root();
    query.fetch(root.fetch("name"));
    let err = query.build().unwrap_err();
    assert!(matches!(err, CoreError::InvalidJoin { .. }));
}

#[test]
fn unknown_paths_are_rejected() {
    let (repo, _) = household();

    let mut query = repo.criteria::<Person>().unwrap();
    let root = query.root();
    query.filter(root.field("shoe_size").gt(40));
    assert!(matches!(
        query.build().unwrap_err(),
        CoreError::UnknownAttribute { .. }
    ));

    let mut query = repo.criteria::<Person>().unwrap();
    let stray = query.root().join("address", "a");
    query.filter(stray.field("city").eq("Oslo"));
    assert!(matches!(query.build().unwrap_err(), CoreError::UnknownJoin { .. }));
}

#[test]
fn path_validation_can_be_disabled() {
    let (repo, _) = household();
    let mut repo = Repository::with_config(
        repo.into_session(),
        Config::default().validate_paths(false),
    );

    let query = {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        query.filter(root.field("shoe_size").is_null());
        query.build().unwrap()
    };
    let people: Vec<Person> = repo.find_many(&query).unwrap();
    assert_eq!(people.len(), 4);
}

#[test]
fn text_and_membership_predicates() {
    let (mut repo, household) = household();

    let query = {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        query.filter(root.field("email").ends_with("example.com"));
        query.build().unwrap()
    };
    let people: Vec<Person> = repo.find_many(&query).unwrap();
    assert_eq!(names(&people), vec!["Ann"]);

    let ids = [household.bob.id.unwrap(), household.dee.id.unwrap()];
    let query = {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        query.filter(root.id().is_in(ids));
        query.build().unwrap()
    };
    let people: Vec<Person> = repo.find_many(&query).unwrap();
    assert_eq!(names(&people), vec!["Bob", "Dee"]);

    let query = {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        query.filter(root.field("name").is_in(Vec::<String>::new()));
        query.build().unwrap()
    };
    assert!(repo.find_many::<Person>(&query).unwrap().is_empty());
}

#[test]
fn negation_and_ranges() {
    let (mut repo, _) = household();
    let query = {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        query
            .filter(root.field("age").between(30, 60))
            .filter(!root.field("name").starts_with("C"))
            .order_by(root.field("age").asc());
        query.build().unwrap()
    };
    let people: Vec<Person> = repo.find_many(&query).unwrap();
    assert_eq!(names(&people), vec!["Ann", "Dee"]);
}

#[test]
fn criteria_window_pages_ordered_results() {
    let (mut repo, _) = household();
    let query = {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        query
            .order_by(root.field("age").desc())
            .order_by(root.field("name").asc())
            .paginate(Some(2), Some(1));
        query.build().unwrap()
    };
    let people: Vec<Person> = repo.find_many(&query).unwrap();
    assert_eq!(names(&people), vec!["Ann", "Cid"]);
    assert_eq!(repo.count(&query).unwrap(), 4);
}

#[test]
fn pending_writes_are_visible_to_queries() {
    let (mut repo, _) = household();
    repo.save_or_update(Some(Person::new("Eve", 34)), None).unwrap();

    let query = {
        let mut query = repo.criteria::<Person>().unwrap();
        let root = query.root();
        query.filter(root.field("age").eq(34));
        query.build().unwrap()
    };
    assert_eq!(repo.count(&query).unwrap(), 3);

    repo.session_mut().rollback().unwrap();
    assert_eq!(repo.count(&query).unwrap(), 2);
}
