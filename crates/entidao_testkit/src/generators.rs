//! Property-based test generators using proptest.
//!
//! Provides strategies for generating fixture entities, windows and field
//! values that keep the invariants the repository relies on.

use crate::fixtures::Person;
use entidao_codec::Value;
use entidao_core::EntityId;
use proptest::prelude::*;

/// Strategy for generating entity IDs.
pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    prop::array::uniform16(any::<u8>()).prop_map(EntityId::from_bytes)
}

/// Strategy for generating person names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{1,11}").expect("Invalid regex")
}

/// Strategy for generating transient people.
pub fn person_strategy() -> impl Strategy<Value = Person> {
    (
        name_strategy(),
        0i64..120,
        prop::option::of("[a-z]{1,8}@example\\.com"),
    )
        .prop_map(|(name, age, email)| {
            let person = Person::new(name, age);
            match email {
                Some(email) => person.with_email(email),
                None => person,
            }
        })
}

/// Strategy for generating a batch of transient people.
pub fn people_strategy(max: usize) -> impl Strategy<Value = Vec<Person>> {
    prop::collection::vec(person_strategy(), 0..=max)
}

/// Strategy for generating raw `(max_rows, from_row)` window bounds,
/// including zero and negative values.
pub fn window_bounds_strategy() -> impl Strategy<Value = (Option<i64>, Option<i64>)> {
    (prop::option::of(-3i64..20), prop::option::of(-3i64..20))
}

/// Strategy for generating scalar field values of every kind.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        "[a-z]{0,8}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn person_strategy_generates_transient_people() {
        let mut runner = TestRunner::default();
        for _ in 0..32 {
            let person = person_strategy()
                .new_tree(&mut runner)
                .unwrap()
                .current();
            assert!(person.id.is_none());
            assert!((0..120).contains(&person.age));
        }
    }

    #[test]
    fn entity_ids_are_generated() {
        let mut runner = TestRunner::default();
        let id = entity_id_strategy().new_tree(&mut runner).unwrap().current();
        assert_eq!(EntityId::from_bytes(*id.as_bytes()), id);
    }
}
