//! Result materialization.
//!
//! Executes descriptors through a session and turns rows into entities,
//! reconciling the number of rows with what the caller asked for.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::query::{QueryDescriptor, ResultWindow};
use crate::session::{Row, Session};
use tracing::debug;

/// Rows fetched to decide between "one" and "more than one".
const AMBIGUITY_PROBE: u64 = 2;

/// Executes a single-result query.
///
/// Returns `Ok(None)` when nothing matches and the instance when exactly one
/// row does. At most two rows are requested from the session.
///
/// # Errors
///
/// - `AmbiguousResult` if more than one row matches
/// - `QueryTypeMismatch` if the descriptor selects a type other than `T`
pub fn fetch_one<T, S>(session: &mut S, query: &QueryDescriptor) -> CoreResult<Option<T>>
where
    T: Entity,
    S: Session + ?Sized,
{
    check_type::<T>(query)?;

    let window = query.window().limit(AMBIGUITY_PROBE);
    let probe = query.clone().with_window(window);
    let mut rows = session.execute(&probe)?;
    debug!(entity = %T::ENTITY_TYPE, rows = rows.len(), "fetch one");

    match rows.len() {
        0 => Ok(None),
        1 => {
            let Row { id, record } = rows.remove(0);
            T::from_record(id, &record).map(Some)
        }
        count => Err(CoreError::AmbiguousResult {
            entity: T::ENTITY_TYPE,
            count,
        }),
    }
}

/// Executes a multi-result query.
///
/// A bounded `window` replaces the descriptor's own window; an unbounded one
/// leaves it in place. No match yields an empty vector.
pub fn fetch_many<T, S>(
    session: &mut S,
    query: &QueryDescriptor,
    window: ResultWindow,
) -> CoreResult<Vec<T>>
where
    T: Entity,
    S: Session + ?Sized,
{
    check_type::<T>(query)?;

    let rows = if window.is_unbounded() {
        session.execute(query)?
    } else {
        session.execute(&query.clone().with_window(window))?
    };
    debug!(entity = %T::ENTITY_TYPE, %window, rows = rows.len(), "fetch many");

    rows.into_iter()
        .map(|Row { id, record }| T::from_record(id, &record))
        .collect()
}

/// Executes a query and returns its first row, if any, without checking
/// whether more rows match.
pub fn fetch_first<T, S>(session: &mut S, query: &QueryDescriptor) -> CoreResult<Option<T>>
where
    T: Entity,
    S: Session + ?Sized,
{
    check_type::<T>(query)?;

    let probe = query.clone().with_window(query.window().limit(1));
    let row = session.execute(&probe)?.into_iter().next();
    debug!(entity = %T::ENTITY_TYPE, found = row.is_some(), "fetch first");

    row.map(|Row { id, record }| T::from_record(id, &record))
        .transpose()
}

/// Counts the roots matching a query, ignoring its window.
pub fn count<S>(session: &mut S, query: &QueryDescriptor) -> CoreResult<u64>
where
    S: Session + ?Sized,
{
    let count = session.count(&query.clone().into_count())?;
    debug!(entity = %query.entity_type(), count, "count");
    Ok(count)
}

fn check_type<T: Entity>(query: &QueryDescriptor) -> CoreResult<()> {
    if query.entity_type() == T::ENTITY_TYPE {
        Ok(())
    } else {
        Err(CoreError::QueryTypeMismatch {
            expected: T::ENTITY_TYPE,
            actual: query.entity_type(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, Record};
    use crate::metamodel::{EntityMetadata, EntityType, Metamodel};
    use crate::query::{QueryAssembler, Root};
    use crate::session::fake::FakeSession;

    #[derive(Debug, PartialEq)]
    struct Tag {
        id: EntityId,
        label: String,
    }

    impl Entity for Tag {
        const ENTITY_TYPE: EntityType = EntityType::new("tag");

        fn metadata() -> EntityMetadata {
            EntityMetadata::new(Self::ENTITY_TYPE).basic("label")
        }

        fn id(&self) -> Option<EntityId> {
            Some(self.id)
        }

        fn assign_id(&mut self, id: EntityId) {
            self.id = id;
        }

        fn to_record(&self) -> Record {
            Record::new().with("label", self.label.as_str())
        }

        fn from_record(id: EntityId, record: &Record) -> CoreResult<Self> {
            Ok(Self {
                id,
                label: record.text("label")?.to_string(),
            })
        }
    }

    #[derive(Debug)]
    struct Other;

    impl Entity for Other {
        const ENTITY_TYPE: EntityType = EntityType::new("other");

        fn metadata() -> EntityMetadata {
            EntityMetadata::new(Self::ENTITY_TYPE)
        }

        fn id(&self) -> Option<EntityId> {
            None
        }

        fn assign_id(&mut self, _id: EntityId) {}

        fn to_record(&self) -> Record {
            Record::new()
        }

        fn from_record(_id: EntityId, _record: &Record) -> CoreResult<Self> {
            Ok(Other)
        }
    }

    fn session(labels: &[&str]) -> FakeSession {
        let metamodel = Metamodel::builder()
            .register::<Tag>()
            .register::<Other>()
            .build()
            .unwrap();
        let mut session = FakeSession::new(metamodel);
        for label in labels {
            session.insert(Tag::ENTITY_TYPE, Record::new().with("label", *label));
        }
        session
    }

    fn by_label(session: &FakeSession, label: &str) -> QueryDescriptor {
        let root = Root::of(&session.metamodel, Tag::ENTITY_TYPE).unwrap();
        QueryAssembler::new(&session.metamodel)
            .assemble(Tag::ENTITY_TYPE, [root.field("label").eq(label)], [], [], [])
            .unwrap()
    }

    #[test]
    fn fetch_one_cardinalities() {
        let mut session = session(&["red", "blue", "blue"]);

        let green = by_label(&session, "green");
        let red = by_label(&session, "red");
        let blue = by_label(&session, "blue");

        let none: Option<Tag> = fetch_one(&mut session, &green).unwrap();
        assert!(none.is_none());

        let one: Option<Tag> = fetch_one(&mut session, &red).unwrap();
        assert_eq!(one.unwrap().label, "red");

        let err = fetch_one::<Tag, _>(&mut session, &blue).unwrap_err();
        assert!(matches!(err, CoreError::AmbiguousResult { count: 2, .. }));
    }

    #[test]
    fn fetch_one_probes_at_most_two_rows() {
        let mut session = session(&["a", "a", "a", "a"]);
        let query = by_label(&session, "a");
        let _ = fetch_one::<Tag, _>(&mut session, &query);
        assert_eq!(session.executed, vec![ResultWindow::new(Some(2), None)]);
    }

    #[test]
    fn fetch_many_window_overrides_descriptor() {
        let mut session = session(&["a", "b", "c", "d"]);
        let query = QueryAssembler::new(&session.metamodel)
            .select_all(Tag::ENTITY_TYPE)
            .unwrap()
            .paginate(Some(1), None);

        let tags: Vec<Tag> = fetch_many(&mut session, &query, ResultWindow::UNBOUNDED).unwrap();
        assert_eq!(tags.len(), 1);

        let tags: Vec<Tag> =
            fetch_many(&mut session, &query, ResultWindow::new(Some(2), Some(1))).unwrap();
        let labels: Vec<_> = tags.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "c"]);
    }

    #[test]
    fn fetch_many_empty() {
        let mut session = session(&[]);
        let query = by_label(&session, "x");
        let tags: Vec<Tag> = fetch_many(&mut session, &query, ResultWindow::UNBOUNDED).unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn fetch_first_ignores_ambiguity() {
        let mut session = session(&["a", "a"]);
        let query = by_label(&session, "a");
        let first: Option<Tag> = fetch_first(&mut session, &query).unwrap();
        assert!(first.is_some());
    }

    #[test]
    fn type_mismatch() {
        let mut session = session(&["a"]);
        let query = by_label(&session, "a");
        let err = fetch_many::<Other, _>(&mut session, &query, ResultWindow::UNBOUNDED)
            .unwrap_err();
        assert!(matches!(err, CoreError::QueryTypeMismatch { .. }));
    }

    #[test]
    fn count_needs_backend_support() {
        let mut session = session(&["a"]);
        let query = by_label(&session, "a");
        let err = count(&mut session, &query).unwrap_err();
        assert!(matches!(err, CoreError::Unimplemented { operation: "count" }));
    }
}
