//! Get command implementation.

use super::{print_entities, Format};
use crate::error::CliResult;
use entidao_core::{Entity, EntityId, Repository, Session};
use serde::Serialize;
use std::fmt::Display;

/// Runs the get command and reports whether the instance exists.
pub fn run<T, S>(repo: &mut Repository<S>, id: EntityId, format: Format) -> CliResult<bool>
where
    T: Entity + Serialize + Display,
    S: Session,
{
    match repo.get::<T>(id)? {
        Some(entity) => {
            print_entities(std::slice::from_ref(&entity), format)?;
            Ok(true)
        }
        None => {
            eprintln!("no {} with id {id}", T::ENTITY_TYPE);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_store;
    use crate::catalog::Author;

    #[test]
    fn found_and_missing() {
        let mut repo = Repository::new(sample_store().session());
        let first = repo.get_all::<Author>().unwrap().remove(0);

        assert!(run::<Author, _>(&mut repo, first.id.unwrap(), Format::Json).unwrap());
        assert!(!run::<Author, _>(&mut repo, EntityId::new(), Format::Text).unwrap());
    }
}
