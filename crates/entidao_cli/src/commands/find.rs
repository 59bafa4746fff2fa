//! Find command implementation.

use super::{print_entities, Format, QueryArgs};
use crate::error::CliResult;
use entidao_core::{Entity, Repository, Session};
use serde::Serialize;
use std::fmt::Display;

/// How many results the caller expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cardinality {
    /// Every match inside the window.
    #[default]
    Many,
    /// At most one match; more is an error.
    One,
    /// The first match under the ordering.
    First,
}

/// Executes a criteria query for `T`.
pub fn query<T: Entity, S: Session>(
    repo: &mut Repository<S>,
    args: &QueryArgs,
    cardinality: Cardinality,
) -> CliResult<Vec<T>> {
    let descriptor = args.build::<T, S>(repo)?;
    let found = match cardinality {
        Cardinality::Many => repo.find_many::<T>(&descriptor)?,
        Cardinality::One => repo.find_one::<T>(&descriptor)?.into_iter().collect(),
        Cardinality::First => repo.find_first::<T>(&descriptor)?.into_iter().collect(),
    };
    Ok(found)
}

/// Runs the find command.
pub fn run<T, S>(
    repo: &mut Repository<S>,
    args: &QueryArgs,
    cardinality: Cardinality,
    format: Format,
) -> CliResult<()>
where
    T: Entity + Serialize + Display,
    S: Session,
{
    let found = query::<T, S>(repo, args, cardinality)?;
    print_entities(&found, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_store;
    use crate::catalog::{Author, Book};
    use crate::error::CliError;
    use entidao_core::CoreError;

    fn args(filters: &[&str], orders: &[&str]) -> QueryArgs {
        QueryArgs {
            filters: filters.iter().map(|f| f.parse().unwrap()).collect(),
            orders: orders.iter().map(|o| o.parse().unwrap()).collect(),
            ..QueryArgs::default()
        }
    }

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn filters_and_orders() {
        let mut repo = Repository::new(sample_store().session());
        let books: Vec<Book> = query(
            &mut repo,
            &args(&["author.name^=Ursula"], &["year:desc"]),
            Cardinality::Many,
        )
        .unwrap();
        assert_eq!(titles(&books), vec!["The Dispossessed", "A Wizard of Earthsea"]);
    }

    #[test]
    fn ordering_by_relationship_keeps_orphans() {
        let mut repo = Repository::new(sample_store().session());
        let books: Vec<Book> =
            query(&mut repo, &args(&[], &["author.name", "year"]), Cardinality::Many).unwrap();
        assert_eq!(
            titles(&books),
            vec![
                "Beowulf",
                "Solaris",
                "The Cyberiad",
                "A Wizard of Earthsea",
                "The Dispossessed"
            ]
        );
    }

    #[test]
    fn window_after_ordering() {
        let mut repo = Repository::new(sample_store().session());
        let mut args = args(&[], &["year"]);
        args.limit = Some(2);
        args.offset = Some(1);
        let books: Vec<Book> = query(&mut repo, &args, Cardinality::Many).unwrap();
        assert_eq!(titles(&books), vec!["Solaris", "The Cyberiad"]);
    }

    #[test]
    fn cardinalities() {
        let mut repo = Repository::new(sample_store().session());

        let one: Vec<Author> =
            query(&mut repo, &args(&["country=PL"], &[]), Cardinality::One).unwrap();
        assert_eq!(one.len(), 1);

        let none: Vec<Author> =
            query(&mut repo, &args(&["country=FR"], &[]), Cardinality::One).unwrap();
        assert!(none.is_empty());

        let err = query::<Book, _>(&mut repo, &args(&["year>1900"], &[]), Cardinality::One)
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(CoreError::AmbiguousResult { count: 2, .. })
        ));

        let first: Vec<Book> = query(
            &mut repo,
            &args(&["year>1900"], &["year:desc"]),
            Cardinality::First,
        )
        .unwrap();
        assert_eq!(titles(&first), vec!["The Dispossessed"]);
    }
}
