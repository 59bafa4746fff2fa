//! List command implementation.

use super::{print_entities, Format};
use crate::error::CliResult;
use entidao_core::{Entity, Repository, Session};
use serde::Serialize;
use std::fmt::Display;

/// Returns a window of all instances of `T` in load order.
pub fn query<T: Entity, S: Session>(
    repo: &mut Repository<S>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> CliResult<Vec<T>> {
    Ok(repo.get_all_windowed::<T>(limit, offset)?)
}

/// Runs the list command.
pub fn run<T, S>(
    repo: &mut Repository<S>,
    limit: Option<i64>,
    offset: Option<i64>,
    format: Format,
) -> CliResult<()>
where
    T: Entity + Serialize + Display,
    S: Session,
{
    let entities = query::<T, S>(repo, limit, offset)?;
    print_entities(&entities, format)
}
