//! Count command implementation.

use super::QueryArgs;
use crate::error::CliResult;
use entidao_core::{Entity, Repository, Session};

/// Counts the instances of `T` matching the filters; the window is ignored.
pub fn query<T: Entity, S: Session>(repo: &mut Repository<S>, args: &QueryArgs) -> CliResult<u64> {
    let descriptor = args.build::<T, S>(repo)?;
    Ok(repo.count(&descriptor)?)
}

/// Runs the count command.
pub fn run<T: Entity, S: Session>(repo: &mut Repository<S>, args: &QueryArgs) -> CliResult<()> {
    println!("{}", query::<T, S>(repo, args)?);
    Ok(())
}
