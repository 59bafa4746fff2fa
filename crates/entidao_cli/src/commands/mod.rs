//! CLI command implementations.

pub mod count;
pub mod find;
pub mod get;
pub mod list;

use crate::error::CliResult;
use crate::filter::{FilterArg, OrderArg};
use entidao_core::query::{Predicate, QueryDescriptor};
use entidao_core::{Entity, Repository, Session};
use serde::Serialize;
use std::fmt::Display;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// One line per entity.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Filters, orderings and window shared by the query commands.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct QueryArgs {
    /// Filter as PATH OP VALUE, e.g. `year>=1960` or `author.country=PL`
    #[arg(short = 'w', long = "where", value_name = "FILTER")]
    pub filters: Vec<FilterArg>,

    /// Sort key as PATH[:asc|:desc]; repeat for tie-breakers
    #[arg(short, long = "order", value_name = "ORDER")]
    pub orders: Vec<OrderArg>,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<i64>,

    /// Number of leading results to skip
    #[arg(long)]
    pub offset: Option<i64>,
}

impl QueryArgs {
    /// Assembles a descriptor for `T` from the arguments.
    pub fn build<T: Entity, S: Session>(&self, repo: &Repository<S>) -> CliResult<QueryDescriptor> {
        let mut query = repo.criteria::<T>()?;
        let root = query.root();
        let mut joins = Vec::new();

        let predicates: Vec<Predicate> = self
            .filters
            .iter()
            .map(|f| f.predicate(&root, &mut joins))
            .collect();
        let orders: Vec<_> = self
            .orders
            .iter()
            .map(|o| o.order(&root, &mut joins))
            .collect();

        for join in joins {
            query.join(join);
        }
        for predicate in predicates {
            query.filter(predicate);
        }
        for order in orders {
            query.order_by(order);
        }
        query.paginate(self.limit, self.offset);
        Ok(query.build()?)
    }
}

/// Prints entities in the requested format.
pub fn print_entities<T>(entities: &[T], format: Format) -> CliResult<()>
where
    T: Entity + Serialize + Display,
{
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(entities)?),
        Format::Text => {
            for entity in entities {
                match entity.id() {
                    Some(id) => println!("{id}  {entity}"),
                    None => println!("{entity}"),
                }
            }
        }
    }
    Ok(())
}
