//! EntiDAO CLI
//!
//! Loads a book catalog from a JSON dataset into an in-memory store and
//! queries it through the repository facade.
//!
//! # Commands
//!
//! - `list` - List authors or books in load order
//! - `get` - Look up one instance by identity
//! - `find` - Run a criteria query with filters, orderings and a window
//! - `count` - Count the instances matching filters

mod catalog;
mod commands;
mod error;
mod filter;

use catalog::{Author, Book, Dataset, Kind};
use clap::{Parser, Subcommand};
use commands::find::Cardinality;
use commands::{Format, QueryArgs};
use entidao_core::{Config, EntityId, Repository};
use error::CliResult;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// EntiDAO command-line catalog browser.
#[derive(Parser)]
#[command(name = "entidao")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON dataset
    #[arg(global = true, short, long)]
    data: Option<PathBuf>,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Cap on rows returned by any read (0 for no cap)
    #[arg(global = true, long)]
    max_rows: Option<u64>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List authors or books in load order
    List {
        /// Entity to list
        #[arg(value_enum)]
        kind: Kind,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<i64>,

        /// Number of leading results to skip
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Look up one instance by identity
    Get {
        /// Entity to look up
        #[arg(value_enum)]
        kind: Kind,

        /// Identity (UUID)
        id: EntityId,
    },

    /// Run a criteria query
    Find {
        /// Entity to query
        #[arg(value_enum)]
        kind: Kind,

        #[command(flatten)]
        query: QueryArgs,

        /// Expect at most one result
        #[arg(long, conflicts_with = "first")]
        one: bool,

        /// Return only the first result
        #[arg(long)]
        first: bool,
    },

    /// Count the instances matching filters
    Count {
        /// Entity to count
        #[arg(value_enum)]
        kind: Kind,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

/// Dispatches a command; `Ok(false)` means the command found nothing to
/// report where something was expected.
fn run(cli: Cli) -> CliResult<bool> {
    if matches!(cli.command, Commands::Version) {
        println!("EntiDAO CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(true);
    }

    let dataset = match &cli.data {
        Some(path) => Dataset::read(path)?,
        None => Dataset::default(),
    };
    let store = dataset.load()?;
    let config = Config::default()
        .max_rows_limit(cli.max_rows)
        .log_queries(cli.verbose);
    let mut repo = Repository::with_config(store.session(), config);
    let format = cli.format;

    match cli.command {
        Commands::List {
            kind,
            limit,
            offset,
        } => match kind {
            Kind::Author => commands::list::run::<Author, _>(&mut repo, limit, offset, format)?,
            Kind::Book => commands::list::run::<Book, _>(&mut repo, limit, offset, format)?,
        },
        Commands::Get { kind, id } => {
            return match kind {
                Kind::Author => commands::get::run::<Author, _>(&mut repo, id, format),
                Kind::Book => commands::get::run::<Book, _>(&mut repo, id, format),
            };
        }
        Commands::Find {
            kind,
            query,
            one,
            first,
        } => {
            let cardinality = if one {
                Cardinality::One
            } else if first {
                Cardinality::First
            } else {
                Cardinality::Many
            };
            match kind {
                Kind::Author => {
                    commands::find::run::<Author, _>(&mut repo, &query, cardinality, format)?
                }
                Kind::Book => {
                    commands::find::run::<Book, _>(&mut repo, &query, cardinality, format)?
                }
            }
        }
        Commands::Count { kind, query } => match kind {
            Kind::Author => commands::count::run::<Author, _>(&mut repo, &query)?,
            Kind::Book => commands::count::run::<Book, _>(&mut repo, &query)?,
        },
        Commands::Version => {}
    }
    Ok(true)
}
