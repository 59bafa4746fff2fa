//! CLI error type.

use entidao_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the `entidao` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// The dataset file could not be read.
    #[error("cannot read dataset {path}: {source}")]
    Io {
        /// Dataset path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The dataset is not valid JSON for the catalog model.
    #[error("invalid dataset: {0}")]
    Dataset(#[from] serde_json::Error),

    /// A book refers to an author key that the dataset does not define.
    #[error("book '{title}' refers to unknown author '{author}'")]
    UnknownAuthor {
        /// Book title.
        title: String,
        /// Missing author key.
        author: String,
    },

    /// Two authors share the same key.
    #[error("duplicate author key '{0}'")]
    DuplicateAuthor(String),

    /// The entity name on the command line is not part of the catalog.
    #[error("unknown entity '{0}', expected 'author' or 'book'")]
    UnknownEntity(String),

    /// A filter or ordering argument could not be parsed.
    #[error("invalid {kind} '{input}': {reason}")]
    InvalidArgument {
        /// What was being parsed.
        kind: &'static str,
        /// The offending argument.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The repository reported an error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CliError {
    /// Creates an invalid filter error.
    pub fn invalid_filter(input: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidArgument {
            kind: "filter",
            input: input.into(),
            reason,
        }
    }

    /// Creates an invalid ordering error.
    pub fn invalid_order(input: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidArgument {
            kind: "ordering",
            input: input.into(),
            reason,
        }
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
