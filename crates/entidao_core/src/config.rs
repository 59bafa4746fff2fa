//! Repository configuration.

/// Configuration for a [`crate::Repository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether the assembler checks every field path against the metamodel.
    pub validate_paths: bool,

    /// Upper bound applied to every result window the facade issues.
    ///
    /// `None` or `Some(0)` leaves unbounded queries unbounded.
    pub max_rows_limit: Option<u64>,

    /// Whether every executed descriptor is logged at `debug` level.
    pub log_queries: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validate_paths: true,
            max_rows_limit: None,
            log_queries: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether field paths are validated during assembly.
    #[must_use]
    pub const fn validate_paths(mut self, value: bool) -> Self {
        self.validate_paths = value;
        self
    }

    /// Sets the row limit applied to every query window. A limit of 0
    /// means no limit.
    #[must_use]
    pub const fn max_rows_limit(mut self, limit: Option<u64>) -> Self {
        self.max_rows_limit = match limit {
            Some(0) => None,
            limit => limit,
        };
        self
    }

    /// Sets whether executed descriptors are logged.
    #[must_use]
    pub const fn log_queries(mut self, value: bool) -> Self {
        self.log_queries = value;
        self
    }
}
