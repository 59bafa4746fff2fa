//! Store configuration.

/// Configuration for a [`crate::MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of instances per entity type; `None` is unlimited.
    ///
    /// Checked when a session commits.
    pub max_extent_size: Option<usize>,
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum extent size.
    #[must_use]
    pub const fn max_extent_size(mut self, limit: Option<usize>) -> Self {
        self.max_extent_size = limit;
        self
    }
}
