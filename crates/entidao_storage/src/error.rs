//! Error types for the in-memory engine.

use entidao_core::CoreError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by the store itself.
///
/// Session operations report these as [`CoreError::Storage`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// A commit would grow an extent past the configured size.
    #[error("extent {entity} would hold {size} instances, limit is {limit}")]
    ExtentFull {
        /// Entity type of the extent.
        entity: String,
        /// Size the extent would have reached.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        CoreError::storage(err)
    }
}
