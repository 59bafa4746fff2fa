//! Error types for EntiDAO core.

use crate::entity::EntityId;
use crate::metamodel::EntityType;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in repository and query operations.
///
/// A missing identity is never an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Record codec error.
    #[error("codec error: {0}")]
    Codec(#[from] entidao_codec::CodecError),

    /// The entity type is not registered in the session's metamodel.
    #[error("unknown entity type: {name}")]
    UnknownEntityType {
        /// Name of the entity type.
        name: String,
    },

    /// A single-result query matched more than one row.
    #[error("expected at most one row, found {count} or more (entity {entity})")]
    AmbiguousResult {
        /// Entity type the query targeted.
        entity: EntityType,
        /// Number of rows observed before giving up.
        count: usize,
    },

    /// Delete requested on an instance the session does not manage.
    #[error("{entity} instance {} is not managed by the session", display_id(.id))]
    NotPersistent {
        /// Entity type of the instance.
        entity: EntityType,
        /// Identity of the instance, if it has one.
        id: Option<EntityId>,
    },

    /// The instance was removed earlier in this session.
    #[error("{entity} instance {id} was removed and cannot be reattached")]
    Removed {
        /// Entity type of the instance.
        entity: EntityType,
        /// Identity of the removed instance.
        id: EntityId,
    },

    /// The backend does not support the operation.
    #[error("operation not supported by this session: {operation}")]
    Unimplemented {
        /// Name of the unsupported operation.
        operation: &'static str,
    },

    /// A field path names an attribute the entity does not declare.
    #[error("unknown attribute {attribute} on {entity}")]
    UnknownAttribute {
        /// Entity type that was searched.
        entity: EntityType,
        /// Attribute name.
        attribute: String,
    },

    /// A field path refers to a join alias the query does not declare.
    #[error("unknown join alias: {alias}")]
    UnknownJoin {
        /// The alias that was not found.
        alias: String,
    },

    /// A join or fetch does not traverse a relationship.
    #[error("invalid join on {entity}.{attribute}: {reason}")]
    InvalidJoin {
        /// Entity type that owns the attribute.
        entity: EntityType,
        /// The attribute being joined.
        attribute: String,
        /// Why the join was rejected.
        reason: String,
    },

    /// A create was requested for an instance that already has an identity.
    #[error("{entity} instance already has identity {id}")]
    IdentityAssigned {
        /// Entity type of the instance.
        entity: EntityType,
        /// Identity the instance carries.
        id: EntityId,
    },

    /// An update identity disagrees with the instance's own identity.
    #[error("identity mismatch for {entity}: instance has {actual}, update targets {expected}")]
    IdentityMismatch {
        /// Entity type of the instance.
        entity: EntityType,
        /// Identity passed to the update.
        expected: EntityId,
        /// Identity carried by the instance.
        actual: EntityId,
    },

    /// A query descriptor was executed for a different entity type.
    #[error("query targets {actual}, expected {expected}")]
    QueryTypeMismatch {
        /// Entity type the caller asked for.
        expected: EntityType,
        /// Entity type the descriptor selects.
        actual: EntityType,
    },

    /// A record could not be mapped to or from an entity.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the problem.
        message: String,
    },

    /// The session has been closed.
    #[error("session is closed")]
    SessionClosed,

    /// Failure inside the storage engine behind the session.
    #[error("storage engine error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn display_id(id: &Option<EntityId>) -> String {
    id.map_or_else(|| "<transient>".to_string(), |id| id.to_string())
}

impl CoreError {
    /// Creates an unknown entity type error.
    pub fn unknown_entity_type(entity_type: EntityType) -> Self {
        Self::UnknownEntityType {
            name: entity_type.name().to_string(),
        }
    }

    /// Creates a not persistent error.
    pub fn not_persistent(entity: EntityType, id: Option<EntityId>) -> Self {
        Self::NotPersistent { entity, id }
    }

    /// Creates an unknown attribute error.
    pub fn unknown_attribute(entity: EntityType, attribute: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            entity,
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid join error.
    pub fn invalid_join(
        entity: EntityType,
        attribute: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidJoin {
            entity,
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Wraps a storage engine error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }

    /// Returns true for errors caused by how the query was specified
    /// rather than by the data or the engine.
    #[must_use]
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownEntityType { .. }
                | Self::UnknownAttribute { .. }
                | Self::UnknownJoin { .. }
                | Self::InvalidJoin { .. }
                | Self::QueryTypeMismatch { .. }
        )
    }
}
