//! Entity identity.

use entidao_codec::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an entity instance.
///
/// Entity IDs are 128-bit UUIDs that are:
/// - Unique within their entity type's extent
/// - Immutable once assigned
/// - Opaque to the repository layer
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId([u8; 16]);

impl EntityId {
    /// Creates an entity ID from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Creates a new random entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().into_bytes())
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Converts to a UUID.
    #[must_use]
    pub fn to_uuid(&self) -> Uuid {
        Uuid::from_bytes(self.0)
    }

    /// Reads an identity stored in a record field.
    ///
    /// Accepts a 16-byte string or a UUID in text form.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(bytes) => <[u8; 16]>::try_from(bytes.as_slice()).ok().map(Self),
            Value::Text(text) => text.parse().ok(),
            _ => None,
        }
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.to_uuid())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uuid())
    }
}

impl FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.into_bytes())
    }
}

impl From<EntityId> for Uuid {
    fn from(id: EntityId) -> Self {
        id.to_uuid()
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::Bytes(id.0.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
    }

    #[test]
    fn value_roundtrip() {
        let id = EntityId::new();
        let value = Value::from(id);
        assert_eq!(EntityId::from_value(&value), Some(id));
    }

    #[test]
    fn from_text_value() {
        let id = EntityId::new();
        let value = Value::Text(id.to_string());
        assert_eq!(EntityId::from_value(&value), Some(id));
    }

    #[test]
    fn from_value_rejects_other_shapes() {
        assert_eq!(EntityId::from_value(&Value::Bytes(vec![0; 15])), None);
        assert_eq!(EntityId::from_value(&Value::Integer(16)), None);
        assert_eq!(EntityId::from_value(&Value::from("not-a-uuid")), None);
    }

    #[test]
    fn parse_display_agree() {
        let id = EntityId::from_bytes([7; 16]);
        let parsed: EntityId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
