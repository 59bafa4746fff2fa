//! Field maps exchanged with the session.

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use entidao_codec::{from_cbor, to_canonical_cbor, Value};
use std::collections::BTreeMap;

/// The flattened state of an entity instance.
///
/// A record maps field names to [`Value`]s. The identity is carried next to
/// the record (see [`crate::session::Row`]) and never inside it; storage
/// engines add it back when they resolve the identity field of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns a field value, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns a field value, treating a missing field as `Null`.
    #[must_use]
    pub fn value(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or(Value::Null)
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reads a required text field.
    pub fn text(&self, name: &str) -> CoreResult<&str> {
        self.get(name)
            .and_then(Value::as_text)
            .ok_or_else(|| CoreError::invalid_record(format!("missing text field {name}")))
    }

    /// Reads a required integer field.
    pub fn integer(&self, name: &str) -> CoreResult<i64> {
        self.get(name)
            .and_then(Value::as_integer)
            .ok_or_else(|| CoreError::invalid_record(format!("missing integer field {name}")))
    }

    /// Reads an optional text field; `Null` and absent both map to `None`.
    pub fn optional_text(&self, name: &str) -> CoreResult<Option<String>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s.clone())),
            Some(other) => Err(CoreError::invalid_record(format!(
                "field {name} is {}, expected text",
                other.kind()
            ))),
        }
    }

    /// Reads an optional reference to another entity.
    pub fn reference(&self, name: &str) -> CoreResult<Option<EntityId>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => EntityId::from_value(value).map(Some).ok_or_else(|| {
                CoreError::invalid_record(format!("field {name} is not an entity reference"))
            }),
        }
    }

    /// Converts the record to a map value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::map(
            self.fields
                .iter()
                .map(|(k, v)| (Value::Text(k.clone()), v.clone()))
                .collect(),
        )
    }

    /// Builds a record from a map value with text keys.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        let Value::Map(pairs) = value else {
            return Err(CoreError::invalid_record(format!(
                "expected map, found {}",
                value.kind()
            )));
        };

        let mut fields = BTreeMap::new();
        for (key, value) in pairs {
            let Value::Text(name) = key else {
                return Err(CoreError::invalid_record("record keys must be text"));
            };
            fields.insert(name, value);
        }
        Ok(Self { fields })
    }

    /// Encodes the record to canonical CBOR bytes.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        Ok(to_canonical_cbor(&self.to_value())?)
    }

    /// Decodes a record from CBOR bytes.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        Self::from_value(from_cbor(bytes)?)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_reads_as_null() {
        let record = Record::new().with("name", "Ada");
        assert_eq!(record.value("age"), Value::Null);
        assert_eq!(record.value("name"), Value::from("Ada"));
    }

    #[test]
    fn typed_accessors() {
        let owner = EntityId::new();
        let record = Record::new()
            .with("name", "Ada")
            .with("age", 36i64)
            .with("nickname", Value::Null)
            .with("owner", owner);

        assert_eq!(record.text("name").unwrap(), "Ada");
        assert_eq!(record.integer("age").unwrap(), 36);
        assert_eq!(record.optional_text("nickname").unwrap(), None);
        assert_eq!(record.reference("owner").unwrap(), Some(owner));
        assert!(record.integer("name").is_err());
        assert!(record.optional_text("age").is_err());
    }

    #[test]
    fn encode_decode() {
        let record: Record = [("city", Value::from("Oslo")), ("zip", Value::Integer(150))]
            .into_iter()
            .collect();
        let bytes = record.encode().unwrap();
        assert_eq!(Record::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn from_value_rejects_non_maps() {
        assert!(Record::from_value(Value::Integer(1)).is_err());
        let bad_key = Value::Map(vec![(Value::Integer(1), Value::Null)]);
        assert!(Record::from_value(bad_key).is_err());
    }
}
