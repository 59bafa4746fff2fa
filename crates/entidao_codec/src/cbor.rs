//! Canonical CBOR encoding and decoding.
//!
//! Values are bridged to `ciborium`'s value model, which always writes
//! definite lengths and shortest-form integers. Map keys are ordered by
//! [`Value::map`] before encoding, which completes the canonical form.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use ciborium::value::{Integer, Value as Cbor};

/// Encode a value to canonical CBOR bytes.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn to_canonical_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(&to_cbor(value), &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buffer)
}

/// Decode a single value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid CBOR, contain floats or
/// tags, hold integers outside the `i64` range, or carry trailing bytes.
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    let mut reader = bytes;
    let decoded: Cbor = ciborium::de::from_reader(&mut reader)
        .map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes {
            remaining: reader.len(),
        });
    }
    from_cbor_value(decoded)
}

fn to_cbor(value: &Value) -> Cbor {
    match value {
        Value::Null => Cbor::Null,
        Value::Bool(b) => Cbor::Bool(*b),
        Value::Integer(n) => Cbor::Integer(Integer::from(*n)),
        Value::Bytes(b) => Cbor::Bytes(b.clone()),
        Value::Text(s) => Cbor::Text(s.clone()),
        Value::Array(items) => Cbor::Array(items.iter().map(to_cbor).collect()),
        Value::Map(pairs) => {
            let mut pairs = pairs.clone();
            pairs.sort_by(|a, b| a.0.cmp_canonical(&b.0));
            Cbor::Map(
                pairs
                    .iter()
                    .map(|(k, v)| (to_cbor(k), to_cbor(v)))
                    .collect(),
            )
        }
    }
}

fn from_cbor_value(value: Cbor) -> CodecResult<Value> {
    Ok(match value {
        Cbor::Null => Value::Null,
        Cbor::Bool(b) => Value::Bool(b),
        Cbor::Integer(n) => Value::Integer(i64::try_from(n).map_err(|_| CodecError::IntegerOverflow)?),
        Cbor::Bytes(b) => Value::Bytes(b),
        Cbor::Text(s) => Value::Text(s),
        Cbor::Float(_) => return Err(CodecError::FloatForbidden),
        Cbor::Tag(tag, _) => return Err(CodecError::unsupported_type(format!("tag {tag}"))),
        Cbor::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_cbor_value)
                .collect::<CodecResult<_>>()?,
        ),
        Cbor::Map(pairs) => Value::map(
            pairs
                .into_iter()
                .map(|(k, v)| Ok((from_cbor_value(k)?, from_cbor_value(v)?)))
                .collect::<CodecResult<_>>()?,
        ),
        other => return Err(CodecError::unsupported_type(format!("{other:?}"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_integers_use_shortest_form() {
        assert_eq!(to_canonical_cbor(&Value::Integer(0)).unwrap(), [0x00]);
        assert_eq!(to_canonical_cbor(&Value::Integer(23)).unwrap(), [0x17]);
        assert_eq!(to_canonical_cbor(&Value::Integer(24)).unwrap(), [0x18, 24]);
        assert_eq!(to_canonical_cbor(&Value::Integer(-1)).unwrap(), [0x20]);
    }

    #[test]
    fn map_encoding_ignores_insertion_order() {
        let a = Value::Map(vec![
            (Value::from("name"), Value::from("Ada")),
            (Value::from("id"), Value::Integer(7)),
        ]);
        let b = Value::Map(vec![
            (Value::from("id"), Value::Integer(7)),
            (Value::from("name"), Value::from("Ada")),
        ]);
        assert_eq!(to_canonical_cbor(&a).unwrap(), to_canonical_cbor(&b).unwrap());
    }

    #[test]
    fn nested_record_survives_encoding() {
        let record = Value::map(vec![
            (Value::from("tags"), Value::from(vec!["a", "b"])),
            (Value::from("owner"), Value::Null),
            (Value::from("score"), Value::Integer(-40)),
            (Value::from("raw"), Value::Bytes(vec![0xde, 0xad])),
        ]);
        let bytes = to_canonical_cbor(&record).unwrap();
        assert_eq!(from_cbor(&bytes).unwrap(), record);
    }

    #[test]
    fn floats_are_rejected() {
        // 0xf9 = half-precision float, value 1.0
        let result = from_cbor(&[0xf9, 0x3c, 0x00]);
        assert_eq!(result, Err(CodecError::FloatForbidden));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let result = from_cbor(&[0x01, 0x02]);
        assert_eq!(result, Err(CodecError::TrailingBytes { remaining: 1 }));
    }

    #[test]
    fn truncated_input_fails() {
        // Text of length 5 with only two bytes present.
        let result = from_cbor(&[0x65, b'h', b'i']);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }
}
