//! # EntiDAO Codec
//!
//! Field values and canonical CBOR encoding for EntiDAO.
//!
//! Entities cross the session boundary as records: maps from field name to
//! [`Value`]. This crate provides that value model, the comparison rules
//! predicates and orderings rely on, and a deterministic CBOR encoding so
//! storage engines can keep detached snapshots of records.
//!
//! ## Usage
//!
//! ```
//! use entidao_codec::{to_canonical_cbor, from_cbor, Value};
//!
//! let record = Value::map(vec![
//!     (Value::from("name"), Value::from("Ada")),
//!     (Value::from("age"), Value::Integer(36)),
//! ]);
//! let bytes = to_canonical_cbor(&record).unwrap();
//! assert_eq!(from_cbor(&bytes).unwrap(), record);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod error;
mod value;

pub use cbor::{from_cbor, to_canonical_cbor};
pub use error::{CodecError, CodecResult};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            "[a-z]{0,12}".prop_map(Value::Text),
            prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
        ]
    }

    proptest! {
        #[test]
        fn encoding_is_deterministic(fields in prop::collection::btree_map("[a-z]{1,8}", scalar(), 0..8)) {
            let pairs: Vec<_> = fields
                .into_iter()
                .map(|(k, v)| (Value::Text(k), v))
                .collect();
            let mut reversed = pairs.clone();
            reversed.reverse();

            let a = to_canonical_cbor(&Value::map(pairs)).unwrap();
            let b = to_canonical_cbor(&Value::map(reversed)).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn sort_cmp_is_total(a in scalar(), b in scalar()) {
            prop_assert_eq!(a.sort_cmp(&b), b.sort_cmp(&a).reverse());
        }
    }
}
