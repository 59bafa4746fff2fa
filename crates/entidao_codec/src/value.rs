//! Dynamic field value type.

use std::cmp::Ordering;
use std::fmt;

/// A dynamic field value.
///
/// Entity records are flattened into maps of `Value`s before they cross
/// the session boundary, and predicates compare against `Value` literals.
/// Floats are intentionally not supported so that every value has a
/// deterministic encoding and a total order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (supports full i64 range).
    Integer(i64),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Text string (UTF-8).
    Text(String),
    /// Array of values.
    Array(Vec<Value>),
    /// Map of key-value pairs (keys are sorted for canonical encoding).
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Create a map value with sorted keys.
    ///
    /// Keys are sorted by their canonical CBOR encoding (length-first,
    /// then bytewise), so equal maps always encode to equal bytes.
    pub fn map(mut pairs: Vec<(Value, Value)>) -> Self {
        pairs.sort_by(|a, b| a.0.cmp_canonical(&b.0));
        Value::Map(pairs)
    }

    /// Compare two values by the order of their canonical encodings.
    ///
    /// Only used for map key ordering; query ordering uses [`Value::compare`].
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        let by_type = self.major_type().cmp(&other.major_type());
        if by_type != Ordering::Equal {
            return by_type;
        }

        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) if *a >= 0 => a.cmp(b),
            // Negative integers encode -1 - n, so -1 sorts before -2.
            (Value::Integer(a), Value::Integer(b)) => b.cmp(a),
            (Value::Bytes(a), Value::Bytes(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Value::Array(a), Value::Array(b)) => a.len().cmp(&b.len()).then_with(|| {
                a.iter()
                    .zip(b)
                    .map(|(x, y)| x.cmp_canonical(y))
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            }),
            (Value::Map(a), Value::Map(b)) => a.len().cmp(&b.len()).then_with(|| {
                a.iter()
                    .zip(b)
                    .map(|((ak, av), (bk, bv))| {
                        ak.cmp_canonical(bk).then_with(|| av.cmp_canonical(bv))
                    })
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            }),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Bool(_), Value::Null) => Ordering::Less,
            (Value::Null, Value::Bool(_)) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }

    /// Get the CBOR major type for this value.
    fn major_type(&self) -> u8 {
        match self {
            Value::Integer(n) if *n >= 0 => 0,
            Value::Integer(_) => 1,
            Value::Bytes(_) => 2,
            Value::Text(_) => 3,
            Value::Array(_) => 4,
            Value::Map(_) => 5,
            Value::Bool(_) | Value::Null => 7,
        }
    }

    /// Compare two values of the same kind.
    ///
    /// Returns `None` when the kinds differ, when either side is `Null`,
    /// or for maps, which have no query ordering. Text and bytes compare
    /// lexicographically, arrays element by element.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }

    /// Total order used for sorting query results.
    ///
    /// Nulls sort first, then values group by kind. Scalars of the same
    /// kind use [`Value::compare`]; arrays and maps compare element by
    /// element with `sort_cmp` itself, so mixed or null elements still
    /// order consistently.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.sort_cmp(y))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Value::Map(a), Value::Map(b)) => a
                .iter()
                .zip(b)
                .map(|((ak, av), (bk, bv))| ak.sort_cmp(bk).then_with(|| av.sort_cmp(bv)))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self
                .sort_rank()
                .cmp(&other.sort_rank())
                .then_with(|| self.compare(other).unwrap_or(Ordering::Equal)),
        }
    }

    fn sort_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) => 2,
            Value::Text(_) => 3,
            Value::Bytes(_) => 4,
            Value::Array(_) => 5,
            Value::Map(_) => 6,
        }
    }

    /// Human-readable name of this value's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as bytes, if it is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a map, if it is one.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a text key in this map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_text() == Some(key))
            .map(|(_, v)| v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_keys_are_sorted() {
        let map = Value::map(vec![
            (Value::from("zeta"), Value::Integer(1)),
            (Value::from("a"), Value::Integer(2)),
            (Value::from("mid"), Value::Integer(3)),
        ]);

        let keys: Vec<_> = map
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_text().unwrap())
            .collect();
        // Shorter keys first, then lexicographic.
        assert_eq!(keys, ["a", "mid", "zeta"]);
    }

    #[test]
    fn compare_same_kind() {
        assert_eq!(
            Value::Integer(3).compare(&Value::Integer(10)),
            Some(Ordering::Less)
        );
        // Query ordering is lexicographic, not canonical length-first.
        assert_eq!(
            Value::from("b").compare(&Value::from("abc")),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn compare_mixed_kinds_is_undefined() {
        assert_eq!(Value::Integer(1).compare(&Value::from("1")), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(Value::Null.compare(&Value::Integer(0)), None);
    }

    #[test]
    fn sort_cmp_puts_nulls_first() {
        let mut values = vec![
            Value::Integer(2),
            Value::Null,
            Value::Integer(-5),
            Value::Null,
        ];
        values.sort_by(Value::sort_cmp);
        assert_eq!(
            values,
            vec![Value::Null, Value::Null, Value::Integer(-5), Value::Integer(2)]
        );
    }

    #[test]
    fn sort_cmp_orders_mixed_arrays() {
        let one = Value::Array(vec![Value::Integer(1)]);
        let text = Value::Array(vec![Value::from("x")]);
        let two = Value::Array(vec![Value::Integer(2)]);
        let null = Value::Array(vec![Value::Null]);

        assert_eq!(one.sort_cmp(&text), Ordering::Less);
        assert_eq!(text.sort_cmp(&two), Ordering::Greater);
        assert_eq!(one.sort_cmp(&two), Ordering::Less);

        let mut values = vec![text.clone(), two.clone(), null.clone(), one.clone()];
        values.sort_by(Value::sort_cmp);
        assert_eq!(values, vec![null, one, two, text]);
    }

    #[test]
    fn array_compare_is_elementwise() {
        let a = Value::from(vec![1i64, 2]);
        let b = Value::from(vec![1i64, 3]);
        let c = Value::from(vec![1i64]);
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(c.compare(&a), Some(Ordering::Less));
    }

    #[test]
    fn map_get() {
        let map = Value::map(vec![
            (Value::from("name"), Value::from("Alice")),
            (Value::from("age"), Value::Integer(30)),
        ]);

        assert_eq!(map.get("name"), Some(&Value::from("Alice")));
        assert_eq!(map.get("age"), Some(&Value::Integer(30)));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn option_conversion() {
        assert_eq!(Value::from(Some(4i64)), Value::Integer(4));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn display() {
        let v = Value::from(vec![Value::from("x"), Value::Integer(1), Value::Null]);
        assert_eq!(v.to_string(), r#"["x", 1, null]"#);
    }
}
