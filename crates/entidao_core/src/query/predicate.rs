//! Composable filter conditions.
//!
//! Predicates are plain values: building one never touches the session.
//! Storage engines interpret them through [`Predicate::evaluate`], which uses
//! three-valued logic. A comparison involving `Null`, or values of different
//! kinds, is unknown; a row matches only when the whole predicate is
//! definitely true.

use crate::query::path::FieldPath;
use entidao_codec::Value;
use std::cmp::Ordering;
use std::fmt;
use std::mem::discriminant;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
            Self::Gt => ord == Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
        }
    }
}

/// Text matching operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextOp {
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
    /// Substring match.
    Contains,
}

impl TextOp {
    fn matches(self, text: &str, pattern: &str) -> bool {
        match self {
            Self::StartsWith => text.starts_with(pattern),
            Self::EndsWith => text.ends_with(pattern),
            Self::Contains => text.contains(pattern),
        }
    }
}

/// Supplies field values while a predicate is evaluated.
pub trait FieldResolver {
    /// Returns the value at `path`, or `Null` when there is none.
    fn resolve(&self, path: &FieldPath) -> Value;
}

/// A boolean condition over entity fields.
///
/// # Example
///
/// ```rust
/// use entidao_core::query::{Field, FieldPath, Predicate};
///
/// let age = Field::new(FieldPath::root("age"));
/// let name = Field::new(FieldPath::root("name"));
///
/// let adults_named_a = Predicate::all([age.ge(18), name.starts_with("A")]);
/// assert_eq!(adults_named_a.to_string(), "root.age >= 18 AND root.name STARTS WITH \"A\"");
/// assert!(Predicate::all(std::iter::empty()).is_true());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// Matches every row.
    True,
    /// `path op value`
    Compare {
        /// Field being compared.
        path: FieldPath,
        /// Operator.
        op: CompareOp,
        /// Literal on the right-hand side.
        value: Value,
    },
    /// `path IN (values)`
    In {
        /// Field being tested.
        path: FieldPath,
        /// Candidate values.
        values: Vec<Value>,
    },
    /// `path IS NULL`
    IsNull(FieldPath),
    /// `path IS NOT NULL`
    IsNotNull(FieldPath),
    /// Text match on a field.
    Text {
        /// Field being tested.
        path: FieldPath,
        /// Operator.
        op: TextOp,
        /// Pattern text.
        pattern: String,
    },
    /// Conjunction; empty is true.
    And(Vec<Predicate>),
    /// Disjunction; empty is false.
    Or(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Combines predicates with AND.
    ///
    /// Nested conjunctions are flattened and `True` operands dropped, so the
    /// result does not depend on how the inputs were grouped. No operands
    /// yields [`Predicate::True`].
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let mut operands = Vec::new();
        for predicate in predicates {
            match predicate {
                Self::True => {}
                Self::And(inner) => operands.extend(inner),
                other => operands.push(other),
            }
        }
        match operands.len() {
            0 => Self::True,
            1 => operands.remove(0),
            _ => Self::And(operands),
        }
    }

    /// Combines predicates with OR, flattening nested disjunctions.
    ///
    /// No operands yields an empty disjunction, which matches nothing.
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let mut operands = Vec::new();
        for predicate in predicates {
            match predicate {
                Self::True => return Self::True,
                Self::Or(inner) => operands.extend(inner),
                other => operands.push(other),
            }
        }
        if operands.len() == 1 {
            operands.remove(0)
        } else {
            Self::Or(operands)
        }
    }

    /// `self AND other`
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        Self::all([self, other])
    }

    /// `self OR other`
    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        Self::any([self, other])
    }

    /// Returns true if this predicate matches everything.
    #[must_use]
    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Returns every field path the predicate reads.
    #[must_use]
    pub fn paths(&self) -> Vec<&FieldPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a FieldPath>) {
        match self {
            Self::True => {}
            Self::Compare { path, .. }
            | Self::In { path, .. }
            | Self::Text { path, .. }
            | Self::IsNull(path)
            | Self::IsNotNull(path) => out.push(path),
            Self::And(items) | Self::Or(items) => {
                for item in items {
                    item.collect_paths(out);
                }
            }
            Self::Not(inner) => inner.collect_paths(out),
        }
    }

    /// Evaluates the predicate; `None` means unknown.
    pub fn evaluate(&self, resolver: &impl FieldResolver) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::Compare { path, op, value } => compare(&resolver.resolve(path), *op, value),
            Self::In { path, values } => {
                let actual = resolver.resolve(path);
                if values.is_empty() {
                    return Some(false);
                }
                if actual.is_null() {
                    return None;
                }
                let mut unknown = false;
                for candidate in values {
                    match compare(&actual, CompareOp::Eq, candidate) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => unknown = true,
                    }
                }
                if unknown {
                    None
                } else {
                    Some(false)
                }
            }
            Self::IsNull(path) => Some(resolver.resolve(path).is_null()),
            Self::IsNotNull(path) => Some(!resolver.resolve(path).is_null()),
            Self::Text { path, op, pattern } => match resolver.resolve(path) {
                Value::Text(text) => Some(op.matches(&text, pattern)),
                _ => None,
            },
            Self::And(items) => {
                let mut result = Some(true);
                for item in items {
                    match item.evaluate(resolver) {
                        Some(false) => return Some(false),
                        Some(true) => {}
                        None => result = None,
                    }
                }
                result
            }
            Self::Or(items) => {
                let mut result = Some(false);
                for item in items {
                    match item.evaluate(resolver) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => result = None,
                    }
                }
                result
            }
            Self::Not(inner) => inner.evaluate(resolver).map(|b| !b),
        }
    }

    /// Returns true if the predicate is definitely true for the resolver.
    pub fn matches(&self, resolver: &impl FieldResolver) -> bool {
        self.evaluate(resolver) == Some(true)
    }
}

fn compare(actual: &Value, op: CompareOp, expected: &Value) -> Option<bool> {
    if actual.is_null() || expected.is_null() {
        return None;
    }
    if discriminant(actual) != discriminant(expected) {
        return None;
    }
    match op {
        // Maps have no ordering but still support equality.
        CompareOp::Eq => Some(actual == expected),
        CompareOp::Ne => Some(actual != expected),
        _ => actual.compare(expected).map(|ord| op.holds(ord)),
    }
}

impl std::ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("TRUE"),
            Self::Compare { path, op, value } => write!(f, "{path} {} {value}", op.symbol()),
            Self::In { path, values } => {
                write!(f, "{path} IN (")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str(")")
            }
            Self::IsNull(path) => write!(f, "{path} IS NULL"),
            Self::IsNotNull(path) => write!(f, "{path} IS NOT NULL"),
            Self::Text { path, op, pattern } => {
                let op = match op {
                    TextOp::StartsWith => "STARTS WITH",
                    TextOp::EndsWith => "ENDS WITH",
                    TextOp::Contains => "CONTAINS",
                };
                write!(f, "{path} {op} {pattern:?}")
            }
            Self::And(items) => write_joined(f, items, " AND ", "TRUE"),
            Self::Or(items) => write_joined(f, items, " OR ", "FALSE"),
            Self::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    items: &[Predicate],
    separator: &str,
    empty: &str,
) -> fmt::Result {
    if items.is_empty() {
        return f.write_str(empty);
    }
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        match item {
            Predicate::And(_) | Predicate::Or(_) => write!(f, "({item})")?,
            _ => write!(f, "{item}")?,
        }
    }
    Ok(())
}
