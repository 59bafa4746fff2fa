//! Command-line filters and orderings.
//!
//! A filter is `PATH OP VALUE`, where `PATH` is a field of the queried
//! entity (`year`) or a field behind one of its relationships
//! (`author.country`), and `OP` is one of `=`, `!=`, `<`, `<=`, `>`, `>=`,
//! `^=` (starts with), `$=` (ends with) or `~` (contains). A `VALUE` of
//! `null` turns `=` and `!=` into null tests; values that parse as integers
//! compare as integers.
//!
//! An ordering is `PATH` or `PATH:asc` / `PATH:desc`.

use crate::error::{CliError, CliResult};
use entidao_core::query::{Field, Join, JoinType, Order, Predicate, Root};
use entidao_core::Value;
use std::str::FromStr;

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `^=`
    StartsWith,
    /// `$=`
    EndsWith,
    /// `~`
    Contains,
}

/// Operators in match order: two-character operators before their
/// one-character prefixes.
const OPERATORS: [(&str, Op); 9] = [
    ("!=", Op::Ne),
    ("<=", Op::Le),
    (">=", Op::Ge),
    ("^=", Op::StartsWith),
    ("$=", Op::EndsWith),
    ("=", Op::Eq),
    ("<", Op::Lt),
    (">", Op::Gt),
    ("~", Op::Contains),
];

/// A field reference, optionally behind a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathArg {
    /// Relationship attribute of the root, if any.
    pub relation: Option<String>,
    /// Field name.
    pub field: String,
}

impl PathArg {
    fn parse(input: &str, whole: &str) -> CliResult<Self> {
        let invalid = |reason| CliError::invalid_filter(whole, reason);
        let input = input.trim();
        if input.is_empty() {
            return Err(invalid("missing field"));
        }
        match input.split_once('.') {
            None => Ok(Self {
                relation: None,
                field: input.to_string(),
            }),
            Some((relation, field)) => {
                if relation.is_empty() || field.is_empty() || field.contains('.') {
                    return Err(invalid("paths have at most one relationship step"));
                }
                Ok(Self {
                    relation: Some(relation.to_string()),
                    field: field.to_string(),
                })
            }
        }
    }

    /// Resolves the path against a root, declaring a join for the
    /// relationship step when one is named and not yet declared.
    fn field(&self, root: &Root, joins: &mut Vec<Join>, join_type: JoinType) -> Field {
        match &self.relation {
            None => root.field(self.field.as_str()),
            Some(relation) => {
                let join = match joins.iter().find(|j| &j.alias == relation) {
                    Some(join) => join.clone(),
                    None => {
                        let join = match join_type {
                            JoinType::Inner => root.join(relation.as_str(), relation.as_str()),
                            JoinType::Left => root.left_join(relation.as_str(), relation.as_str()),
                        };
                        joins.push(join.clone());
                        join
                    }
                };
                join.field(self.field.as_str())
            }
        }
    }
}

/// A parsed `PATH OP VALUE` filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterArg {
    /// Field reference.
    pub path: PathArg,
    /// Operator.
    pub op: Op,
    /// Operand; `Null` for `null`.
    pub value: Value,
}

impl FromStr for FilterArg {
    type Err = CliError;

    fn from_str(input: &str) -> CliResult<Self> {
        let (at, token, op) = OPERATORS
            .iter()
            .filter_map(|(token, op)| input.find(token).map(|at| (at, *token, *op)))
            .min_by_key(|(at, token, _)| (*at, std::cmp::Reverse(token.len())))
            .ok_or_else(|| CliError::invalid_filter(input, "missing operator"))?;

        let path = PathArg::parse(&input[..at], input)?;
        let raw = input[at + token.len()..].trim();
        let value = parse_value(raw);

        let text_op = matches!(op, Op::StartsWith | Op::EndsWith | Op::Contains);
        if text_op && !matches!(value, Value::Text(_)) {
            return Err(CliError::invalid_filter(input, "text operators need a text value"));
        }
        if value.is_null() && !matches!(op, Op::Eq | Op::Ne) {
            return Err(CliError::invalid_filter(input, "null only supports = and !="));
        }
        Ok(Self { path, op, value })
    }
}

fn parse_value(raw: &str) -> Value {
    if raw == "null" {
        return Value::Null;
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Integer(n);
    }
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    Value::Text(unquoted.to_string())
}

impl FilterArg {
    /// Builds the predicate, inner-joining any relationship it names.
    pub fn predicate(&self, root: &Root, joins: &mut Vec<Join>) -> Predicate {
        let field = self.path.field(root, joins, JoinType::Inner);
        let text = || self.value.as_text().unwrap_or_default().to_string();
        match (self.op, &self.value) {
            (Op::Eq, Value::Null) => field.is_null(),
            (Op::Ne, Value::Null) => field.is_not_null(),
            (Op::Eq, value) => field.eq(value.clone()),
            (Op::Ne, value) => field.ne(value.clone()),
            (Op::Lt, value) => field.lt(value.clone()),
            (Op::Le, value) => field.le(value.clone()),
            (Op::Gt, value) => field.gt(value.clone()),
            (Op::Ge, value) => field.ge(value.clone()),
            (Op::StartsWith, _) => field.starts_with(text()),
            (Op::EndsWith, _) => field.ends_with(text()),
            (Op::Contains, _) => field.contains(text()),
        }
    }
}

/// A parsed `PATH[:asc|:desc]` ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderArg {
    /// Field reference.
    pub path: PathArg,
    /// True for descending order.
    pub descending: bool,
}

impl FromStr for OrderArg {
    type Err = CliError;

    fn from_str(input: &str) -> CliResult<Self> {
        let (path, descending) = match input.rsplit_once(':') {
            None => (input, false),
            Some((path, "asc")) => (path, false),
            Some((path, "desc")) => (path, true),
            Some(_) => return Err(CliError::invalid_order(input, "direction must be asc or desc")),
        };
        let path = PathArg::parse(path, input)
            .map_err(|_| CliError::invalid_order(input, "invalid field path"))?;
        Ok(Self { path, descending })
    }
}

impl OrderArg {
    /// Builds the sort key. A relationship it names is left-joined, so
    /// ordering alone never drops rows.
    pub fn order(&self, root: &Root, joins: &mut Vec<Join>) -> Order {
        let field = self.path.field(root, joins, JoinType::Left);
        if self.descending {
            field.desc()
        } else {
            field.asc()
        }
    }
}
