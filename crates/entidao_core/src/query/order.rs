//! Sort specifications.

use crate::query::path::FieldPath;
use std::fmt;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Smallest first; nulls first.
    #[default]
    Asc,
    /// Largest first; nulls last.
    Desc,
}

/// One key of a query's ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Order {
    /// Field sorted on.
    pub path: FieldPath,
    /// Direction.
    pub direction: Direction,
}

impl Order {
    /// Ascending order on `path`.
    #[must_use]
    pub fn asc(path: FieldPath) -> Self {
        Self {
            path,
            direction: Direction::Asc,
        }
    }

    /// Descending order on `path`.
    #[must_use]
    pub fn desc(path: FieldPath) -> Self {
        Self {
            path,
            direction: Direction::Desc,
        }
    }

    /// Returns the same key in the opposite direction.
    #[must_use]
    pub fn reverse(self) -> Self {
        let direction = match self.direction {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        };
        Self { direction, ..self }
    }

    /// Applies the direction to an ascending comparison.
    #[must_use]
    pub fn apply(&self, ascending: std::cmp::Ordering) -> std::cmp::Ordering {
        match self.direction {
            Direction::Asc => ascending,
            Direction::Desc => ascending.reverse(),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Asc => write!(f, "{} ASC", self.path),
            Direction::Desc => write!(f, "{} DESC", self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn reverse_flips_direction() {
        let order = Order::asc(FieldPath::root("name"));
        assert_eq!(order.clone().reverse().direction, Direction::Desc);
        assert_eq!(order.clone().reverse().reverse(), order);
    }

    #[test]
    fn apply_respects_direction() {
        let desc = Order::desc(FieldPath::root("age"));
        assert_eq!(desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(desc.to_string(), "root.age DESC");
    }
}
