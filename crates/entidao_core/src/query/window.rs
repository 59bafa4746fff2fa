//! Result windows and the pagination adapter.

use crate::query::descriptor::QueryDescriptor;
use std::fmt;

/// An optional row cap and row offset.
///
/// Bounds are normalized on construction: a cap or offset that is absent,
/// zero or negative means "no bound".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResultWindow {
    max_rows: Option<u64>,
    first_row: Option<u64>,
}

impl ResultWindow {
    /// A window with no cap and no offset.
    pub const UNBOUNDED: Self = Self {
        max_rows: None,
        first_row: None,
    };

    /// Creates a window from caller-supplied bounds.
    ///
    /// # Example
    ///
    /// ```rust
    /// use entidao_core::query::ResultWindow;
    ///
    /// let window = ResultWindow::new(Some(3), Some(4));
    /// assert_eq!(window.max_rows(), Some(3));
    /// assert_eq!(window.first_row(), Some(4));
    ///
    /// assert!(ResultWindow::new(Some(0), Some(-2)).is_unbounded());
    /// ```
    #[must_use]
    pub fn new(max_rows: Option<i64>, from_row: Option<i64>) -> Self {
        Self {
            max_rows: positive(max_rows),
            first_row: positive(from_row),
        }
    }

    /// Returns the row cap, if any.
    #[must_use]
    pub const fn max_rows(&self) -> Option<u64> {
        self.max_rows
    }

    /// Returns the number of leading rows skipped, if any.
    #[must_use]
    pub const fn first_row(&self) -> Option<u64> {
        self.first_row
    }

    /// Returns true if the window neither caps nor skips.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.max_rows.is_none() && self.first_row.is_none()
    }

    /// Returns a copy with the cap lowered to at most `cap`.
    ///
    /// A `cap` of 0 is no cap and leaves the window unchanged.
    #[must_use]
    pub fn limit(self, cap: u64) -> Self {
        if cap == 0 {
            return self;
        }
        let max_rows = match self.max_rows {
            Some(existing) => existing.min(cap),
            None => cap,
        };
        Self {
            max_rows: Some(max_rows),
            ..self
        }
    }

    /// Applies the window to an ordered sequence of rows.
    pub fn apply<T>(&self, rows: impl IntoIterator<Item = T>) -> impl Iterator<Item = T> {
        let skip = self
            .first_row
            .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
        let take = self
            .max_rows
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
        rows.into_iter().skip(skip).take(take)
    }
}

fn positive(bound: Option<i64>) -> Option<u64> {
    bound.and_then(|n| u64::try_from(n).ok()).filter(|n| *n > 0)
}

impl fmt::Display for ResultWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.max_rows, self.first_row) {
            (None, None) => f.write_str("unbounded"),
            (Some(max), None) => write!(f, "LIMIT {max}"),
            (None, Some(first)) => write!(f, "OFFSET {first}"),
            (Some(max), Some(first)) => write!(f, "LIMIT {max} OFFSET {first}"),
        }
    }
}

/// Applies offset/limit bounds to a descriptor.
///
/// The bounds replace whatever window the descriptor carried; they do not
/// accumulate.
#[must_use]
pub fn paginate(
    descriptor: QueryDescriptor,
    max_rows: Option<i64>,
    from_row: Option<i64>,
) -> QueryDescriptor {
    descriptor.with_window(ResultWindow::new(max_rows, from_row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_bounds_are_ignored() {
        let window = ResultWindow::new(Some(0), Some(0));
        assert!(window.is_unbounded());
        assert_eq!(ResultWindow::new(Some(-1), None), ResultWindow::UNBOUNDED);
    }

    #[test]
    fn apply_skips_then_caps() {
        let rows: Vec<_> = ResultWindow::new(Some(3), Some(4)).apply(1..=10).collect();
        assert_eq!(rows, vec![5, 6, 7]);

        let all: Vec<_> = ResultWindow::new(Some(0), None).apply(1..=10).collect();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn offset_past_end_is_empty() {
        let rows: Vec<_> = ResultWindow::new(None, Some(20)).apply(1..=10).collect();
        assert!(rows.is_empty());
    }

    #[test]
    fn limit_only_lowers() {
        let window = ResultWindow::new(Some(3), Some(1));
        assert_eq!(window.limit(10).max_rows(), Some(3));
        assert_eq!(window.limit(2).max_rows(), Some(2));
        assert_eq!(window.limit(2).first_row(), Some(1));
        assert_eq!(ResultWindow::UNBOUNDED.limit(5).max_rows(), Some(5));
    }

    #[test]
    fn zero_limit_keeps_window() {
        assert!(ResultWindow::UNBOUNDED.limit(0).is_unbounded());
        let window = ResultWindow::new(Some(3), None);
        assert_eq!(window.limit(0).max_rows(), Some(3));
    }

    #[test]
    fn display() {
        assert_eq!(ResultWindow::new(Some(3), Some(4)).to_string(), "LIMIT 3 OFFSET 4");
        assert_eq!(ResultWindow::UNBOUNDED.to_string(), "unbounded");
    }
}
