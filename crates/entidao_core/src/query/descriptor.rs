//! Executable query descriptors.

use crate::metamodel::EntityType;
use crate::query::order::Order;
use crate::query::path::{Fetch, Join};
use crate::query::predicate::Predicate;
use crate::query::window::ResultWindow;
use std::fmt;

/// What a descriptor returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Projection {
    /// Entity rows.
    #[default]
    Entities,
    /// The number of matching roots.
    Count,
}

/// A fully specified query, ready for a session to execute.
///
/// Descriptors are produced by the [`crate::query::QueryAssembler`], which
/// has already checked them against the metamodel. After that they can only
/// be narrowed to a different window or turned into a count; the methods
/// that do so consume the descriptor and return a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub(crate) entity_type: EntityType,
    pub(crate) filter: Predicate,
    pub(crate) joins: Vec<Join>,
    pub(crate) fetches: Vec<Fetch>,
    pub(crate) orderings: Vec<Order>,
    pub(crate) window: ResultWindow,
    pub(crate) projection: Projection,
}

impl QueryDescriptor {
    /// Returns the selected entity type.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Returns the conjunction of all filter predicates.
    #[must_use]
    pub fn filter(&self) -> &Predicate {
        &self.filter
    }

    /// Returns true if the descriptor filters rows.
    #[must_use]
    pub fn has_filter(&self) -> bool {
        !self.filter.is_true()
    }

    /// Returns the declared joins, in declaration order.
    ///
    /// Joins implied by association fetches are included.
    #[must_use]
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Looks up a join by alias.
    #[must_use]
    pub fn join(&self, alias: &str) -> Option<&Join> {
        self.joins.iter().find(|j| j.alias == alias)
    }

    /// Returns the associations to load with each row.
    #[must_use]
    pub fn fetches(&self) -> &[Fetch] {
        &self.fetches
    }

    /// Returns the sort keys, most significant first.
    #[must_use]
    pub fn orderings(&self) -> &[Order] {
        &self.orderings
    }

    /// Returns the result window.
    #[must_use]
    pub fn window(&self) -> ResultWindow {
        self.window
    }

    /// Returns the projection.
    #[must_use]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Replaces the result window.
    #[must_use]
    pub fn with_window(self, window: ResultWindow) -> Self {
        Self { window, ..self }
    }

    /// Replaces the result window with caller-supplied bounds.
    ///
    /// See [`crate::query::paginate`].
    #[must_use]
    pub fn paginate(self, max_rows: Option<i64>, from_row: Option<i64>) -> Self {
        self.with_window(ResultWindow::new(max_rows, from_row))
    }

    /// Turns the descriptor into a count of matching roots.
    ///
    /// Orderings, fetches and the window do not affect a count and are
    /// dropped.
    #[must_use]
    pub fn into_count(self) -> Self {
        Self {
            fetches: Vec::new(),
            orderings: Vec::new(),
            window: ResultWindow::UNBOUNDED,
            projection: Projection::Count,
            ..self
        }
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.projection {
            Projection::Entities => write!(f, "SELECT root FROM {} root", self.entity_type)?,
            Projection::Count => write!(f, "SELECT COUNT(root) FROM {} root", self.entity_type)?,
        }
        for join in &self.joins {
            write!(f, " {join}")?;
        }
        for fetch in &self.fetches {
            write!(f, " {fetch}")?;
        }
        if self.has_filter() {
            write!(f, " WHERE {}", self.filter)?;
        }
        if !self.orderings.is_empty() {
            f.write_str(" ORDER BY ")?;
            for (i, order) in self.orderings.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{order}")?;
            }
        }
        if !self.window.is_unbounded() {
            write!(f, " {}", self.window)?;
        }
        Ok(())
    }
}
