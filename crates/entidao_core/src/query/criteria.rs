//! Typed fluent builder over the assembler.

use crate::entity::Entity;
use crate::error::CoreResult;
use crate::query::assembler::QueryAssembler;
use crate::query::descriptor::QueryDescriptor;
use crate::query::order::Order;
use crate::query::path::{Fetch, Join, Root};
use crate::query::predicate::Predicate;
use crate::query::window::ResultWindow;
use std::fmt;
use std::marker::PhantomData;

/// Collects the parts of a query for entity type `T`.
///
/// Obtained from [`crate::Repository::criteria`]. Nothing is checked until
/// [`CriteriaQuery::build`] hands the parts to the assembler.
///
/// # Example
///
/// ```rust,ignore
/// let mut query = repo.criteria::<Person>()?;
/// let root = query.root();
/// let address = query.join(root.join("address", "a"));
/// query
///     .filter(root.field("age").ge(30))
///     .filter(address.field("city").eq("Oslo"))
///     .order_by(root.field("name").asc());
/// let people: Vec<Person> = repo.find_many(&query.build()?)?;
/// ```
pub struct CriteriaQuery<'m, T> {
    assembler: QueryAssembler<'m>,
    root: Root,
    predicates: Vec<Predicate>,
    orderings: Vec<Order>,
    joins: Vec<Join>,
    fetches: Vec<Fetch>,
    window: ResultWindow,
    _entity: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for CriteriaQuery<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriteriaQuery")
            .field("root", &self.root)
            .field("predicates", &self.predicates)
            .field("orderings", &self.orderings)
            .field("joins", &self.joins)
            .field("fetches", &self.fetches)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl<'m, T: Entity> CriteriaQuery<'m, T> {
    /// Starts a query for `T`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` if `T` is not registered.
    pub fn new(assembler: QueryAssembler<'m>) -> CoreResult<Self> {
        let root = Root::of(assembler.metamodel(), T::ENTITY_TYPE)?;
        Ok(Self {
            assembler,
            root,
            predicates: Vec::new(),
            orderings: Vec::new(),
            joins: Vec::new(),
            fetches: Vec::new(),
            window: ResultWindow::UNBOUNDED,
            _entity: PhantomData,
        })
    }

    /// Returns the query root.
    #[must_use]
    pub fn root(&self) -> Root {
        self.root.clone()
    }

    /// Declares a join and returns it for building field paths.
    pub fn join(&mut self, join: Join) -> Join {
        self.joins.push(join.clone());
        join
    }

    /// Declares a fetch.
    pub fn fetch(&mut self, fetch: Fetch) -> &mut Self {
        self.fetches.push(fetch);
        self
    }

    /// Adds a predicate; all predicates are combined with AND.
    pub fn filter(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    /// Appends a sort key.
    pub fn order_by(&mut self, order: Order) -> &mut Self {
        self.orderings.push(order);
        self
    }

    /// Sets the result window, replacing any earlier one.
    pub fn paginate(&mut self, max_rows: Option<i64>, from_row: Option<i64>) -> &mut Self {
        self.window = ResultWindow::new(max_rows, from_row);
        self
    }

    /// Assembles the descriptor.
    ///
    /// # Errors
    ///
    /// Any error of [`QueryAssembler::assemble`].
    pub fn build(self) -> CoreResult<QueryDescriptor> {
        let descriptor = self.assembler.assemble(
            T::ENTITY_TYPE,
            self.predicates,
            self.orderings,
            self.joins,
            self.fetches,
        )?;
        Ok(descriptor.with_window(self.window))
    }
}
