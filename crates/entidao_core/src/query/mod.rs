//! Dynamic query construction.
//!
//! Queries are built in three steps:
//!
//! 1. Field handles from a [`Root`] or [`Join`] produce [`Predicate`]s and
//!    [`Order`]s.
//! 2. The [`QueryAssembler`] checks those parts against the metamodel and
//!    produces a [`QueryDescriptor`].
//! 3. [`paginate`] (or [`QueryDescriptor::paginate`]) bounds the result
//!    window before the descriptor is executed.
//!
//! [`CriteriaQuery`] wraps the three steps in a typed builder.

mod assembler;
mod criteria;
mod descriptor;
mod order;
mod path;
mod predicate;
mod window;

pub use assembler::QueryAssembler;
pub use criteria::CriteriaQuery;
pub use descriptor::{Projection, QueryDescriptor};
pub use order::{Direction, Order};
pub use path::{Fetch, FetchKind, Field, FieldPath, Join, JoinType, PathSource, Root};
pub use predicate::{CompareOp, FieldResolver, Predicate, TextOp};
pub use window::{paginate, ResultWindow};
