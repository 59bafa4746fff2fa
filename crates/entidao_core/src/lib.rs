//! # EntiDAO Core
//!
//! Generic data access over arbitrary persistent entity types.
//!
//! This crate provides:
//! - The entity model: [`Entity`], [`EntityId`], [`Record`]
//! - The [`Metamodel`] describing entity types and their relationships
//! - Dynamic query construction: predicates, joins, orderings and result
//!   windows, assembled into a [`QueryDescriptor`](query::QueryDescriptor)
//! - The result materializer reconciling zero, one and many rows
//! - The [`Repository`] facade with uniform CRUD operations
//!
//! Storage engines plug in by implementing [`Session`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod entity;
mod error;
pub mod materialize;
mod metamodel;
pub mod query;
mod repository;
mod session;

pub use config::Config;
pub use entity::{Entity, EntityId, Record};
pub use error::{CoreError, CoreResult};
pub use metamodel::{
    AttributeKind, AttributeMetadata, EntityMetadata, EntityType, Metamodel, MetamodelBuilder,
    DEFAULT_ID_FIELD,
};
pub use repository::Repository;
pub use session::{Row, Session};

pub use entidao_codec::Value;
