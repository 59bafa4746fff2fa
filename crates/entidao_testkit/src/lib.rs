//! # EntiDAO Testkit
//!
//! Test utilities for EntiDAO.
//!
//! This crate provides:
//! - Fixture entities (`Person`, `Address`, `Order`) and their metamodel
//! - Store and repository helpers over the in-memory engine
//! - A harness that tracks saved entities for later verification
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use entidao_testkit::prelude::*;
//!
//! with_repository(|repo| {
//!     let saved = repo.save_or_update(Some(Person::new("Ann", 30)), None).unwrap();
//!     assert!(saved.is_some());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod harness;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::harness::*;
    pub use entidao_core::query::{QueryAssembler, QueryDescriptor, Root};
    pub use entidao_core::{CoreError, Entity, EntityId, Repository, Session};
    pub use entidao_storage::{MemorySession, MemoryStore};
}

pub use fixtures::*;
pub use generators::*;
pub use harness::*;
