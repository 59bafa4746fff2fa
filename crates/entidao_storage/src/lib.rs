//! # EntiDAO Storage
//!
//! A reference in-memory storage engine implementing
//! [`entidao_core::Session`].
//!
//! [`MemoryStore`] holds the committed extents and is shared through `Arc`;
//! each [`MemorySession`] is a single-threaded persistence context that
//! buffers writes until it commits. Queries are executed by scanning: the
//! engine applies no indexes and no optimization.
//!
//! ```rust
//! use entidao_core::{EntityMetadata, EntityType, Metamodel, Record, Session};
//! use entidao_core::query::{QueryAssembler, Root};
//! use entidao_storage::MemoryStore;
//! use std::sync::Arc;
//!
//! const CITY: EntityType = EntityType::new("city");
//!
//! let metamodel = Metamodel::builder()
//!     .entity(EntityMetadata::new(CITY).basic("name").basic("population"))
//!     .build()
//!     .unwrap();
//! let store = Arc::new(MemoryStore::new(metamodel));
//! let mut session = store.session();
//!
//! for (name, population) in [("Oslo", 700_000), ("Bergen", 290_000)] {
//!     let record = Record::new().with("name", name).with("population", population);
//!     session.persist(CITY, record).unwrap();
//! }
//!
//! let root = Root::of(session.metamodel(), CITY).unwrap();
//! let query = QueryAssembler::new(session.metamodel())
//!     .assemble(CITY, [root.field("population").gt(500_000)], [], [], [])
//!     .unwrap();
//! assert_eq!(session.execute(&query).unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod executor;
mod session;
mod store;

pub use config::StoreConfig;
pub use error::{StorageError, StorageResult};
pub use session::MemorySession;
pub use store::MemoryStore;
