//! Entity identity, records and the typed entity trait.

mod codec;
mod id;
mod record;

pub use codec::Entity;
pub use id::EntityId;
pub use record::Record;
