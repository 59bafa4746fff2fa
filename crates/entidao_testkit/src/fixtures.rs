//! Fixture entities and store helpers.
//!
//! The fixture model is small but covers every relationship shape:
//! `Person` has a to-one `address` and a to-many `orders`, and `Order` has a
//! to-one `customer` back to `Person`.

use entidao_core::{
    CoreResult, Entity, EntityId, EntityMetadata, EntityType, Metamodel, Record, Repository,
};
use entidao_storage::{MemorySession, MemoryStore, StoreConfig};
use std::sync::Arc;

/// A person with an optional address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// Identity, `None` while transient.
    pub id: Option<EntityId>,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: i64,
    /// Optional e-mail address.
    pub email: Option<String>,
    /// Reference to the person's address.
    pub address: Option<EntityId>,
}

impl Person {
    /// Creates a transient person.
    pub fn new(name: impl Into<String>, age: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            age,
            email: None,
            address: None,
        }
    }

    /// Sets the e-mail address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the address reference.
    #[must_use]
    pub fn with_address(mut self, address: EntityId) -> Self {
        self.address = Some(address);
        self
    }

    /// Returns the instance with its identity cleared.
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.id = None;
        self
    }
}

impl Entity for Person {
    const ENTITY_TYPE: EntityType = EntityType::new("person");

    fn metadata() -> EntityMetadata {
        EntityMetadata::new(Self::ENTITY_TYPE)
            .basic("name")
            .basic("age")
            .basic("email")
            .to_one("address", Address::ENTITY_TYPE, "address_id")
            .to_many("orders", Order::ENTITY_TYPE, "customer_id")
    }

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("name", self.name.as_str())
            .with("age", self.age)
            .with("email", self.email.clone())
            .with("address_id", self.address)
    }

    fn from_record(id: EntityId, record: &Record) -> CoreResult<Self> {
        Ok(Self {
            id: Some(id),
            name: record.text("name")?.to_string(),
            age: record.integer("age")?,
            email: record.optional_text("email")?,
            address: record.reference("address_id")?,
        })
    }
}

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Identity, `None` while transient.
    pub id: Option<EntityId>,
    /// Street line.
    pub street: String,
    /// City name.
    pub city: String,
}

impl Address {
    /// Creates a transient address.
    pub fn new(street: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            id: None,
            street: street.into(),
            city: city.into(),
        }
    }
}

impl Entity for Address {
    const ENTITY_TYPE: EntityType = EntityType::new("address");

    fn metadata() -> EntityMetadata {
        EntityMetadata::new(Self::ENTITY_TYPE)
            .basic("street")
            .basic("city")
    }

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("street", self.street.as_str())
            .with("city", self.city.as_str())
    }

    fn from_record(id: EntityId, record: &Record) -> CoreResult<Self> {
        Ok(Self {
            id: Some(id),
            street: record.text("street")?.to_string(),
            city: record.text("city")?.to_string(),
        })
    }
}

/// An order placed by a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Identity, `None` while transient.
    pub id: Option<EntityId>,
    /// Order total in cents.
    pub total: i64,
    /// Reference to the customer.
    pub customer: Option<EntityId>,
}

impl Order {
    /// Creates a transient order for a customer.
    pub fn new(customer: EntityId, total: i64) -> Self {
        Self {
            id: None,
            total,
            customer: Some(customer),
        }
    }
}

impl Entity for Order {
    const ENTITY_TYPE: EntityType = EntityType::new("order");

    fn metadata() -> EntityMetadata {
        EntityMetadata::new(Self::ENTITY_TYPE)
            .basic("total")
            .to_one("customer", Person::ENTITY_TYPE, "customer_id")
    }

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("total", self.total)
            .with("customer_id", self.customer)
    }

    fn from_record(id: EntityId, record: &Record) -> CoreResult<Self> {
        Ok(Self {
            id: Some(id),
            total: record.integer("total")?,
            customer: record.reference("customer_id")?,
        })
    }
}

/// Metamodel holding the three fixture entities.
pub fn fixture_metamodel() -> Metamodel {
    Metamodel::builder()
        .register::<Person>()
        .register::<Address>()
        .register::<Order>()
        .build()
        .expect("fixture metamodel is valid")
}

/// Creates an empty in-memory store for the fixture model.
pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(fixture_metamodel()))
}

/// Creates an empty store with a custom engine configuration.
pub fn memory_store_with(config: StoreConfig) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_config(fixture_metamodel(), config))
}

/// Opens a repository on a fresh store.
pub fn repository() -> Repository<MemorySession> {
    Repository::new(memory_store().session())
}

/// Runs a test with a repository on a fresh store.
///
/// # Example
///
/// ```rust
/// use entidao_testkit::{with_repository, Person};
///
/// with_repository(|repo| {
///     assert!(repo.get_all::<Person>().unwrap().is_empty());
/// });
/// ```
pub fn with_repository<F, R>(f: F) -> R
where
    F: FnOnce(&mut Repository<MemorySession>) -> R,
{
    let mut repo = repository();
    f(&mut repo)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a repository holding `count` people named `person-0`,
    /// `person-1`, … with age equal to their index, committed in that order.
    pub fn numbered_people(count: usize) -> (Repository<MemorySession>, Vec<Person>) {
        let mut repo = repository();
        let mut people = Vec::with_capacity(count);
        for i in 0..count {
            let person = Person::new(format!("person-{i}"), i as i64);
            let saved = repo
                .save_or_update(Some(person), None)
                .expect("Failed to save person")
                .expect("save returns the instance");
            people.push(saved);
        }
        repo.session_mut().commit().expect("Failed to commit");
        (repo, people)
    }

    /// The people of [`household`], by name.
    #[derive(Debug, Clone)]
    pub struct Household {
        /// Ann, 34, lives in Oslo, two orders.
        pub ann: Person,
        /// Bob, 27, no address, no orders.
        pub bob: Person,
        /// Cid, 34, lives in Bergen, one order.
        pub cid: Person,
        /// Dee, 51, lives in Oslo, no orders.
        pub dee: Person,
    }

    /// Creates a repository with four people, two addresses and three
    /// orders, committed.
    pub fn household() -> (Repository<MemorySession>, Household) {
        let mut repo = repository();
        let save = |repo: &mut Repository<MemorySession>, person: Person| {
            repo.save_or_update(Some(person), None)
                .expect("Failed to save person")
                .expect("save returns the instance")
        };

        let oslo = repo
            .save_or_update(Some(Address::new("Karl Johans gate 1", "Oslo")), None)
            .expect("Failed to save address")
            .and_then(|a| a.id)
            .expect("address has an identity");
        let bergen = repo
            .save_or_update(Some(Address::new("Bryggen 2", "Bergen")), None)
            .expect("Failed to save address")
            .and_then(|a| a.id)
            .expect("address has an identity");

        let ann = save(
            &mut repo,
            Person::new("Ann", 34)
                .with_email("ann@example.com")
                .with_address(oslo),
        );
        let bob = save(&mut repo, Person::new("Bob", 27));
        let cid = save(&mut repo, Person::new("Cid", 34).with_address(bergen));
        let dee = save(
            &mut repo,
            Person::new("Dee", 51)
                .with_email("dee@example.org")
                .with_address(oslo),
        );

        for (customer, total) in [(&ann, 1200), (&ann, 800), (&cid, 450)] {
            let customer = customer.id.expect("person has an identity");
            repo.save_or_update(Some(Order::new(customer, total)), None)
                .expect("Failed to save order");
        }
        repo.session_mut().commit().expect("Failed to commit");

        (repo, Household { ann, bob, cid, dee })
    }
}
