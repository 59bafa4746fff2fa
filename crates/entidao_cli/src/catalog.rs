//! The catalog model and its JSON dataset.
//!
//! A dataset is a JSON document listing authors and books:
//!
//! ```json
//! {
//!   "authors": [{ "key": "leguin", "name": "Ursula K. Le Guin", "born": 1929 }],
//!   "books": [{ "title": "The Dispossessed", "year": 1974, "author": "leguin" }]
//! }
//! ```
//!
//! Books refer to authors by key. Loading persists every author, then every
//! book, and commits once.

use crate::error::{CliError, CliResult};
use entidao_core::{
    CoreResult, Entity, EntityId, EntityMetadata, EntityType, Metamodel, Record, Repository,
};
use entidao_storage::{MemorySession, MemoryStore};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

fn serialize_id<S: Serializer>(id: &Option<EntityId>, serializer: S) -> Result<S::Ok, S::Error> {
    match id {
        Some(id) => serializer.serialize_str(&id.to_string()),
        None => serializer.serialize_none(),
    }
}

/// A book author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    /// Identity.
    #[serde(serialize_with = "serialize_id")]
    pub id: Option<EntityId>,
    /// Full name.
    pub name: String,
    /// Country of origin.
    pub country: Option<String>,
    /// Year of birth.
    pub born: Option<i64>,
}

impl Entity for Author {
    const ENTITY_TYPE: EntityType = EntityType::new("author");

    fn metadata() -> EntityMetadata {
        EntityMetadata::new(Self::ENTITY_TYPE)
            .basic("name")
            .basic("country")
            .basic("born")
            .to_many("books", Book::ENTITY_TYPE, "author_id")
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
            .with("country", self.country.clone())
            .with("born", self.born)
    }

    fn from_record(id: EntityId, record: &Record) -> CoreResult<Self> {
        Ok(Self {
            id: Some(id),
            name: record.text("name")?.to_string(),
            country: record.optional_text("country")?,
            born: record.get("born").and_then(|v| v.as_integer()),
        })
    }
}

/// A book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    /// Identity.
    #[serde(serialize_with = "serialize_id")]
    pub id: Option<EntityId>,
    /// Title.
    pub title: String,
    /// Year of first publication.
    pub year: i64,
    /// Page count.
    pub pages: Option<i64>,
    /// The book's author.
    #[serde(serialize_with = "serialize_id")]
    pub author: Option<EntityId>,
}

impl Entity for Book {
    const ENTITY_TYPE: EntityType = EntityType::new("book");

    fn metadata() -> EntityMetadata {
        EntityMetadata::new(Self::ENTITY_TYPE)
            .basic("title")
            .basic("year")
            .basic("pages")
            .to_one("author", Author::ENTITY_TYPE, "author_id")
    }

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("title", self.title.as_str())
            .with("year", self.year)
            .with("pages", self.pages)
            .with("author_id", self.author)
    }

    fn from_record(id: EntityId, record: &Record) -> CoreResult<Self> {
        Ok(Self {
            id: Some(id),
            title: record.text("title")?.to_string(),
            year: record.integer("year")?,
            pages: record.get("pages").and_then(|v| v.as_integer()),
            author: record.reference("author_id")?,
        })
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(born) = self.born {
            write!(f, " (b. {born})")?;
        }
        if let Some(country) = &self.country {
            write!(f, ", {country}")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.year)?;
        if let Some(pages) = self.pages {
            write!(f, ", {pages} pages")?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AuthorEntry {
    key: String,
    name: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    born: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BookEntry {
    title: String,
    year: i64,
    #[serde(default)]
    pages: Option<i64>,
    #[serde(default)]
    author: Option<String>,
}

/// The raw dataset document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    #[serde(default)]
    authors: Vec<AuthorEntry>,
    #[serde(default)]
    books: Vec<BookEntry>,
}

impl Dataset {
    /// Reads a dataset from a JSON file.
    pub fn read(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses a dataset from JSON text.
    pub fn parse(text: &str) -> CliResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Persists the dataset into a fresh store and returns the store.
    pub fn load(self) -> CliResult<Arc<MemoryStore>> {
        let store = Arc::new(MemoryStore::new(catalog_metamodel()?));
        let mut repo = Repository::new(store.session());

        let mut keys: HashMap<String, EntityId> = HashMap::new();
        for entry in self.authors {
            if keys.contains_key(&entry.key) {
                return Err(CliError::DuplicateAuthor(entry.key));
            }
            let author = Author {
                id: None,
                name: entry.name,
                country: entry.country,
                born: entry.born,
            };
            if let Some(id) = repo.save_or_update(Some(author), None)?.and_then(|a| a.id) {
                debug!(key = %entry.key, %id, "loaded author");
                keys.insert(entry.key, id);
            }
        }

        for entry in self.books {
            let author = match entry.author {
                Some(key) => match keys.get(&key) {
                    Some(id) => Some(*id),
                    None => {
                        return Err(CliError::UnknownAuthor {
                            title: entry.title,
                            author: key,
                        })
                    }
                },
                None => None,
            };
            let book = Book {
                id: None,
                title: entry.title,
                year: entry.year,
                pages: entry.pages,
                author,
            };
            repo.save_or_update(Some(book), None)?;
        }

        let mut session: MemorySession = repo.into_session();
        session.commit()?;
        info!(
            authors = store.len(Author::ENTITY_TYPE),
            books = store.len(Book::ENTITY_TYPE),
            "dataset loaded"
        );
        Ok(store)
    }
}

/// Metamodel of the catalog.
pub fn catalog_metamodel() -> CoreResult<Metamodel> {
    Metamodel::builder()
        .register::<Author>()
        .register::<Book>()
        .build()
}

/// The entity kinds the CLI can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Kind {
    /// Authors.
    Author,
    /// Books.
    Book,
}
