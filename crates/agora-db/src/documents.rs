//! A minimal document store: JSON bodies grouped by collection, addressed by
//! string id, with equality filters on JSON paths.
//!
//! Repositories are written against [`DocumentStore`], not against SQLite.
//! [`Database`] implements it for every [`Document`] type.

use std::sync::Arc;

use rusqlite::OptionalExtension;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Database, Result};

/// A record that lives in a named collection and knows its own id.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// Selection of documents within one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    /// `path` is a JSON path relative to the document root, e.g. `author.username`.
    Eq { path: &'static str, value: String },
}

impl Filter {
    pub fn eq(path: &'static str, value: impl Into<String>) -> Self {
        Filter::Eq {
            path,
            value: value.into(),
        }
    }
}

pub trait DocumentStore<D: Document>: Send + Sync {
    /// All documents matching `filter`, in insertion order.
    fn find(&self, filter: &Filter) -> Result<Vec<D>>;

    fn find_one(&self, id: &str) -> Result<Option<D>>;

    fn insert(&self, doc: &D) -> Result<()>;

    /// Replace the whole document with the same id. Returns false when no
    /// document with that id exists.
    fn update(&self, doc: &D) -> Result<bool>;

    /// Returns false when nothing matched.
    fn remove(&self, id: &str) -> Result<bool>;
}

impl<D: Document, S: DocumentStore<D>> DocumentStore<D> for Arc<S> {
    fn find(&self, filter: &Filter) -> Result<Vec<D>> {
        (**self).find(filter)
    }

    fn find_one(&self, id: &str) -> Result<Option<D>> {
        (**self).find_one(id)
    }

    fn insert(&self, doc: &D) -> Result<()> {
        (**self).insert(doc)
    }

    fn update(&self, doc: &D) -> Result<bool> {
        (**self).update(doc)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        (**self).remove(id)
    }
}

impl<D: Document> DocumentStore<D> for Database {
    fn find(&self, filter: &Filter) -> Result<Vec<D>> {
        let bodies = self.with_conn(|conn| {
            let bodies = match filter {
                Filter::All => {
                    let mut stmt = conn.prepare(
                        "SELECT body FROM documents WHERE collection = ?1 ORDER BY rowid",
                    )?;
                    stmt.query_map([D::COLLECTION], |row| row.get::<_, String>(0))?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                Filter::Eq { path, value } => {
                    let mut stmt = conn.prepare(
                        "SELECT body FROM documents
                         WHERE collection = ?1 AND json_extract(body, ?2) = ?3
                         ORDER BY rowid",
                    )?;
                    let json_path = format!("$.{path}");
                    stmt.query_map((D::COLLECTION, json_path, value), |row| {
                        row.get::<_, String>(0)
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(bodies)
        })?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(Into::into))
            .collect()
    }

    fn find_one(&self, id: &str) -> Result<Option<D>> {
        let body: Option<String> = self.with_conn(|conn| {
            let body = conn
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                    (D::COLLECTION, id),
                    |row| row.get(0),
                )
                .optional()?;
            Ok(body)
        })?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, doc: &D) -> Result<()> {
        let body = serde_json::to_string(doc)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
                (D::COLLECTION, doc.id(), &body),
            )?;
            Ok(())
        })
    }

    fn update(&self, doc: &D) -> Result<bool> {
        let body = serde_json::to_string(doc)?;
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE documents SET body = ?3 WHERE collection = ?1 AND id = ?2",
                (D::COLLECTION, doc.id(), &body),
            )?;
            Ok(changed > 0)
        })
    }

    fn remove(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                (D::COLLECTION, id),
            )?;
            Ok(changed > 0)
        })
    }
}
