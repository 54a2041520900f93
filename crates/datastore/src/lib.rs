//! Typed entity repository
//!
//! [`Repo<T>`] reads and writes entities of one kind inside one namespace.
//! The document store behind it is abstracted by the [`EntityStore`] trait:
//! - a cloud datastore adapter in production
//! - [`MemoryEntityStore`] for tests and local development
//!
//! Store errors are wrapped into [`SystemFailure`]s with the `datastore`
//! component; a missing entity is `Ok(None)` and a duplicate insert is
//! `Ok(true)`, neither is a failure.

use std::marker::PhantomData;
use std::sync::Arc;

use dusted_fault::{ResultExt, SystemFailure};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod mock;
pub mod query;

pub use mock::MemoryEntityStore;
pub use query::{Direction, Filter, Operator, Query};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("entity '{0}' already exists")]
    AlreadyExists(String),

    #[error("datastore backend error: {0}")]
    Backend(String),
}

/// Address of a single entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pub namespace: String,
    pub kind: String,
    pub name: String,
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.kind, self.name)
    }
}

/// Document store holding JSON entities addressed by [`Key`]
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    /// Create or replace an entity
    async fn put(&self, key: &Key, entity: Value) -> Result<(), StoreError>;

    /// Create an entity, failing with [`StoreError::AlreadyExists`] if the
    /// key is taken
    async fn insert(&self, key: &Key, entity: Value) -> Result<(), StoreError>;

    async fn get(&self, key: &Key) -> Result<Option<Value>, StoreError>;

    /// All entities of the query's kind in `namespace` matching the query
    async fn query(&self, namespace: &str, query: &Query) -> Result<Vec<Value>, StoreError>;

    /// Number of matching entities, without loading them
    async fn count(&self, namespace: &str, query: &Query) -> Result<usize, StoreError>;

    async fn delete(&self, key: &Key) -> Result<(), StoreError>;
}

/// Read and write access to entities of type `T`
pub struct Repo<T> {
    store: Arc<dyn EntityStore>,
    namespace: String,
    kind: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repo<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: self.namespace.clone(),
            kind: self.kind.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> Repo<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(
        store: Arc<dyn EntityStore>,
        namespace: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            kind: kind.into(),
            _entity: PhantomData,
        }
    }

    /// Start a query over this repo's kind
    pub fn new_query(&self) -> Query {
        Query::new(&self.kind)
    }

    fn key(&self, name: &str) -> Key {
        Key {
            namespace: self.namespace.clone(),
            kind: self.kind.clone(),
            name: name.to_string(),
        }
    }

    fn encode(entity: &T, operation: &str) -> Result<Value, SystemFailure> {
        serde_json::to_value(entity).wrap_system("datastore", operation, "error encoding entity")
    }

    fn decode(entity: Value, operation: &str) -> Result<T, SystemFailure> {
        serde_json::from_value(entity).wrap_system("datastore", operation, "error decoding entity")
    }

    /// Create a new entity or update an existing one
    pub async fn upsert(&self, key: &str, entity: &T) -> Result<(), SystemFailure> {
        let value = Self::encode(entity, "upsert")?;
        self.store
            .put(&self.key(key), value)
            .await
            .wrap_system("datastore", "upsert", "error writing to datastore")
    }

    /// Create a new entity. Returns `true` when an entity with the same key
    /// already existed, in which case nothing was written.
    pub async fn insert(&self, key: &str, entity: &T) -> Result<bool, SystemFailure> {
        let value = Self::encode(entity, "insert")?;
        match self.store.insert(&self.key(key), value).await {
            Ok(()) => Ok(false),
            Err(StoreError::AlreadyExists(existing)) => {
                tracing::debug!(key = %existing, "Insert skipped, entity already exists");
                Ok(true)
            }
            Err(e) => Err(SystemFailure::wrap(
                e,
                "datastore",
                "insert",
                "error writing to datastore",
            )),
        }
    }

    /// Load a single entity, `None` if no entity has this key
    pub async fn get(&self, key: &str) -> Result<Option<T>, SystemFailure> {
        let value = self
            .store
            .get(&self.key(key))
            .await
            .wrap_system("datastore", "get", "error reading from datastore")?;

        value.map(|entity| Self::decode(entity, "get")).transpose()
    }

    /// All entities matching the query
    pub async fn query(&self, query: &Query) -> Result<Vec<T>, SystemFailure> {
        let values = self
            .store
            .query(&self.namespace, query)
            .await
            .wrap_system("datastore", "query", "error reading from datastore")?;

        values
            .into_iter()
            .map(|entity| Self::decode(entity, "query"))
            .collect()
    }

    /// Number of entities matching the query
    pub async fn count(&self, query: &Query) -> Result<usize, SystemFailure> {
        self.store
            .count(&self.namespace, query)
            .await
            .wrap_system("datastore", "count", "error reading from datastore")
    }

    pub async fn delete(&self, key: &str) -> Result<(), SystemFailure> {
        self.store
            .delete(&self.key(key))
            .await
            .wrap_system("datastore", "delete", "error deleting entity in datastore")
    }
}
