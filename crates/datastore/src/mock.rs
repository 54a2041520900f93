//! In-Memory Entity Store
//!
//! Keeps entities in a sorted map so query results without an explicit
//! order come back by key. Thread-safe via `Arc<Mutex<>>`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::{EntityStore, Key, Query, StoreError};

/// Entity store backed by a map, for tests and local development
#[derive(Debug, Clone, Default)]
pub struct MemoryEntityStore {
    entities: Arc<Mutex<BTreeMap<Key, Value>>>,
    failure: Option<String>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every operation with the given backend message
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of stored entities across all namespaces and kinds
    pub fn len(&self) -> usize {
        self.entities
            .lock()
            .expect("entities lock poisoned, a prior test panicked")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entities(&self) -> Result<MutexGuard<'_, BTreeMap<Key, Value>>, StoreError> {
        if let Some(message) = &self.failure {
            return Err(StoreError::Backend(message.clone()));
        }
        self.entities
            .lock()
            .map_err(|e| StoreError::Backend(format!("entities lock poisoned: {e}")))
    }

    fn select(&self, namespace: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        let entities = self.entities()?;

        let mut found: Vec<Value> = entities
            .iter()
            .filter(|(key, _)| key.namespace == namespace && key.kind == query.kind)
            .filter(|(_, entity)| query.matches(entity))
            .map(|(_, entity)| entity.clone())
            .collect();

        found.sort_by(|a, b| query.cmp_entities(a, b));
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }
}

#[async_trait::async_trait]
impl EntityStore for MemoryEntityStore {
    async fn put(&self, key: &Key, entity: Value) -> Result<(), StoreError> {
        self.entities()?.insert(key.clone(), entity);
        Ok(())
    }

    async fn insert(&self, key: &Key, entity: Value) -> Result<(), StoreError> {
        let mut entities = self.entities()?;
        if entities.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        entities.insert(key.clone(), entity);
        Ok(())
    }

    async fn get(&self, key: &Key) -> Result<Option<Value>, StoreError> {
        Ok(self.entities()?.get(key).cloned())
    }

    async fn query(&self, namespace: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        self.select(namespace, query)
    }

    async fn count(&self, namespace: &str, query: &Query) -> Result<usize, StoreError> {
        Ok(self.select(namespace, query)?.len())
    }

    async fn delete(&self, key: &Key) -> Result<(), StoreError> {
        self.entities()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, Operator};
    use serde_json::json;

    fn key(namespace: &str, kind: &str, name: &str) -> Key {
        Key {
            namespace: namespace.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_existing_key() {
        let store = MemoryEntityStore::new();
        let jane = key("app", "User", "jane");

        store.insert(&jane, json!({ "n": 1 })).await.unwrap();
        let err = store.insert(&jane, json!({ "n": 2 })).await.unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists(ref k) if k == "app/User/jane"));
        assert_eq!(store.get(&jane).await.unwrap(), Some(json!({ "n": 1 })));
    }

    #[tokio::test]
    async fn test_query_filters_kind_orders_and_limits() {
        let store = MemoryEntityStore::new();
        for (name, visits) in [("a", 3), ("b", 9), ("c", 6)] {
            store
                .put(&key("app", "User", name), json!({ "visits": visits }))
                .await
                .unwrap();
        }
        store
            .put(&key("app", "Team", "t"), json!({ "visits": 100 }))
            .await
            .unwrap();

        let query = Query::new("User")
            .filter("visits", Operator::GreaterThan, 2)
            .order("visits", Direction::Descending)
            .limit(2);

        assert_eq!(
            store.query("app", &query).await.unwrap(),
            vec![json!({ "visits": 9 }), json!({ "visits": 6 })]
        );
        assert_eq!(store.count("app", &Query::new("User")).await.unwrap(), 3);
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = MemoryEntityStore::new().failing("unavailable");

        let err = store.get(&key("app", "User", "jane")).await.unwrap_err();

        assert_eq!(err.to_string(), "datastore backend error: unavailable");
    }
}
