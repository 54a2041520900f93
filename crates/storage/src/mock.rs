//! In-Memory Object Store
//!
//! Captures written objects for test assertions.
//! Thread-safe via `Arc<Mutex<>>`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{Acl, BoxError, ObjectAttrs, ObjectStore};

/// Object captured by the in-memory store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub attrs: ObjectAttrs,
    pub acl: Vec<Acl>,
}

/// Store operation that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Attrs,
    Write,
    SetAcl,
}

/// Object store backed by a map, for tests and local development
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<(String, String), StoredObject>>>,
    failure: Option<(Operation, String)>,
    write_delay: Option<Duration>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the given operation with a message
    pub fn failing_on(mut self, operation: Operation, message: impl Into<String>) -> Self {
        self.failure = Some((operation, message.into()));
        self
    }

    /// Wait before each write completes
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// A stored object by bucket and name
    pub fn object(&self, bucket: &str, name: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .expect("objects lock poisoned, a prior test panicked")
            .get(&(bucket.to_string(), name.to_string()))
            .cloned()
    }

    /// Number of stored objects across all buckets
    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .expect("objects lock poisoned, a prior test panicked")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, operation: Operation) -> Result<(), BoxError> {
        match &self.failure {
            Some((failing, message)) if *failing == operation => Err(message.clone().into()),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn attrs(&self, bucket: &str, name: &str) -> Result<Option<ObjectAttrs>, BoxError> {
        self.check(Operation::Attrs)?;
        Ok(self.object(bucket, name).map(|object| object.attrs))
    }

    async fn write(
        &self,
        bucket: &str,
        name: &str,
        data: Vec<u8>,
        attrs: ObjectAttrs,
    ) -> Result<(), BoxError> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        self.check(Operation::Write)?;

        tracing::debug!(bucket, name, size = data.len(), "Memory store: recording object");
        self.objects
            .lock()
            .map_err(|e| format!("objects lock poisoned: {e}"))?
            .insert(
                (bucket.to_string(), name.to_string()),
                StoredObject {
                    data,
                    attrs,
                    acl: Vec::new(),
                },
            );
        Ok(())
    }

    async fn set_acl(&self, bucket: &str, name: &str, acl: &Acl) -> Result<(), BoxError> {
        self.check(Operation::SetAcl)?;

        let mut objects = self
            .objects
            .lock()
            .map_err(|e| format!("objects lock poisoned: {e}"))?;
        let object = objects
            .get_mut(&(bucket.to_string(), name.to_string()))
            .ok_or_else(|| format!("object '{bucket}/{name}' does not exist"))?;
        object.acl.push(acl.clone());
        Ok(())
    }
}
