//! Write-once file uploads to object store buckets
//!
//! [`StorageClient::put_file`] uploads a file only if no object with the
//! same name exists yet, then grants the requested access. Uploads are
//! typically named by content hash (see `dusted_common::hash`), so an
//! existing object already holds the same bytes.
//!
//! The bucket backend is abstracted by the [`ObjectStore`] trait:
//! - a cloud storage adapter in production
//! - [`MemoryObjectStore`] for tests and local development

use std::error::Error as StdError;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use dusted_fault::{ResultExt, SystemFailure};

pub mod mock;

pub use mock::MemoryObjectStore;

/// Boxed error returned by object stores
pub type BoxError = Box<dyn StdError + Send + Sync>;

const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Metadata written with a new object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAttrs {
    pub content_type: String,
    pub cache_control: String,
}

/// Access control entry, e.g. entity `allUsers` with role `READER`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acl {
    pub entity: String,
    pub role: String,
}

impl Acl {
    pub fn new(entity: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            role: role.into(),
        }
    }

    /// Public read access
    pub fn public_read() -> Self {
        Self::new("allUsers", "READER")
    }
}

/// A bucketed object store
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Metadata of an object, `None` if it does not exist
    async fn attrs(&self, bucket: &str, name: &str) -> Result<Option<ObjectAttrs>, BoxError>;

    async fn write(
        &self,
        bucket: &str,
        name: &str,
        data: Vec<u8>,
        attrs: ObjectAttrs,
    ) -> Result<(), BoxError>;

    async fn set_acl(&self, bucket: &str, name: &str, acl: &Acl) -> Result<(), BoxError>;
}

/// A file to upload
#[derive(Debug, Clone)]
pub struct Upload<'a> {
    pub bucket: &'a str,
    pub name: &'a str,
    pub mime_type: &'a str,
    pub cache_control: &'a str,
    pub acl: Acl,
}

/// Uploads files to an [`ObjectStore`]
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
    write_timeout: Duration,
}

impl StorageClient {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Upper bound for writing the object and setting its ACL
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Upload a file unless an object with the same name already exists.
    ///
    /// Returns `true` when the file was written, `false` when the existing
    /// object was kept.
    pub async fn put_file<R: Read>(
        &self,
        upload: &Upload<'_>,
        file: &mut R,
    ) -> Result<bool, SystemFailure> {
        let existing = self
            .store
            .attrs(upload.bucket, upload.name)
            .await
            .wrap_system(
                "storage",
                "put_file",
                "error retrieving object's metadata from storage",
            )?;

        if existing.is_some() {
            tracing::debug!(bucket = upload.bucket, name = upload.name, "Object already exists, skipping upload");
            return Ok(false);
        }

        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .wrap_system("storage", "put_file", "error reading file")?;

        tokio::time::timeout(self.write_timeout, self.write(upload, data))
            .await
            .map_err(|_| {
                SystemFailure::new(
                    "storage",
                    "put_file",
                    format!("writing file to bucket '{}' timed out", upload.bucket),
                )
            })??;

        tracing::info!(bucket = upload.bucket, name = upload.name, "File uploaded");
        Ok(true)
    }

    async fn write(&self, upload: &Upload<'_>, data: Vec<u8>) -> Result<(), SystemFailure> {
        let attrs = ObjectAttrs {
            content_type: upload.mime_type.to_string(),
            cache_control: upload.cache_control.to_string(),
        };

        self.store
            .write(upload.bucket, upload.name, data, attrs)
            .await
            .wrap_system_with("storage", "put_file", || {
                format!("error writing file to storage bucket '{}'", upload.bucket)
            })?;

        self.store
            .set_acl(upload.bucket, upload.name, &upload.acl)
            .await
            .wrap_system("storage", "put_file", "error setting ACL on storage object")
    }
}
