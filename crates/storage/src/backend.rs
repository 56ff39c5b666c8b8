//! Capability traits for the blob store and the key-value cache.
//!
//! The media front and the key material cache only ever talk to storage
//! through these two traits. Production deployments plug in clients for a
//! hosted object store and a hosted key-value service; tests use the
//! in-memory implementations from [`memory`](crate::memory).
//!
//! # Design Philosophy
//!
//! - **Keys are strings**: object keys are `scope/owner/filename` paths
//! - **Async by default**: every call may suspend on network I/O
//! - **Absence is not an error**: lookups return `Ok(None)` for missing keys

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    error::StorageResult,
    types::{ObjectMetadata, StoredObject},
};

/// Blob store holding media objects.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`get`](ObjectStore::get) | Fetch body and metadata |
/// | [`head`](ObjectStore::head) | Fetch metadata only |
/// | [`put`](ObjectStore::put) | Write (or overwrite) an object |
/// | [`delete`](ObjectStore::delete) | Remove an object |
/// | [`list`](ObjectStore::list) | Enumerate objects in key order |
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use mediagate_storage::{MemoryObjectStore, ObjectStore};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let store = MemoryObjectStore::new();
///
/// store.put("public/alice/a.txt", Bytes::from("hi"), Some("text/plain")).await.unwrap();
/// let object = store.get("public/alice/a.txt").await.unwrap().unwrap();
/// assert_eq!(object.body, Bytes::from("hi"));
/// # });
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Retrieves an object by key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(object))` if the key exists
    /// - `Ok(None)` if the key doesn't exist
    /// - `Err(...)` on storage errors
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>>;

    /// Retrieves object metadata without the body.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn head(&self, key: &str) -> StorageResult<Option<ObjectMetadata>>;

    /// Stores an object, overwriting any existing object at `key`.
    ///
    /// Create-only semantics are enforced by callers, not by the store.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<ObjectMetadata>;

    /// Removes an object. Deleting a missing key is not an error.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Lists up to `limit` objects in ascending key order.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn list(&self, limit: usize) -> StorageResult<Vec<ObjectMetadata>>;
}

/// Shared key-value cache with per-entry expiration.
///
/// The cache is eventually consistent and shared across independent request
/// handlers. Concurrent writers to the same key are tolerated: the last
/// write wins.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Retrieves a value by key. Expired entries are reported as absent.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>>;

    /// Stores a value that expires `ttl` after the write.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn put(&self, key: &str, value: Bytes, ttl: Duration) -> StorageResult<()>;
}
