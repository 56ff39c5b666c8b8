//! Shared test utilities for object store and cache testing.
//!
//! Feature-gated behind `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! mediagate-storage = { path = "../storage", features = ["testutil"] }
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    backend::{KeyValueCache, ObjectStore},
    error::{StorageError, StorageResult},
    memory::{MemoryKeyValueCache, MemoryObjectStore},
    types::{ObjectMetadata, StoredObject},
};

/// Creates a [`MemoryObjectStore`] holding the given `(key, body)` pairs.
///
/// # Panics
///
/// Panics if an insert fails (the in-memory store never fails).
pub async fn populated_store(entries: &[(&str, &[u8])]) -> MemoryObjectStore {
    let store = MemoryObjectStore::new();
    for (key, body) in entries {
        store
            .put(key, Bytes::copy_from_slice(body), None)
            .await
            .expect("in-memory put cannot fail");
    }
    store
}

/// Key-value cache wrapper whose reads and writes can be switched to fail.
///
/// Failures surface as [`StorageError::Connection`], matching an
/// unreachable cache service.
#[derive(Clone, Default)]
pub struct FaultyKeyValueCache {
    inner: MemoryKeyValueCache,
    fail_get: Arc<AtomicBool>,
    fail_put: Arc<AtomicBool>,
    put_attempts: Arc<AtomicUsize>,
}

impl FaultyKeyValueCache {
    /// Creates a cache that initially behaves like [`MemoryKeyValueCache`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `get` fail (or succeed again).
    pub fn set_fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `put` fail (or succeed again).
    pub fn set_fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    /// Number of `put` calls observed, successful or not.
    #[must_use]
    pub fn put_attempts(&self) -> usize {
        self.put_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueCache for FaultyKeyValueCache {
    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StorageError::connection("injected cache read failure"));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: Bytes, ttl: Duration) -> StorageResult<()> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StorageError::connection("injected cache write failure"));
        }
        self.inner.put(key, value, ttl).await
    }
}

/// Object store wrapper whose reads and deletes can be switched to fail.
#[derive(Clone, Default)]
pub struct FaultyObjectStore {
    inner: MemoryObjectStore,
    fail_reads: Arc<AtomicBool>,
    fail_delete: Arc<AtomicBool>,
}

impl FaultyObjectStore {
    /// Wraps an existing in-memory store.
    #[must_use]
    pub fn wrap(inner: MemoryObjectStore) -> Self {
        Self { inner, fail_reads: Arc::default(), fail_delete: Arc::default() }
    }

    /// Makes every subsequent `get` and `head` fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `delete` fail (or succeed again).
    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Returns the wrapped store.
    #[must_use]
    pub fn inner(&self) -> &MemoryObjectStore {
        &self.inner
    }
}

#[async_trait]
impl ObjectStore for FaultyObjectStore {
    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::connection("injected store read failure"));
        }
        self.inner.get(key).await
    }

    async fn head(&self, key: &str) -> StorageResult<Option<ObjectMetadata>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::connection("injected store read failure"));
        }
        self.inner.head(key).await
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<ObjectMetadata> {
        self.inner.put(key, body, content_type).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::timeout());
        }
        self.inner.delete(key).await
    }

    async fn list(&self, limit: usize) -> StorageResult<Vec<ObjectMetadata>> {
        self.inner.list(limit).await
    }
}
