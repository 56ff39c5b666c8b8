//! In-memory implementations of [`ObjectStore`] and [`KeyValueCache`].
//!
//! Both are intended for testing and local development.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Ordered storage**: Keys are kept in a [`BTreeMap`] so listing is sorted
//! - **TTL support**: Cache entries expire lazily on read
//!
//! # Time Source
//!
//! Expiry uses [`tokio::time::Instant`], so tests may pause and advance the
//! Tokio clock to cross TTL boundaries without sleeping.
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - Expired cache entries are removed when next read, not proactively

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::time::Instant;

use crate::{
    backend::{KeyValueCache, ObjectStore},
    error::StorageResult,
    types::{ObjectMetadata, StoredObject},
};

/// In-memory object store backed by a [`BTreeMap`].
///
/// # Cloning
///
/// `MemoryObjectStore` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying data.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

impl MemoryObjectStore {
    /// Creates an empty in-memory object store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Returns `true` if no objects are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Returns `true` if an object exists at `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        Ok(self.objects.read().get(key).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn head(&self, key: &str) -> StorageResult<Option<ObjectMetadata>> {
        Ok(self.objects.read().get(key).map(|object| object.metadata.clone()))
    }

    #[tracing::instrument(skip(self, body), fields(size = body.len()))]
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<ObjectMetadata> {
        let metadata = ObjectMetadata {
            key: key.to_owned(),
            size: body.len() as u64,
            content_type: content_type.map(str::to_owned),
            uploaded: Utc::now(),
        };
        self.objects
            .write()
            .insert(key.to_owned(), StoredObject { metadata: metadata.clone(), body });
        Ok(metadata)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.write().remove(key);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, limit: usize) -> StorageResult<Vec<ObjectMetadata>> {
        Ok(self
            .objects
            .read()
            .values()
            .take(limit)
            .map(|object| object.metadata.clone())
            .collect())
    }
}

/// Stand-in expiry for TTLs beyond what [`Instant`] can represent.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Clone)]
struct CacheEntry {
    value: Bytes,
    expires_at: Instant,
}

/// In-memory key-value cache with per-entry TTL.
///
/// A zero TTL produces an entry that is already expired on the next read.
#[derive(Clone, Default)]
pub struct MemoryKeyValueCache {
    entries: Arc<RwLock<BTreeMap<String, CacheEntry>>>,
}

impl MemoryKeyValueCache {
    /// Creates an empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries that have not yet expired.
    #[must_use]
    pub fn live_entry_count(&self) -> usize {
        let now = Instant::now();
        self.entries.read().values().filter(|entry| entry.expires_at > now).count()
    }
}

#[async_trait]
impl KeyValueCache for MemoryKeyValueCache {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {},
                None => return Ok(None),
            }
        }

        // Expired: drop it so the map does not grow without bound.
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    #[tracing::instrument(skip(self, value), fields(ttl_secs = ttl.as_secs()))]
    async fn put(&self, key: &str, value: Bytes, ttl: Duration) -> StorageResult<()> {
        let now = Instant::now();
        // Saturate instead of panicking on overflow.
        let expires_at = now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE);
        self.entries.write().insert(key.to_owned(), CacheEntry { value, expires_at });
        Ok(())
    }
}
