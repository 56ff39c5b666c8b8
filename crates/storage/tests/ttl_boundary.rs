//! TTL boundary condition tests for `MemoryKeyValueCache`.
//!
//! Covers zero TTL, exact expiry boundaries, large TTLs and TTL replacement.
//! All tests run on a paused Tokio clock.

#![allow(clippy::expect_used, clippy::panic)]

use std::time::Duration;

use bytes::Bytes;
use mediagate_storage::{KeyValueCache, MemoryKeyValueCache};

// ============================================================================
// Zero TTL
// ============================================================================

/// A zero TTL stores an entry whose expiry equals the insertion instant, so
/// it is already gone on the next read.
#[tokio::test(start_paused = true)]
async fn test_zero_ttl_is_immediately_expired() {
    let cache = MemoryKeyValueCache::new();

    cache
        .put("zero-ttl", Bytes::from_static(b"ephemeral"), Duration::ZERO)
        .await
        .expect("put with zero duration should succeed");

    let result = cache.get("zero-ttl").await.expect("get should not error");
    assert_eq!(result, None, "a key with zero TTL should be expired on the next read");
}

// ============================================================================
// Expiry boundary
// ============================================================================

/// An entry is visible strictly before its deadline and absent at it.
#[tokio::test(start_paused = true)]
async fn test_expiry_boundary_is_exclusive() {
    let cache = MemoryKeyValueCache::new();
    cache.put("k", Bytes::from_static(b"v"), Duration::from_secs(3600)).await.expect("put");

    tokio::time::advance(Duration::from_secs(3599)).await;
    assert!(cache.get("k").await.expect("get").is_some(), "visible one second before expiry");

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(cache.get("k").await.expect("get").is_none(), "absent exactly at expiry");
}

/// Reading an expired entry removes it from the live count.
#[tokio::test(start_paused = true)]
async fn test_expired_entries_not_counted() {
    let cache = MemoryKeyValueCache::new();
    cache.put("short", Bytes::from_static(b"a"), Duration::from_secs(1)).await.expect("put");
    cache.put("long", Bytes::from_static(b"b"), Duration::from_secs(100)).await.expect("put");
    assert_eq!(cache.live_entry_count(), 2);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.live_entry_count(), 1);
    assert!(cache.get("short").await.expect("get").is_none());
}

// ============================================================================
// Large TTL
// ============================================================================

/// A large TTL must not overflow `Instant` arithmetic.
#[tokio::test(start_paused = true)]
async fn test_large_ttl_no_overflow() {
    let cache = MemoryKeyValueCache::new();
    let hundred_years = Duration::from_secs(100 * 365 * 24 * 3600);

    cache
        .put("long-lived", Bytes::from_static(b"value"), hundred_years)
        .await
        .expect("put with large TTL should succeed");

    let result = cache.get("long-lived").await.expect("get");
    assert_eq!(result, Some(Bytes::from_static(b"value")));
}

// ============================================================================
// TTL replacement
// ============================================================================

/// A second put replaces both the value and the deadline (last writer wins).
#[tokio::test(start_paused = true)]
async fn test_second_put_shortens_ttl() {
    let cache = MemoryKeyValueCache::new();
    cache.put("k", Bytes::from_static(b"old"), Duration::from_secs(3600)).await.expect("put");
    cache.put("k", Bytes::from_static(b"new"), Duration::from_secs(5)).await.expect("put");

    tokio::time::advance(Duration::from_secs(6)).await;
    assert!(cache.get("k").await.expect("get").is_none(), "shorter TTL of the last write applies");
}
