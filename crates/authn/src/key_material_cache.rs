//! Key material cache for identity token verification.
//!
//! This module provides [`KeyMaterialCache`], which fronts a
//! [`TrustAuthority`] with a shared [`KeyValueCache`] so that most requests
//! verify tokens without a network round-trip to the authority.
//!
//! # Architecture
//!
//! ```text
//! verify token → get_key_material()
//!              → shared key-value cache (L1, honors authority max-age)
//!              → miss/expired? fetch from trust authority (L2)
//!              → parse cache-control max-age → TTL
//!              → TTL > 0? write L1 (failure logged, never fatal) + fallback (L3)
//!              → L2 unreachable? serve fallback copy if one exists
//! ```
//!
//! # Cache Strategy
//!
//! - **L1 TTL**: the authority's declared `max-age`; `0` means the fetch is used once and not
//!   cached anywhere
//! - **L3 Fallback TTL**: default 3600 seconds, bounds staleness during authority outages
//! - **Concurrency**: simultaneous misses each fetch and write; the last writer wins and all
//!   writers converge on the same published key set
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use mediagate_authn::{AuthConfig, HttpTrustAuthority, KeyMaterialCache};
//! use mediagate_storage::MemoryKeyValueCache;
//!
//! # async fn example() -> Result<(), mediagate_authn::AuthError> {
//! let config = AuthConfig::builder().project_id("my-project").build()?;
//! let authority = Arc::new(HttpTrustAuthority::from_config(&config)?);
//! let cache = KeyMaterialCache::from_config(&config, Arc::new(MemoryKeyValueCache::new()), authority);
//!
//! let material = cache.get_key_material().await?;
//! println!("{} keys, valid until {}", material.keys().keys.len(), material.expires_at());
//! # Ok(())
//! # }
//! ```

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use fail::fail_point;
use jsonwebtoken::{
    Algorithm, DecodingKey,
    jwk::{AlgorithmParameters, Jwk, JwkSet},
};
use mediagate_storage::KeyValueCache;
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::{
    config::{AuthConfig, DEFAULT_CACHE_KEY, DEFAULT_FALLBACK_TTL},
    error::{AuthError, Result},
    trust_authority::{FetchedKeySet, TrustAuthority},
    validation::algorithm_name,
};

/// Maximum number of fallback entries (one per cache key in practice).
const FALLBACK_CAPACITY: u64 = 16;

/// A published key set together with its freshness deadline.
///
/// This is also the envelope written to the key-value cache, so a reader
/// can re-check the deadline even if the cache service expires lazily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMaterial {
    keys: JwkSet,
    expires_at: DateTime<Utc>,
}

impl KeyMaterial {
    /// Creates key material that expires at `expires_at`.
    #[must_use]
    pub fn new(keys: JwkSet, expires_at: DateTime<Utc>) -> Self {
        Self { keys, expires_at }
    }

    /// Returns the published key set.
    #[must_use]
    pub fn keys(&self) -> &JwkSet {
        &self.keys
    }

    /// Returns the freshness deadline declared by the authority.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns `true` once `now` has reached the freshness deadline.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Selects the key that verifies a token with the given header `kid`
    /// and algorithm.
    ///
    /// Only RSA keys whose declared algorithm (if any) matches `alg` are
    /// candidates. With a `kid`, the candidate carrying that key ID is
    /// chosen. Without one, the set must hold exactly one candidate.
    ///
    /// # Errors
    ///
    /// - [`AuthError::KeyNotFound`] if no candidate matches
    /// - [`AuthError::InvalidTokenFormat`] if the token has no `kid` and several candidates exist
    pub fn select_key(&self, kid: Option<&str>, alg: Algorithm) -> Result<&Jwk> {
        let mut candidates = self.keys.keys.iter().filter(|jwk| is_usable_for(jwk, alg));

        match kid {
            Some(kid) => candidates
                .find(|jwk| jwk.common.key_id.as_deref() == Some(kid))
                .ok_or_else(|| AuthError::key_not_found(kid)),
            None => match (candidates.next(), candidates.next()) {
                (Some(jwk), None) => Ok(jwk),
                (None, _) => Err(AuthError::key_not_found("")),
                (Some(_), Some(_)) => Err(AuthError::invalid_token_format(
                    "token header has no 'kid' and the key set holds several keys",
                )),
            },
        }
    }

    /// Builds the decoding key for a token with the given `kid` and algorithm.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`select_key`](Self::select_key), or
    /// [`AuthError::InvalidPublicKey`] if the JWK cannot be converted.
    pub fn decoding_key(&self, kid: Option<&str>, alg: Algorithm) -> Result<DecodingKey> {
        let jwk = self.select_key(kid, alg)?;
        DecodingKey::from_jwk(jwk).map_err(|e| AuthError::invalid_public_key(e.to_string()))
    }
}

fn is_usable_for(jwk: &Jwk, alg: Algorithm) -> bool {
    if !matches!(jwk.algorithm, AlgorithmParameters::RSA(_)) {
        return false;
    }
    // `KeyAlgorithm` and `Algorithm` share variant names.
    jwk.common
        .key_algorithm
        .is_none_or(|declared| format!("{declared:?}") == algorithm_name(alg))
}

/// Parses the `max-age` directive out of a `cache-control` header value.
///
/// Directives are comma separated and case-insensitive. A missing header,
/// missing directive or unparseable value yields [`Duration::ZERO`]
/// (do not cache).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mediagate_authn::key_material_cache::parse_max_age;
///
/// assert_eq!(
///     parse_max_age(Some("public, max-age=19302, must-revalidate, no-transform")),
///     Duration::from_secs(19302)
/// );
/// assert_eq!(parse_max_age(Some("no-store")), Duration::ZERO);
/// assert_eq!(parse_max_age(None), Duration::ZERO);
/// ```
#[must_use]
pub fn parse_max_age(cache_control: Option<&str>) -> Duration {
    let Some(header) = cache_control else {
        return Duration::ZERO;
    };

    header
        .split(',')
        .filter_map(|directive| {
            let (name, value) = directive.trim().split_once('=')?;
            name.trim().eq_ignore_ascii_case("max-age").then(|| value.trim().trim_matches('"'))
        })
        .find_map(|value| {
            let digits = value.bytes().take_while(u8::is_ascii_digit).count();
            value[..digits].parse::<u64>().ok()
        })
        .map_or(Duration::ZERO, Duration::from_secs)
}

/// Fallback (L3) entry: the last fetched material and when it was fetched.
#[derive(Clone)]
struct FallbackEntry {
    material: Arc<KeyMaterial>,
    inserted_at: Instant,
}

/// Cache of the trust authority's published key material.
///
/// # Invariant
///
/// Key material is never served past its declared expiry without a refresh
/// attempt: expired L1 entries are treated as misses, and the fallback copy
/// is consulted only after the authority fails to answer.
///
/// # Failure Semantics
///
/// - Failure to *read* L1 is treated as a miss.
/// - Failure to *write* L1 is logged and does not fail the caller.
/// - Failure to *fetch* surfaces as [`AuthError::TrustAuthorityUnavailable`] only when no
///   fallback copy exists.
pub struct KeyMaterialCache {
    /// Shared key-value cache (L1).
    cache: Arc<dyn KeyValueCache>,
    /// Remote key publisher (L2).
    authority: Arc<dyn TrustAuthority>,
    /// Key under which the material is cached in L1 and L3.
    cache_key: String,
    /// Last fetched material, staleness-bounded (L3).
    fallback: Cache<String, FallbackEntry>,
}

impl KeyMaterialCache {
    /// Creates a cache with the default cache key and fallback TTL.
    #[must_use]
    pub fn new(cache: Arc<dyn KeyValueCache>, authority: Arc<dyn TrustAuthority>) -> Self {
        Self::with_fallback_ttl(cache, authority, DEFAULT_CACHE_KEY, DEFAULT_FALLBACK_TTL)
    }

    /// Creates a cache using the cache key and fallback TTL from `config`.
    #[must_use]
    pub fn from_config(
        config: &AuthConfig,
        cache: Arc<dyn KeyValueCache>,
        authority: Arc<dyn TrustAuthority>,
    ) -> Self {
        Self::with_fallback_ttl(cache, authority, config.cache_key(), config.fallback_ttl())
    }

    /// Creates a cache with a custom cache key and fallback staleness bound.
    ///
    /// # Security Trade-off
    ///
    /// - **Shorter `fallback_ttl`**: superseded keys stop being trusted sooner during an outage,
    ///   but verification fails sooner too
    /// - **Longer `fallback_ttl`**: more availability, but rotated-out keys remain trusted longer
    #[must_use]
    pub fn with_fallback_ttl(
        cache: Arc<dyn KeyValueCache>,
        authority: Arc<dyn TrustAuthority>,
        cache_key: impl Into<String>,
        fallback_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            authority,
            cache_key: cache_key.into(),
            fallback: Cache::builder()
                .time_to_live(fallback_ttl)
                .max_capacity(FALLBACK_CAPACITY)
                .build(),
        }
    }

    /// Returns current key material.
    ///
    /// Checks the shared cache first, then fetches from the trust authority
    /// on miss or expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TrustAuthorityUnavailable`] if the authority
    /// cannot be reached and no fallback copy exists.
    #[tracing::instrument(skip(self), fields(cache_key = %self.cache_key))]
    pub async fn get_key_material(&self) -> Result<Arc<KeyMaterial>> {
        // L1: shared cache
        if let Some(material) = self.read_cached().await {
            tracing::debug!(cache = "L1", "cache hit");
            return Ok(material);
        }
        tracing::debug!(cache = "L1", "cache miss");

        // L2: trust authority
        match self.fetch_from_authority().await {
            Ok(fetched) => Ok(self.store_fetched(fetched).await),
            Err(err) => {
                if let Some(entry) = self.fallback.get(&self.cache_key).await {
                    tracing::warn!(
                        cache = "L3",
                        fallback_age_secs = entry.inserted_at.elapsed().as_secs(),
                        error = %err,
                        "trust authority unavailable; serving fallback key material"
                    );
                    return Ok(entry.material);
                }
                Err(err)
            },
        }
    }

    /// Drops the in-process fallback copy.
    ///
    /// The shared cache entry is left to expire on its own TTL.
    #[tracing::instrument(skip(self), fields(cache_key = %self.cache_key))]
    pub async fn invalidate(&self) {
        self.fallback.invalidate(&self.cache_key).await;
        tracing::info!(
            audit.action = "invalidate_key_material",
            audit.resource = %self.cache_key,
            audit.result = "success",
            "audit_event"
        );
    }

    /// Returns the number of fallback entries.
    ///
    /// Note: This count is eventually consistent. For accurate counts in
    /// tests, call `sync` first.
    #[must_use]
    pub fn fallback_entry_count(&self) -> u64 {
        self.fallback.entry_count()
    }

    async fn read_cached(&self) -> Option<Arc<KeyMaterial>> {
        let bytes = match self.cache.get(&self.cache_key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %err, "key material cache read failed; treating as miss");
                return None;
            },
        };

        let material: KeyMaterial = match serde_json::from_slice(&bytes) {
            Ok(material) => material,
            Err(err) => {
                tracing::warn!(error = %err, "cached key material is malformed; treating as miss");
                return None;
            },
        };

        // Wall clock: the envelope is shared with other processes.
        if material.is_expired_at(Utc::now()) {
            tracing::debug!(expires_at = %material.expires_at, "cached key material past deadline");
            return None;
        }

        Some(Arc::new(material))
    }

    async fn fetch_from_authority(&self) -> Result<FetchedKeySet> {
        fail_point!("key-material-before-fetch", |_| {
            Err(AuthError::trust_authority_unavailable("injected failure before fetch"))
        });
        tracing::info!("requesting key material from trust authority");
        self.authority.fetch_key_set().await
    }

    async fn store_fetched(&self, fetched: FetchedKeySet) -> Arc<KeyMaterial> {
        let now = Utc::now();
        let ttl = parse_max_age(fetched.cache_control.as_deref());
        let expires_at = deadline(now, ttl);
        let ttl = if expires_at == now { Duration::ZERO } else { ttl };

        let material = Arc::new(KeyMaterial::new(fetched.keys, expires_at));

        if ttl.is_zero() {
            tracing::info!(ttl_secs = 0, "key material fetched; not cached");
            return material;
        }

        tracing::info!(ttl_secs = ttl.as_secs(), "caching key material");

        match serde_json::to_vec(material.as_ref()) {
            Ok(encoded) => {
                if let Err(err) = self.cache.put(&self.cache_key, Bytes::from(encoded), ttl).await {
                    tracing::warn!(error = %err, "failed to write key material to cache");
                }
            },
            Err(err) => tracing::warn!(error = %err, "failed to encode key material for cache"),
        }

        self.fallback
            .insert(
                self.cache_key.clone(),
                FallbackEntry { material: Arc::clone(&material), inserted_at: Instant::now() },
            )
            .await;

        material
    }

    /// Synchronizes pending fallback cache operations.
    #[cfg(test)]
    pub async fn sync(&self) {
        self.fallback.run_pending_tasks().await;
    }
}

/// `now + ttl`, or `now` if the TTL does not fit in a timestamp.
fn deadline(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    i64::try_from(ttl.as_secs())
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(now)
}
