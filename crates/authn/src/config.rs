//! Verifier configuration.
//!
//! [`AuthConfig`] is validated once, when it is built (or when a verifier is
//! constructed from a deserialized copy), never per request.

use std::time::Duration;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AuthError, Result},
    validation::{algorithm_name, validate_algorithm},
};

/// Default issuer prefix; the project identifier is appended to it.
pub const DEFAULT_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Default JWK set endpoint of the trust authority.
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Default key under which key material is stored in the key-value cache.
pub const DEFAULT_CACHE_KEY: &str = "jwks";

/// Default staleness bound for the in-process fallback copy (1 hour).
pub const DEFAULT_FALLBACK_TTL: Duration = Duration::from_secs(3_600);

/// Default request timeout for key material fetches (5 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`TokenVerifier`](crate::TokenVerifier) and
/// [`KeyMaterialCache`](crate::KeyMaterialCache).
///
/// # Trust Domain
///
/// The `project_id` identifies the trust domain. Tokens must carry it as
/// their audience and `{issuer_prefix}{project_id}` as their issuer. When it
/// is absent every verification fails with [`AuthError::Configuration`],
/// which the lenient path reports as "no identity".
///
/// # Example
///
/// ```
/// use mediagate_authn::AuthConfig;
///
/// let config = AuthConfig::builder().project_id("my-project").build()?;
/// assert_eq!(config.issuer().as_deref(), Some("https://securetoken.google.com/my-project"));
/// # Ok::<(), mediagate_authn::AuthError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Trust-domain project identifier.
    #[serde(default)]
    pub(crate) project_id: Option<String>,

    /// Issuer prefix; the expected issuer is this plus the project id.
    #[serde(default = "default_issuer_prefix")]
    pub(crate) issuer_prefix: String,

    /// JWK set endpoint of the trust authority.
    #[serde(default = "default_jwks_url")]
    pub(crate) jwks_url: String,

    /// Signature algorithm every token must use.
    #[serde(default = "default_algorithm")]
    pub(crate) algorithm: Algorithm,

    /// Key under which key material is cached.
    #[serde(default = "default_cache_key")]
    pub(crate) cache_key: String,

    /// Maximum staleness of the in-process fallback copy.
    #[serde(with = "humantime_serde", default = "default_fallback_ttl")]
    pub(crate) fallback_ttl: Duration,

    /// Timeout for a single key material fetch.
    #[serde(with = "humantime_serde", default = "default_fetch_timeout")]
    pub(crate) fetch_timeout: Duration,
}

fn default_issuer_prefix() -> String {
    DEFAULT_ISSUER_PREFIX.to_owned()
}

fn default_jwks_url() -> String {
    DEFAULT_JWKS_URL.to_owned()
}

fn default_algorithm() -> Algorithm {
    Algorithm::RS256
}

fn default_cache_key() -> String {
    DEFAULT_CACHE_KEY.to_owned()
}

fn default_fallback_ttl() -> Duration {
    DEFAULT_FALLBACK_TTL
}

fn default_fetch_timeout() -> Duration {
    DEFAULT_FETCH_TIMEOUT
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            issuer_prefix: default_issuer_prefix(),
            jwks_url: default_jwks_url(),
            algorithm: default_algorithm(),
            cache_key: default_cache_key(),
            fallback_ttl: default_fallback_ttl(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

#[bon::bon]
impl AuthConfig {
    /// Creates a new configuration, validating every field.
    ///
    /// # Optional Fields
    ///
    /// * `project_id` - Trust-domain identifier (absent: every token is rejected).
    /// * `issuer_prefix` - Issuer prefix (default: [`DEFAULT_ISSUER_PREFIX`]).
    /// * `jwks_url` - JWK set endpoint (default: [`DEFAULT_JWKS_URL`]).
    /// * `algorithm` - Signature algorithm (default: RS256).
    /// * `cache_key` - Key-value cache key (default: [`DEFAULT_CACHE_KEY`]).
    /// * `fallback_ttl` - Fallback staleness bound (default: [`DEFAULT_FALLBACK_TTL`]).
    /// * `fetch_timeout` - Fetch timeout (default: [`DEFAULT_FETCH_TIMEOUT`]).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the project id is blank or
    /// malformed, a URL or cache key is empty, or the fetch timeout is zero,
    /// and [`AuthError::UnsupportedAlgorithm`] for a rejected algorithm.
    #[builder]
    pub fn new(
        #[builder(into)] project_id: Option<String>,
        #[builder(into, default = DEFAULT_ISSUER_PREFIX.to_owned())] issuer_prefix: String,
        #[builder(into, default = DEFAULT_JWKS_URL.to_owned())] jwks_url: String,
        #[builder(default = Algorithm::RS256)] algorithm: Algorithm,
        #[builder(into, default = DEFAULT_CACHE_KEY.to_owned())] cache_key: String,
        #[builder(default = DEFAULT_FALLBACK_TTL)] fallback_ttl: Duration,
        #[builder(default = DEFAULT_FETCH_TIMEOUT)] fetch_timeout: Duration,
    ) -> Result<Self> {
        let config = Self {
            project_id,
            issuer_prefix,
            jwks_url,
            algorithm,
            cache_key,
            fallback_ttl,
            fetch_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates a configuration, e.g. one obtained through deserialization.
    ///
    /// # Errors
    ///
    /// See [`AuthConfig::new`].
    pub fn validate(&self) -> Result<()> {
        if let Some(project_id) = &self.project_id {
            validate_project_id(project_id)?;
        }

        if self.issuer_prefix.is_empty() {
            return Err(AuthError::configuration("issuer_prefix cannot be empty"));
        }

        if self.jwks_url.is_empty() {
            return Err(AuthError::configuration("jwks_url cannot be empty"));
        }

        if self.cache_key.is_empty() {
            return Err(AuthError::configuration("cache_key cannot be empty"));
        }

        if self.fetch_timeout.is_zero() {
            return Err(AuthError::configuration("fetch_timeout must be non-zero"));
        }

        validate_algorithm(&algorithm_name(self.algorithm))
    }

    /// Returns the trust-domain project identifier, if configured.
    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Returns the expected audience (the project identifier).
    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        self.project_id()
    }

    /// Returns the expected issuer, if a project identifier is configured.
    #[must_use]
    pub fn issuer(&self) -> Option<String> {
        self.project_id().map(|id| format!("{}{}", self.issuer_prefix, id))
    }

    /// Returns the JWK set endpoint.
    #[must_use]
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Returns the configured signature algorithm.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the key-value cache key for key material.
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Returns the fallback staleness bound.
    #[must_use]
    pub fn fallback_ttl(&self) -> Duration {
        self.fallback_ttl
    }

    /// Returns the key material fetch timeout.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }
}

/// Project identifiers are non-empty and limited to ASCII letters, digits,
/// hyphens and underscores, so they embed safely in the issuer URL.
fn validate_project_id(project_id: &str) -> Result<()> {
    if project_id.trim().is_empty() {
        return Err(AuthError::configuration("project_id cannot be blank"));
    }

    if !project_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(AuthError::configuration(format!(
            "project_id '{project_id}' contains characters outside [A-Za-z0-9_-]"
        )));
    }

    Ok(())
}
