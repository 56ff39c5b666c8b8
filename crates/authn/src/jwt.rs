//! Identity token verification.
//!
//! This module turns a caller-supplied `Authorization` header into an
//! authenticated [`Identity`], or nothing.
//!
//! # Pipeline
//!
//! 1. [`extract_bearer_token`] pulls the token out of `Bearer <token>`
//! 2. The trust-domain project id must be configured ([`AuthError::Configuration`] otherwise)
//! 3. The header algorithm must equal the configured one, and the header `kid` selects a key from
//!    the [`KeyMaterialCache`]
//! 4. Signature, audience (`project_id`) and issuer (`{issuer_prefix}{project_id}`) are checked
//!    by `jsonwebtoken`, as are `exp` and `nbf` when the token carries them
//! 5. [`validate_identity_claims`] applies the strict freshness checks on `iat` and `auth_time`
//!    and requires a non-empty `sub`
//!
//! [`TokenVerifier::verify_strict`] reports the failure reason;
//! [`TokenVerifier::verify`] and [`TokenVerifier::authenticate`] degrade
//! every failure to `None`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mediagate_authn::{AuthConfig, HttpTrustAuthority, KeyMaterialCache, TokenVerifier};
//! use mediagate_storage::MemoryKeyValueCache;
//!
//! # async fn example(header: Option<&str>) -> Result<(), mediagate_authn::AuthError> {
//! let config = AuthConfig::builder().project_id("my-project").build()?;
//! let authority = Arc::new(HttpTrustAuthority::from_config(&config)?);
//! let keys = KeyMaterialCache::from_config(&config, Arc::new(MemoryKeyValueCache::new()), authority);
//! let verifier = TokenVerifier::new(config, Arc::new(keys))?;
//!
//! match verifier.authenticate(header).await {
//!     Some(identity) => println!("caller: {}", identity.subject_id()),
//!     None => println!("anonymous"),
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{Header, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    error::{AuthError, Result},
    key_material_cache::KeyMaterialCache,
    validation::algorithm_name,
};

/// Claims carried by an identity token.
///
/// Only the fields the verifier inspects are modelled; anything else in the
/// payload is ignored. Timestamps are JSON numeric dates and may be
/// fractional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer, `https://securetoken.google.com/{project_id}`.
    pub iss: String,
    /// Audience, the project id.
    pub aud: String,
    /// Subject, the caller's user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Issued at (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<f64>,
    /// Time the user authenticated (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<f64>,
    /// Expiration time (seconds since epoch). Checked by `jsonwebtoken` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<f64>,
    /// Email address, when the identity provider shares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// An authenticated caller.
///
/// Only produced by successful verification; scoped to a single request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    subject_id: String,
}

impl Identity {
    pub(crate) fn new(subject_id: impl Into<String>) -> Self {
        Self { subject_id: subject_id.into() }
    }

    /// Builds an identity without a token, for tests of code that consumes identities.
    #[cfg(any(test, feature = "testutil"))]
    #[must_use]
    pub fn for_subject(subject_id: impl Into<String>) -> Self {
        Self::new(subject_id)
    }

    /// Returns the verified subject (user id).
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }
}

/// Extracts the token from a `Bearer <token>` credential.
///
/// The scheme is case-sensitive and must be followed by at least one
/// whitespace character. Returns `None` for anything else.
///
/// # Examples
///
/// ```
/// use mediagate_authn::jwt::extract_bearer_token;
///
/// assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
/// assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
/// assert_eq!(extract_bearer_token("Bearer "), None);
/// ```
#[must_use]
pub fn extract_bearer_token(credential: &str) -> Option<&str> {
    let rest = credential.strip_prefix("Bearer")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let token = rest.trim_start();
    (!token.is_empty() && !token.contains(['\r', '\n'])).then_some(token)
}

/// Decode JWT header without verification.
///
/// # Errors
///
/// Returns [`AuthError::InvalidTokenFormat`] if the header cannot be decoded
/// or names an algorithm `jsonwebtoken` does not know (including `none`).
pub fn decode_jwt_header(token: &str) -> Result<Header> {
    decode_header(token)
        .map_err(|e| AuthError::invalid_token_format(format!("Failed to decode JWT header: {e}")))
}

/// Decode identity token claims without verification.
///
/// For diagnostics only; nothing decoded here is trusted.
///
/// # Errors
///
/// Returns [`AuthError::InvalidTokenFormat`] if the token does not have
/// three parts, or the payload is not base64url-encoded claims JSON.
pub fn decode_unverified_claims(token: &str) -> Result<IdTokenClaims> {
    let mut parts = token.split('.');
    let (Some(_), Some(payload), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::invalid_token_format("JWT must have 3 parts separated by dots"));
    };

    let payload_bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|e| {
        AuthError::invalid_token_format(format!("Failed to decode JWT payload: {e}"))
    })?;

    serde_json::from_slice(&payload_bytes)
        .map_err(|e| AuthError::invalid_token_format(format!("Failed to parse JWT claims: {e}")))
}

/// Applies the freshness and subject checks to signature-verified claims.
///
/// `now_ms` is the current time in milliseconds since the epoch.
///
/// - `iat` must be present, non-zero and strictly before `now_ms`
/// - `auth_time` must be present, non-zero and strictly before `now_ms`
/// - `sub` must be present and non-empty
///
/// A claim timestamp equal to the current instant is rejected.
///
/// # Errors
///
/// Returns [`AuthError::MissingClaim`] or [`AuthError::InvalidClaim`]
/// naming the first failing claim.
pub fn validate_identity_claims(claims: &IdTokenClaims, now_ms: i64) -> Result<Identity> {
    check_in_past("iat", claims.iat, now_ms)?;
    check_in_past("auth_time", claims.auth_time, now_ms)?;

    match claims.sub.as_deref() {
        Some(sub) if !sub.is_empty() => Ok(Identity::new(sub)),
        _ => Err(AuthError::missing_claim("sub")),
    }
}

fn check_in_past(claim: &'static str, value: Option<f64>, now_ms: i64) -> Result<()> {
    let secs = value.filter(|secs| secs.abs() > 0.0).ok_or_else(|| AuthError::missing_claim(claim))?;

    // Millisecond timestamps fit in an f64 mantissa.
    let now_ms = now_ms as f64;
    if secs.is_finite() && secs * 1_000.0 < now_ms {
        Ok(())
    } else {
        Err(AuthError::invalid_claim(claim, format!("{secs} is not before the current time")))
    }
}

/// Verifies identity tokens against a [`KeyMaterialCache`].
///
/// Construct once at startup and share; the verifier holds no per-request
/// state.
pub struct TokenVerifier {
    config: AuthConfig,
    keys: Arc<KeyMaterialCache>,
}

impl TokenVerifier {
    /// Creates a verifier.
    ///
    /// An absent project id is accepted here; every verification then fails
    /// with [`AuthError::Configuration`].
    ///
    /// # Errors
    ///
    /// Returns the errors of [`AuthConfig::validate`] for a malformed
    /// configuration.
    pub fn new(config: AuthConfig, keys: Arc<KeyMaterialCache>) -> Result<Self> {
        config.validate()?;
        if config.project_id().is_none() {
            tracing::warn!("project_id is not configured; every token will be rejected");
        }
        Ok(Self { config, keys })
    }

    /// Returns the verifier configuration.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Resolves the caller from an optional `Authorization` header value.
    ///
    /// Absent or non-bearer credentials yield `None` without touching key
    /// material.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Option<Identity> {
        let token = authorization.and_then(extract_bearer_token)?;
        self.verify(token).await
    }

    /// Verifies a token, degrading every failure to `None`.
    #[tracing::instrument(skip(self, token))]
    pub async fn verify(&self, token: &str) -> Option<Identity> {
        match self.verify_strict(token).await {
            Ok(identity) => Some(identity),
            Err(err) => {
                tracing::debug!(error = %err, "token rejected");
                None
            },
        }
    }

    /// Verifies a token, reporting why it was rejected.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Configuration`] if no project id is configured
    /// - [`AuthError::TrustAuthorityUnavailable`] if no key material can be obtained
    /// - any signature, audience, issuer, expiry, not-before or claim error for the token itself
    #[tracing::instrument(skip(self, token))]
    pub async fn verify_strict(&self, token: &str) -> Result<Identity> {
        self.verify_at(token, Utc::now().timestamp_millis()).await
    }

    /// Like [`verify_strict`](Self::verify_strict), with an explicit current
    /// time in milliseconds for the freshness checks.
    ///
    /// `exp` and `nbf` are still checked by `jsonwebtoken` against the system
    /// clock.
    ///
    /// # Errors
    ///
    /// See [`verify_strict`](Self::verify_strict).
    pub async fn verify_at(&self, token: &str, now_ms: i64) -> Result<Identity> {
        let project_id = self
            .config
            .project_id()
            .ok_or_else(|| AuthError::configuration("project_id is not configured"))?;
        let issuer = self.config.issuer().unwrap_or_default();
        let algorithm = self.config.algorithm();

        let header = decode_jwt_header(token)?;
        if header.alg != algorithm {
            return Err(AuthError::UnsupportedAlgorithm(format!(
                "token uses '{}', expected '{}'",
                algorithm_name(header.alg),
                algorithm_name(algorithm)
            )));
        }

        let material = self.keys.get_key_material().await?;
        let decoding_key = material.decoding_key(header.kid.as_deref(), algorithm)?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["iss", "aud"]);
        validation.set_audience(&[project_id]);
        validation.set_issuer(&[issuer.as_str()]);

        let claims = decode::<IdTokenClaims>(token, &decoding_key, &validation)?.claims;
        let identity = validate_identity_claims(&claims, now_ms)?;

        tracing::debug!(kid = header.kid.as_deref().unwrap_or(""), "token verified");
        Ok(identity)
    }
}
