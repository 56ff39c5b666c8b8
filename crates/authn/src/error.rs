//! Authentication error types.
//!
//! This module defines errors that can occur while fetching key material and
//! verifying identity tokens. The lenient verification path never returns
//! them to callers; they exist so the strict path and logs can say *why* a
//! token was rejected.

use thiserror::Error;

/// Authentication errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`; new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Malformed JWT - cannot be decoded.
    #[error("Invalid token format: {0}")]
    InvalidTokenFormat(String),

    /// Token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Token not yet valid (nbf claim in future).
    #[error("Token not yet valid")]
    TokenNotYetValid,

    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Unknown or invalid issuer.
    #[error("Invalid issuer: {0}")]
    InvalidIssuer(String),

    /// Audience doesn't match expected value.
    #[error("Invalid audience: {0}")]
    InvalidAudience(String),

    /// Required claim is missing.
    #[error("Missing claim: {0}")]
    MissingClaim(String),

    /// Claim is present but fails a freshness or format check.
    #[error("Invalid claim {claim}: {reason}")]
    InvalidClaim {
        /// Claim name (e.g. `iat`, `auth_time`).
        claim: &'static str,
        /// Why the claim was rejected.
        reason: String,
    },

    /// Algorithm not in allowed list.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// No key in the current key set matches the token.
    #[error("Signing key not found: {kid}")]
    KeyNotFound {
        /// Key ID that was not found (empty when the token carried none).
        kid: String,
    },

    /// Invalid public key format.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Verifier configuration is incomplete or invalid.
    ///
    /// Raised per token when the trust-domain project identifier is not
    /// configured, and at construction for malformed configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The trust authority could not be reached and no usable key material
    /// was cached.
    #[error("Trust authority unavailable: {0}")]
    TrustAuthorityUnavailable(String),
}

impl AuthError {
    /// Creates an [`AuthError::InvalidTokenFormat`].
    #[must_use]
    pub fn invalid_token_format(message: impl Into<String>) -> Self {
        Self::InvalidTokenFormat(message.into())
    }

    /// Creates an [`AuthError::MissingClaim`].
    #[must_use]
    pub fn missing_claim(claim: impl Into<String>) -> Self {
        Self::MissingClaim(claim.into())
    }

    /// Creates an [`AuthError::InvalidClaim`].
    #[must_use]
    pub fn invalid_claim(claim: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidClaim { claim, reason: reason.into() }
    }

    /// Creates an [`AuthError::KeyNotFound`].
    #[must_use]
    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyNotFound { kid: kid.into() }
    }

    /// Creates an [`AuthError::InvalidPublicKey`].
    #[must_use]
    pub fn invalid_public_key(message: impl Into<String>) -> Self {
        Self::InvalidPublicKey(message.into())
    }

    /// Creates an [`AuthError::Configuration`].
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an [`AuthError::TrustAuthorityUnavailable`].
    #[must_use]
    pub fn trust_authority_unavailable(message: impl Into<String>) -> Self {
        Self::TrustAuthorityUnavailable(message.into())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidToken => {
                AuthError::InvalidTokenFormat("Invalid JWT structure".into())
            },
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            ErrorKind::InvalidAudience => {
                AuthError::InvalidAudience("Audience validation failed".into())
            },
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer("Issuer validation failed".into()),
            ErrorKind::InvalidAlgorithm => {
                AuthError::UnsupportedAlgorithm("Algorithm not supported".into())
            },
            ErrorKind::MissingRequiredClaim(claim) => AuthError::MissingClaim(claim.clone()),
            ErrorKind::InvalidRsaKey(msg) => AuthError::InvalidPublicKey(msg.clone()),
            ErrorKind::InvalidKeyFormat => AuthError::InvalidPublicKey("Invalid key format".into()),
            _ => AuthError::InvalidTokenFormat(format!("JWT error: {}", err)),
        }
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
