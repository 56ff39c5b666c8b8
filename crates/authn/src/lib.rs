//! # Mediagate Authentication
//!
//! Identity token verification for the media front.
//!
//! This crate provides:
//! - **Token verification**: Bearer extraction, RS256 signature, audience/issuer and strict
//!   freshness checks ([`TokenVerifier`])
//! - **Key material cache**: trust-authority JWK set cached for the authority-declared
//!   `max-age`, with a bounded in-process fallback for outages ([`KeyMaterialCache`])
//! - **Algorithm validation**: Security checks for JWT algorithms
//!
//! ## Features
//!
//! - Only RSA signatures are supported
//! - Symmetric algorithms (HS256, etc.) and `none` are explicitly rejected
//! - Verification failures degrade to "no identity" on the default path
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mediagate_authn::{AuthConfig, HttpTrustAuthority, KeyMaterialCache, TokenVerifier};
//! use mediagate_storage::MemoryKeyValueCache;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig::builder().project_id("my-project").build()?;
//! let authority = Arc::new(HttpTrustAuthority::from_config(&config)?);
//! let keys = KeyMaterialCache::from_config(&config, Arc::new(MemoryKeyValueCache::new()), authority);
//! let verifier = TokenVerifier::new(config, Arc::new(keys))?;
//!
//! let identity = verifier.verify_strict("eyJhbGciOiJSUzI1NiIsImtpZCI6Ii4uLiJ9...").await?;
//! println!("Verified subject: {}", identity.subject_id());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Verifier configuration.
pub mod config;
/// Authentication error types.
pub mod error;
/// Identity token verification.
pub mod jwt;
/// Trust-authority key material cache.
pub mod key_material_cache;
/// Shared test utilities (requires `testutil` feature).
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
/// Source of verification key material.
pub mod trust_authority;
/// Algorithm validation.
pub mod validation;

// Re-export key types for convenience
pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use jwt::{IdTokenClaims, Identity, TokenVerifier, extract_bearer_token};
pub use key_material_cache::{KeyMaterial, KeyMaterialCache};
pub use trust_authority::{FetchedKeySet, HttpTrustAuthority, TrustAuthority};
pub use validation::{ACCEPTED_ALGORITHMS, FORBIDDEN_ALGORITHMS, validate_algorithm};
