//! Source of verification key material.
//!
//! The trust authority publishes the JWK set that identity tokens are signed
//! against. [`KeyMaterialCache`](crate::KeyMaterialCache) talks to it through
//! the [`TrustAuthority`] trait so tests can substitute a local key set.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use reqwest::header::CACHE_CONTROL;

use crate::{
    config::AuthConfig,
    error::{AuthError, Result},
};

/// A key set as returned by the trust authority, before caching decisions.
#[derive(Debug, Clone)]
pub struct FetchedKeySet {
    /// Published public keys.
    pub keys: JwkSet,
    /// Raw `cache-control` response header, if present.
    pub cache_control: Option<String>,
}

/// Remote publisher of public signing keys.
#[async_trait]
pub trait TrustAuthority: Send + Sync {
    /// Fetches the current key set.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TrustAuthorityUnavailable`] if the authority
    /// cannot be reached or answers with something other than a key set.
    async fn fetch_key_set(&self) -> Result<FetchedKeySet>;
}

/// [`TrustAuthority`] that fetches a JWK set over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTrustAuthority {
    client: reqwest::Client,
    url: String,
}

impl HttpTrustAuthority {
    /// Creates an authority for `url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, url: url.into() })
    }

    /// Creates an authority from the JWK endpoint and timeout in `config`.
    ///
    /// # Errors
    ///
    /// See [`HttpTrustAuthority::new`].
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(config.jwks_url(), config.fetch_timeout())
    }

    /// Returns the endpoint this authority fetches from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TrustAuthority for HttpTrustAuthority {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch_key_set(&self) -> Result<FetchedKeySet> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            AuthError::trust_authority_unavailable(format!("request to {} failed: {e}", self.url))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::trust_authority_unavailable(format!(
                "key endpoint returned {status}"
            )));
        }

        let cache_control = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let keys = response.json::<JwkSet>().await.map_err(|e| {
            AuthError::trust_authority_unavailable(format!("malformed key set: {e}"))
        })?;

        Ok(FetchedKeySet { keys, cache_control })
    }
}
