//! Media request handling.
//!
//! [`MediaRequestHandler`] turns one HTTP request into one terminal
//! response:
//!
//! ```text
//! host check → (development) GET /list
//!            → path → ResourceIdentifier          (400 on failure)
//!            → Authorization → Identity or anonymous
//!            → GET    : authorize read   → get     (403 / 404 / 200)
//!            → POST   : authorize write  → head    (403 / 400 "key already in use")
//!                       → put → best-effort delete of the replaced object → 200
//!            → DELETE : authorize delete → head    (403 / 404) → delete → 200
//!            → other  : 405
//! ```
//!
//! Store failures end the request with 500 and an error log.

use std::sync::Arc;

use bytes::Bytes;
use http::{
    HeaderName, HeaderValue, Method, Request, Response, StatusCode,
    header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HOST},
    request::Parts,
};
use mediagate_authn::{Identity, TokenVerifier};
use mediagate_storage::{ObjectStore, StorageError};

use crate::{
    access::{AccessOutcome, Operation},
    config::{Environment, ServiceConfig},
    error::{MediaError, Result, text_response},
    resource::ResourceIdentifier,
};

/// Request header naming an object (same scope and owner) to delete after a
/// successful write.
pub const REPLACE_HEADER: HeaderName = HeaderName::from_static("x-replace-filename");

/// Path of the development-only object listing.
pub const LIST_PATH: &str = "/list";

/// Serves media objects from an [`ObjectStore`] with per-object access
/// control.
///
/// Stateless per request; share one instance across requests.
pub struct MediaRequestHandler {
    config: ServiceConfig,
    verifier: Arc<TokenVerifier>,
    store: Arc<dyn ObjectStore>,
}

impl MediaRequestHandler {
    /// Creates a handler.
    #[must_use]
    pub fn new(
        config: ServiceConfig,
        verifier: Arc<TokenVerifier>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self { config, verifier, store }
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Handles one request.
    ///
    /// Never fails: every outcome, including store failures, is a response.
    #[tracing::instrument(
        skip_all,
        fields(method = %request.method(), path = %request.uri().path())
    )]
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let (parts, body) = request.into_parts();

        if !self.serves_host(&parts) {
            tracing::debug!("request for another host");
            return MediaError::NotFound.into_response();
        }

        if self.config.environment() == Environment::Development
            && parts.method == Method::GET
            && parts.uri.path() == LIST_PATH
        {
            return self.list().await.unwrap_or_else(failure_response);
        }

        let resource = match ResourceIdentifier::parse_path(parts.uri.path()) {
            Ok(resource) => resource,
            Err(err) => {
                tracing::warn!(error = %err, "invalid path");
                return err.into_response();
            },
        };

        let authorization = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let identity = self.verifier.authenticate(authorization).await;

        let result = match parts.method.clone() {
            Method::GET => self.get(&resource, identity.as_ref()).await,
            Method::POST => {
                let content_type = parts.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
                let replace = replace_target(&parts);
                self.create(&resource, identity.as_ref(), body, content_type, replace).await
            },
            Method::DELETE => self.delete(&resource, identity.as_ref()).await,
            other => Err(MediaError::MethodNotAllowed(other)),
        };

        result.unwrap_or_else(failure_response)
    }

    /// Reads an object.
    ///
    /// # Errors
    ///
    /// - [`MediaError::Forbidden`] if the caller may not read it
    /// - [`MediaError::NotFound`] if it does not exist
    /// - [`MediaError::Storage`] if the store fails
    #[tracing::instrument(skip(self, identity), fields(key = %resource.object_key()))]
    pub async fn get(
        &self,
        resource: &ResourceIdentifier,
        identity: Option<&Identity>,
    ) -> Result<Response<Bytes>> {
        authorize(resource, identity, Operation::Read)?;

        let object = self.store.get(&resource.object_key()).await?.ok_or(MediaError::NotFound)?;

        let size = object.size();
        let content_type =
            object.metadata.content_type.as_deref().and_then(|ct| HeaderValue::from_str(ct).ok());

        let mut response = Response::new(object.body);
        let headers = response.headers_mut();
        headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, content_type);
        }
        Ok(response)
    }

    /// Creates an object. Existing objects are never overwritten.
    ///
    /// When `replace` names another object, it is deleted after the write
    /// through the same rules as [`delete`](Self::delete). That deletion is
    /// best effort: its failure is logged and does not fail the write.
    ///
    /// # Errors
    ///
    /// - [`MediaError::Forbidden`] if the caller may not write it
    /// - [`MediaError::BadRequest`] if the key is already in use
    /// - [`MediaError::Storage`] if the store fails
    #[tracing::instrument(skip(self, identity, body), fields(key = %resource.object_key(), size = body.len()))]
    pub async fn create(
        &self,
        resource: &ResourceIdentifier,
        identity: Option<&Identity>,
        body: Bytes,
        content_type: Option<&str>,
        replace: Option<&str>,
    ) -> Result<Response<Bytes>> {
        authorize(resource, identity, Operation::Write)?;

        let key = resource.object_key();
        if self.store.head(&key).await?.is_some() {
            tracing::warn!(key = %key, "key already in use");
            return Err(MediaError::bad_request("key already in use"));
        }

        self.store.put(&key, body, content_type).await?;
        tracing::info!(key = %key, "object created");

        if let Some(name) = replace {
            self.delete_replaced(resource, identity, name).await;
        }

        Ok(ok_response())
    }

    /// Deletes an object.
    ///
    /// # Errors
    ///
    /// - [`MediaError::Forbidden`] if the caller is not the owner
    /// - [`MediaError::NotFound`] if it does not exist
    /// - [`MediaError::Storage`] if the store fails
    #[tracing::instrument(skip(self, identity), fields(key = %resource.object_key()))]
    pub async fn delete(
        &self,
        resource: &ResourceIdentifier,
        identity: Option<&Identity>,
    ) -> Result<Response<Bytes>> {
        authorize(resource, identity, Operation::Delete)?;

        let key = resource.object_key();
        if self.store.head(&key).await?.is_none() {
            return Err(MediaError::NotFound);
        }

        self.store.delete(&key).await?;
        tracing::info!(key = %key, "object deleted");
        Ok(ok_response())
    }

    /// Lists up to `list_limit` object metadata records as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Storage`] if the store fails.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Response<Bytes>> {
        let objects = self.store.list(self.config.list_limit()).await?;
        let body = serde_json::to_vec_pretty(&objects).map_err(|e| {
            StorageError::serialization_with_source("failed to encode object listing", e)
        })?;

        let mut response = Response::new(Bytes::from(body));
        let body_len = response.body().len();
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body_len));
        Ok(response)
    }

    async fn delete_replaced(
        &self,
        written: &ResourceIdentifier,
        identity: Option<&Identity>,
        name: &str,
    ) {
        let target = match written.with_name(name) {
            Ok(target) => target,
            Err(err) => {
                tracing::error!(replace = name, error = %err, "invalid replace target");
                return;
            },
        };

        if target == *written {
            tracing::warn!(key = %target.object_key(), "replace target is the new object; skipped");
            return;
        }

        match self.delete(&target, identity).await {
            Ok(_) => tracing::info!(key = %target.object_key(), "replaced object deleted"),
            Err(err) => tracing::error!(
                key = %target.object_key(),
                status = err.status().as_u16(),
                error = %err,
                "failed to delete replaced object"
            ),
        }
    }

    fn serves_host(&self, parts: &Parts) -> bool {
        match (self.config.cdn_host(), request_host(parts)) {
            (None, _) => true,
            (Some(_), Some(host)) => self.config.answers_host(host),
            (Some(_), None) => false,
        }
    }
}

fn authorize(
    resource: &ResourceIdentifier,
    identity: Option<&Identity>,
    operation: Operation,
) -> Result<()> {
    match resource.authorize(identity, operation) {
        AccessOutcome::Allowed => Ok(()),
        AccessOutcome::Forbidden => {
            tracing::debug!(?operation, authenticated = identity.is_some(), "access denied");
            Err(MediaError::Forbidden)
        },
    }
}

fn replace_target(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(REPLACE_HEADER)?;
    match value.to_str() {
        Ok(name) => Some(name),
        Err(_) => {
            tracing::error!("replace header is not valid UTF-8; ignored");
            None
        },
    }
}

/// Host name of the request, from the URI authority or the `Host` header,
/// without port.
fn request_host(parts: &Parts) -> Option<&str> {
    if let Some(host) = parts.uri.host() {
        return Some(host);
    }

    let host = parts.headers.get(HOST)?.to_str().ok()?;
    let name = match host.strip_prefix('[') {
        // IPv6 literal
        Some(rest) => rest.split_once(']').map_or(host, |(addr, _)| addr),
        None => host.split_once(':').map_or(host, |(name, _)| name),
    };
    Some(name)
}

fn ok_response() -> Response<Bytes> {
    text_response(StatusCode::OK, Bytes::from_static(b"OK"))
}

fn failure_response(err: MediaError) -> Response<Bytes> {
    if err.status().is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    err.into_response()
}
