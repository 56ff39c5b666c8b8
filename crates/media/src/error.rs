//! Media request errors and their HTTP mapping.
//!
//! Every failure a request can end in is a [`MediaError`]. Authentication
//! failures never appear here: an unverifiable caller is simply anonymous,
//! so it is refused with the same [`MediaError::Forbidden`] as an
//! authenticated caller without access.

use bytes::Bytes;
use http::{HeaderValue, Method, Response, StatusCode, header};
use mediagate_storage::StorageError;
use thiserror::Error;

/// Terminal outcome of a failed media request.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`; new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MediaError {
    /// Unparseable path, or a write to a key that is already in use.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The caller may not perform this operation on this object.
    #[error("Forbidden")]
    Forbidden,

    /// No object exists at the resolved key.
    #[error("Not found")]
    NotFound,

    /// The request method is not one of GET, POST or DELETE.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(Method),

    /// Service configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The object store failed.
    ///
    /// Wraps the original [`StorageError`] to preserve the full error source
    /// chain for logging. Never shown to the caller.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl MediaError {
    /// Creates a [`MediaError::BadRequest`].
    #[must_use]
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest(reason.into())
    }

    /// Creates a [`MediaError::Configuration`].
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// HTTP status this error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Configuration(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into a plain-text response.
    ///
    /// Bad requests carry their reason; server-side failures carry only the
    /// canonical status text.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let status = self.status();
        let body = match &self {
            Self::BadRequest(reason) => Bytes::from(reason.clone()),
            _ => Bytes::from_static(status.canonical_reason().unwrap_or("Error").as_bytes()),
        };

        let mut response = text_response(status, body);
        if matches!(self, Self::MethodNotAllowed(_)) {
            response.headers_mut().insert(header::ALLOW, HeaderValue::from_static("GET, POST, DELETE"));
        }
        response
    }
}

/// Builds a `text/plain` response with an explicit content length.
pub(crate) fn text_response(status: StatusCode, body: Bytes) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    *response.body_mut() = body;
    response
}

/// Result type alias for media operations.
pub type Result<T> = std::result::Result<T, MediaError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::bad_request(MediaError::bad_request("invalid path"), StatusCode::BAD_REQUEST)]
    #[case::forbidden(MediaError::Forbidden, StatusCode::FORBIDDEN)]
    #[case::not_found(MediaError::NotFound, StatusCode::NOT_FOUND)]
    #[case::method(MediaError::MethodNotAllowed(Method::PUT), StatusCode::METHOD_NOT_ALLOWED)]
    #[case::storage(MediaError::from(StorageError::timeout()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_mapping(#[case] err: MediaError, #[case] expected: StatusCode) {
        assert_eq!(err.status(), expected);
        assert_eq!(err.into_response().status(), expected);
    }

    #[test]
    fn test_bad_request_body_carries_reason() {
        let response = MediaError::bad_request("key already in use").into_response();
        assert_eq!(response.body().as_ref(), b"key already in use");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "18");
    }

    #[test]
    fn test_storage_error_body_does_not_leak_details() {
        let err = MediaError::from(StorageError::connection("bucket host 10.0.0.7 unreachable"));
        let response = err.into_response();
        assert_eq!(response.body().as_ref(), b"Internal Server Error");
    }

    #[test]
    fn test_method_not_allowed_lists_supported_methods() {
        let response = MediaError::MethodNotAllowed(Method::PATCH).into_response();
        assert_eq!(response.headers()[header::ALLOW], "GET, POST, DELETE");
    }

    #[test]
    fn test_storage_source_chain_preserved() {
        use std::error::Error;

        let err = MediaError::from(StorageError::timeout());
        assert!(err.source().is_some());
    }
}
