//! Shared fixtures for media handler integration tests.
#![allow(dead_code, clippy::expect_used)]

use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, header};
use mediagate_authn::testutil::{TEST_KEY_A, sign_token, test_verifier, valid_claims};
use mediagate_media::{Environment, MediaRequestHandler, ServiceConfig};
use mediagate_storage::{MemoryObjectStore, ObjectStore, testutil::populated_store};

pub const PROJECT: &str = "demo-project";
pub const HOST: &str = "cdn.example.com";

/// Handler over a shared in-memory store, answering for [`HOST`].
pub async fn handler_with(
    entries: &[(&str, &[u8])],
    environment: Environment,
) -> (MediaRequestHandler, MemoryObjectStore) {
    let store = populated_store(entries).await;
    let handler = handler_over(Arc::new(store.clone()), environment);
    (handler, store)
}

/// Handler over an arbitrary store, answering for [`HOST`].
pub fn handler_over(store: Arc<dyn ObjectStore>, environment: Environment) -> MediaRequestHandler {
    let (verifier, _) = test_verifier(Some(PROJECT), &[&TEST_KEY_A]);
    let config = ServiceConfig::builder()
        .environment(environment)
        .cdn_host(HOST)
        .build()
        .expect("valid service config");
    MediaRequestHandler::new(config, Arc::new(verifier), store)
}

/// `Authorization` value carrying a valid token for `subject`.
pub fn bearer(subject: &str) -> String {
    format!("Bearer {}", sign_token(&TEST_KEY_A, &valid_claims(PROJECT, subject)))
}

/// Request builder for `https://{HOST}{path}`, authenticated as `subject`.
pub fn request_builder(method: Method, path: &str, subject: Option<&str>) -> http::request::Builder {
    let builder = Request::builder().method(method).uri(format!("https://{HOST}{path}"));
    match subject {
        Some(subject) => builder.header(header::AUTHORIZATION, bearer(subject)),
        None => builder,
    }
}

/// Request without body.
pub fn request(method: Method, path: &str, subject: Option<&str>) -> Request<Bytes> {
    request_builder(method, path, subject).body(Bytes::new()).expect("valid request")
}

/// POST request with a body.
pub fn upload(path: &str, subject: Option<&str>, body: &'static [u8]) -> Request<Bytes> {
    request_builder(Method::POST, path, subject)
        .body(Bytes::from_static(body))
        .expect("valid request")
}
