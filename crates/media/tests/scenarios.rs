//! End-to-end request scenarios through `MediaRequestHandler::handle`.
#![allow(clippy::expect_used, clippy::panic)]

mod common;

use std::sync::Arc;

use bytes::Bytes;
use common::{HOST, handler_over, handler_with, request, request_builder, upload};
use http::{Method, Request, StatusCode, header};
use mediagate_media::Environment;
use mediagate_storage::{
    MemoryObjectStore, ObjectStore,
    testutil::{FaultyObjectStore, populated_store},
};
use rstest::rstest;

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn public_read_without_credentials_returns_bytes() {
    let (handler, _) =
        handler_with(&[("public/alice/photo.jpg", b"jpeg-bytes")], Environment::Production).await;

    let response = handler.handle(request(Method::GET, "/public/alice/photo.jpg", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"jpeg-bytes");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "10");
}

#[tokio::test]
async fn owner_only_read_by_other_subject_is_forbidden() {
    let (handler, _) =
        handler_with(&[("user/alice/secret.txt", b"top secret")], Environment::Production).await;

    let response = handler.handle(request(Method::GET, "/user/alice/secret.txt", Some("bob"))).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owner_only_read_by_owner_succeeds() {
    let (handler, _) =
        handler_with(&[("user/alice/secret.txt", b"top secret")], Environment::Production).await;

    let response = handler.handle(request(Method::GET, "/user/alice/secret.txt", Some("alice"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"top secret");
}

#[tokio::test]
async fn owner_only_read_without_credentials_is_forbidden() {
    let (handler, _) =
        handler_with(&[("user/alice/secret.txt", b"top secret")], Environment::Production).await;

    let response = handler.handle(request(Method::GET, "/user/alice/secret.txt", None)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn read_of_missing_object_is_not_found() {
    let (handler, _) = handler_with(&[], Environment::Production).await;

    let response = handler.handle(request(Method::GET, "/public/alice/none.png", None)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn read_returns_stored_content_type() {
    let store = MemoryObjectStore::new();
    store
        .put("public/alice/a.png", Bytes::from_static(b"png"), Some("image/png"))
        .await
        .expect("put");
    let handler = handler_over(Arc::new(store), Environment::Production);

    let response = handler.handle(request(Method::GET, "/public/alice/a.png", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn unverifiable_token_is_treated_as_anonymous() {
    let (handler, _) = handler_with(
        &[("public/alice/photo.jpg", b"jpeg"), ("user/alice/secret.txt", b"secret")],
        Environment::Production,
    )
    .await;

    let garbage = |path: &str| {
        Request::builder()
            .method(Method::GET)
            .uri(format!("https://{HOST}{path}"))
            .header(header::AUTHORIZATION, "Bearer not.a.token")
            .body(Bytes::new())
            .expect("valid request")
    };

    assert_eq!(handler.handle(garbage("/public/alice/photo.jpg")).await.status(), StatusCode::OK);
    assert_eq!(
        handler.handle(garbage("/user/alice/secret.txt")).await.status(),
        StatusCode::FORBIDDEN
    );
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn public_write_by_other_subject_creates_object_in_owner_namespace() {
    let (handler, store) = handler_with(&[], Environment::Production).await;

    let request = request_builder(Method::POST, "/public/alice/new.txt", Some("bob"))
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Bytes::from_static(b"hello"))
        .expect("valid request");
    let response = handler.handle(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let object = store.get("public/alice/new.txt").await.expect("get").expect("object created");
    assert_eq!(object.body.as_ref(), b"hello");
    assert_eq!(object.metadata.content_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn write_without_content_type_records_none() {
    let (handler, store) = handler_with(&[], Environment::Production).await;

    let response = handler.handle(upload("/user/alice/raw.bin", Some("alice"), b"\x00\x01")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let meta = store.head("user/alice/raw.bin").await.expect("head").expect("object created");
    assert_eq!(meta.content_type, None);
    assert_eq!(meta.size, 2);
}

#[rstest]
#[case::public_by_owner("/public/alice/taken.txt", "public/alice/taken.txt", "alice")]
#[case::public_by_other("/public/alice/taken.txt", "public/alice/taken.txt", "bob")]
#[case::owner_only_by_owner("/user/alice/taken.txt", "user/alice/taken.txt", "alice")]
#[tokio::test]
async fn write_to_existing_key_is_bad_request(
    #[case] path: &str,
    #[case] key: &str,
    #[case] subject: &str,
) {
    let (handler, store) = handler_with(&[(key, b"original")], Environment::Production).await;

    let response = handler.handle(upload(path, Some(subject), b"overwrite")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.body().as_ref(), b"key already in use");
    let object = store.get(key).await.expect("get").expect("still present");
    assert_eq!(object.body.as_ref(), b"original", "existing object must not be overwritten");
}

#[rstest]
#[case::anonymous_public("/public/alice/taken.txt", "public/alice/taken.txt", None)]
#[case::other_owner_only("/user/alice/taken.txt", "user/alice/taken.txt", Some("bob"))]
#[tokio::test]
async fn forbidden_write_is_reported_before_key_collision(
    #[case] path: &str,
    #[case] key: &str,
    #[case] subject: Option<&str>,
) {
    let (handler, _) = handler_with(&[(key, b"original")], Environment::Production).await;

    let response = handler.handle(upload(path, subject, b"overwrite")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn anonymous_public_write_is_forbidden() {
    let (handler, store) = handler_with(&[], Environment::Production).await;

    let response = handler.handle(upload("/public/alice/drop.txt", None, b"x")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(!store.contains("public/alice/drop.txt"));
}

// ---------------------------------------------------------------------------
// Deletes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn owner_delete_of_missing_key_is_not_found() {
    let (handler, _) = handler_with(&[], Environment::Production).await;

    let response = handler.handle(request(Method::DELETE, "/user/alice/file.txt", Some("alice"))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_delete_removes_object() {
    let (handler, store) =
        handler_with(&[("public/alice/photo.jpg", b"jpeg")], Environment::Production).await;

    let response = handler.handle(request(Method::DELETE, "/public/alice/photo.jpg", Some("alice"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!store.contains("public/alice/photo.jpg"));
}

#[rstest]
#[case::public_other("/public/alice/photo.jpg", "public/alice/photo.jpg", Some("bob"))]
#[case::public_anonymous("/public/alice/photo.jpg", "public/alice/photo.jpg", None)]
#[case::owner_only_other("/user/alice/photo.jpg", "user/alice/photo.jpg", Some("bob"))]
#[tokio::test]
async fn non_owner_delete_is_forbidden(
    #[case] path: &str,
    #[case] key: &str,
    #[case] subject: Option<&str>,
) {
    let (handler, store) = handler_with(&[(key, b"jpeg")], Environment::Production).await;

    let response = handler.handle(request(Method::DELETE, path, subject)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(store.contains(key));
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[rstest]
#[case::put(Method::PUT)]
#[case::patch(Method::PATCH)]
#[case::head(Method::HEAD)]
#[case::options(Method::OPTIONS)]
#[tokio::test]
async fn unsupported_methods_are_not_allowed(#[case] method: Method) {
    let (handler, _) =
        handler_with(&[("public/alice/photo.jpg", b"jpeg")], Environment::Production).await;

    let response = handler.handle(request(method, "/public/alice/photo.jpg", Some("alice"))).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET, POST, DELETE");
}

#[rstest]
#[case::too_short("/public/alice")]
#[case::too_long("/public/alice/a/b")]
#[case::unknown_scope("/private/alice/a.txt")]
#[case::empty_segment("/public//a.txt")]
#[case::root("/")]
#[tokio::test]
async fn unparseable_paths_are_bad_requests(#[case] path: &str) {
    let (handler, _) = handler_with(&[], Environment::Production).await;

    let response = handler.handle(request(Method::GET, path, None)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.body().as_ref(), b"invalid path");
}

#[tokio::test]
async fn other_hosts_are_not_served() {
    let (handler, _) =
        handler_with(&[("public/alice/photo.jpg", b"jpeg")], Environment::Production).await;

    let absolute = Request::get("https://www.example.com/public/alice/photo.jpg")
        .body(Bytes::new())
        .expect("valid request");
    assert_eq!(handler.handle(absolute).await.status(), StatusCode::NOT_FOUND);

    let by_header = Request::get("/public/alice/photo.jpg")
        .header(header::HOST, "www.example.com")
        .body(Bytes::new())
        .expect("valid request");
    assert_eq!(handler.handle(by_header).await.status(), StatusCode::NOT_FOUND);

    let matching_header = Request::get("/public/alice/photo.jpg")
        .header(header::HOST, format!("{HOST}:443"))
        .body(Bytes::new())
        .expect("valid request");
    assert_eq!(handler.handle(matching_header).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn development_listing_returns_metadata_json() {
    let (handler, _) = handler_with(
        &[("public/alice/a.jpg", b"a"), ("user/bob/b.txt", b"bb")],
        Environment::Development,
    )
    .await;

    let response = handler.handle(request(Method::GET, "/list", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let listing: serde_json::Value = serde_json::from_slice(response.body()).expect("json body");
    let keys: Vec<&str> = listing
        .as_array()
        .expect("array")
        .iter()
        .map(|entry| entry["key"].as_str().expect("key"))
        .collect();
    assert_eq!(keys, ["public/alice/a.jpg", "user/bob/b.txt"]);
}

#[tokio::test]
async fn development_listing_honors_limit() {
    let entries: Vec<(String, &[u8])> =
        (0..15).map(|i| (format!("public/alice/{i:02}.txt"), b"x" as &[u8])).collect();
    let borrowed: Vec<(&str, &[u8])> = entries.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let store = populated_store(&borrowed).await;
    let handler = handler_over(Arc::new(store), Environment::Development);

    let response = handler.handle(request(Method::GET, "/list", None)).await;

    let listing: serde_json::Value = serde_json::from_slice(response.body()).expect("json body");
    assert_eq!(listing.as_array().expect("array").len(), 10);
}

#[tokio::test]
async fn listing_is_unavailable_in_production() {
    let (handler, _) = handler_with(&[("public/alice/a.jpg", b"a")], Environment::Production).await;

    let response = handler.handle(request(Method::GET, "/list", None)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Store failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_failure_is_internal_error() {
    let faulty = FaultyObjectStore::wrap(populated_store(&[("public/alice/a.jpg", b"a")]).await);
    faulty.set_fail_reads(true);
    let handler = handler_over(Arc::new(faulty), Environment::Production);

    let response = handler.handle(request(Method::GET, "/public/alice/a.jpg", None)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body().as_ref(), b"Internal Server Error");
}
