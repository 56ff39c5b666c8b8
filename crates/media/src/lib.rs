//! # Mediagate Media
//!
//! Access-controlled media serving over an [`ObjectStore`](mediagate_storage::ObjectStore).
//!
//! Objects live at `/{scope}/{owner_id}/{filename}`, where the scope is
//! `public` or `user`:
//!
//! - **Public** objects are readable by anyone; any signed-in caller may add one
//! - **User** objects are readable and writable by their owner only
//! - Only the owner may delete an object, whatever its scope
//! - Objects are create-only: writing to a key in use is a bad request
//!
//! Callers are identified by a `Bearer` identity token verified with
//! [`mediagate_authn::TokenVerifier`]; an unverifiable token makes the
//! caller anonymous.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use mediagate_authn::{AuthConfig, HttpTrustAuthority, KeyMaterialCache, TokenVerifier};
//! use mediagate_media::{MediaRequestHandler, ServiceConfig};
//! use mediagate_storage::{MemoryKeyValueCache, MemoryObjectStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let auth = AuthConfig::builder().project_id("my-project").build()?;
//! let authority = Arc::new(HttpTrustAuthority::from_config(&auth)?);
//! let keys = KeyMaterialCache::from_config(&auth, Arc::new(MemoryKeyValueCache::new()), authority);
//! let verifier = Arc::new(TokenVerifier::new(auth, Arc::new(keys))?);
//!
//! let config = ServiceConfig::builder().cdn_host("cdn.example.com").build()?;
//! let handler = MediaRequestHandler::new(config, verifier, Arc::new(MemoryObjectStore::new()));
//!
//! let request = http::Request::get("https://cdn.example.com/public/alice/photo.jpg").body(Bytes::new())?;
//! let response = handler.handle(request).await;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Access decisions.
pub mod access;
/// Service configuration.
pub mod config;
/// Media request errors.
pub mod error;
/// Request handling.
pub mod handler;
/// Resource addressing.
pub mod resource;

pub use access::{AccessOutcome, Operation, decide};
pub use config::{Environment, ServiceConfig};
pub use error::{MediaError, Result};
pub use handler::{MediaRequestHandler, REPLACE_HEADER};
pub use resource::{AccessScope, ResourceIdentifier};
