//! Storage capabilities consumed by the media front.
//!
//! This crate defines the two external collaborators the rest of the
//! workspace depends on, as traits, plus in-memory implementations:
//!
//! - [`ObjectStore`]: the blob store holding media objects
//! - [`KeyValueCache`]: the shared cache holding verification key material
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  MediaRequestHandler                        │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │        ObjectStore           │   KeyMaterialCache (authn)   │
//! │ (get, head, put, delete,     ├──────────────────────────────┤
//! │  list)                       │        KeyValueCache         │
//! │                              │      (get, put with TTL)     │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │   MemoryObjectStore / MemoryKeyValueCache (testing)         │
//! │   hosted blob store / hosted KV service (production)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`]. Backends map their internal
//! errors to [`StorageError`] variants; a missing key is `Ok(None)`, never
//! an error.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with fault-injecting wrappers and store
//!   factories. Enable this in `[dev-dependencies]` for integration tests.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod memory;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod types;

pub use backend::{KeyValueCache, ObjectStore};
pub use error::{BoxError, StorageError, StorageResult};
pub use memory::{MemoryKeyValueCache, MemoryObjectStore};
pub use types::{ObjectMetadata, StoredObject};
