//! Storage error types and result alias.
//!
//! Object stores and key-value caches map their internal failures onto
//! [`StorageError`] so callers can treat every backend uniformly.
//!
//! # Error Types
//!
//! - [`StorageError::Connection`] - Network or connection-related failures
//! - [`StorageError::Serialization`] - Data encoding/decoding failures
//! - [`StorageError::Timeout`] - Operation exceeded time limit
//!
//! A missing key is not an error: lookups return `Ok(None)`.
//!
//! # Example
//!
//! ```
//! use mediagate_storage::{StorageError, StorageResult};
//!
//! fn lookup(_key: &str) -> StorageResult<Option<Vec<u8>>> {
//!     Err(StorageError::connection("blob store unreachable"))
//! }
//! ```

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during object store and cache operations.
///
/// Serialization errors preserve their source chain via the `#[source]`
/// attribute.
///
/// # Non-exhaustive
///
/// New variants may be added in future minor releases. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Connection or network error.
    ///
    /// The backend could not be reached (DNS failure, connection refused,
    /// TLS handshake failure).
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Serialization or deserialization error.
    ///
    /// Typically indicates a cached value written by an incompatible
    /// version or corrupted in transit.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
        /// The underlying error that caused serialization to fail.
        #[source]
        source: BoxError,
    },

    /// Operation timed out.
    #[error("Operation timeout")]
    Timeout,
}

impl StorageError {
    /// Creates a new `Connection` error with the given message.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into() }
    }

    /// Creates a new `Serialization` error with a message and source error.
    #[must_use]
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization { message: message.into(), source: Arc::new(source) }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }
}
