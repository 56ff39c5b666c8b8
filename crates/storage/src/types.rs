//! Common types shared by object stores and their consumers.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata describing one stored object.
///
/// Returned by [`ObjectStore::head`](crate::ObjectStore::head) and
/// [`ObjectStore::list`](crate::ObjectStore::list), and carried alongside
/// the body by [`StoredObject`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Full object key (e.g. `public/alice/photo.jpg`).
    pub key: String,
    /// Body length in bytes.
    pub size: u64,
    /// Content type declared when the object was written, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Time the object was written.
    pub uploaded: DateTime<Utc>,
}

/// An object body together with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object metadata.
    pub metadata: ObjectMetadata,
    /// Object body.
    pub body: Bytes,
}

impl StoredObject {
    /// Returns the body length in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.metadata.size
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_omits_missing_content_type() {
        let meta = ObjectMetadata {
            key: "public/alice/a.bin".into(),
            size: 3,
            content_type: None,
            uploaded: Utc::now(),
        };

        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("content_type").is_none());
        assert_eq!(json["key"], "public/alice/a.bin");
        assert_eq!(json["size"], 3);
    }
}
