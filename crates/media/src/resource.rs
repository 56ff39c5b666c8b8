//! Resource addressing.
//!
//! A media object is addressed by the request path
//! `/{scope}/{owner_id}/{name}` and stored under the object key
//! `{scope}/{owner_id}/{name}`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, Result};

/// Visibility tag of a stored object, taken from the first path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessScope {
    /// `public`: anyone may read; any signed-in caller may add objects.
    #[serde(rename = "public")]
    Public,
    /// `user`: only the owner may read or write.
    #[serde(rename = "user")]
    OwnerOnly,
}

impl AccessScope {
    /// Path segment and key prefix for this scope.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::OwnerOnly => "user",
        }
    }
}

impl fmt::Display for AccessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessScope {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(Self::Public),
            "user" => Ok(Self::OwnerOnly),
            other => Err(MediaError::bad_request(format!("unknown access scope '{other}'"))),
        }
    }
}

/// Address of one stored object.
///
/// Immutable once parsed. Every segment is non-empty and free of `/`, so
/// the object key always has exactly three segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentifier {
    scope: AccessScope,
    owner_id: String,
    name: String,
}

impl ResourceIdentifier {
    /// Creates an identifier from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::BadRequest`] if the owner or name is empty or
    /// contains `/`.
    pub fn new(
        scope: AccessScope,
        owner_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let owner_id = owner_id.into();
        let name = name.into();
        validate_segment("owner", &owner_id)?;
        validate_segment("filename", &name)?;
        Ok(Self { scope, owner_id, name })
    }

    /// Parses a request path of the form `/{scope}/{owner_id}/{name}`.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::BadRequest`] unless the path has exactly three
    /// non-empty segments and the first is a known scope.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediagate_media::{AccessScope, ResourceIdentifier};
    ///
    /// let id = ResourceIdentifier::parse_path("/public/alice/photo.jpg")?;
    /// assert_eq!(id.scope(), AccessScope::Public);
    /// assert_eq!(id.object_key(), "public/alice/photo.jpg");
    ///
    /// assert!(ResourceIdentifier::parse_path("/public/alice").is_err());
    /// # Ok::<(), mediagate_media::MediaError>(())
    /// ```
    pub fn parse_path(path: &str) -> Result<Self> {
        let invalid = || MediaError::bad_request("invalid path");

        let mut segments = path.strip_prefix('/').ok_or_else(invalid)?.split('/');
        let (Some(scope), Some(owner_id), Some(name), None) =
            (segments.next(), segments.next(), segments.next(), segments.next())
        else {
            return Err(invalid());
        };

        if scope.is_empty() || owner_id.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        Self::new(scope.parse()?, owner_id, name)
    }

    /// Returns the same scope and owner with a different object name.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::BadRequest`] if `name` is not a valid segment.
    pub fn with_name(&self, name: impl Into<String>) -> Result<Self> {
        Self::new(self.scope, self.owner_id.clone(), name)
    }

    /// Returns the access scope.
    #[must_use]
    pub fn scope(&self) -> AccessScope {
        self.scope
    }

    /// Returns the owning subject id.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Returns the object name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the object store key.
    #[must_use]
    pub fn object_key(&self) -> String {
        format!("{}/{}/{}", self.scope, self.owner_id, self.name)
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}", self.scope, self.owner_id, self.name)
    }
}

fn validate_segment(what: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(MediaError::bad_request(format!("{what} cannot be empty")));
    }
    if segment.contains('/') {
        return Err(MediaError::bad_request(format!("{what} cannot contain '/'")));
    }
    Ok(())
}
