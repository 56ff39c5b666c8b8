//! Media service configuration.

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, Result};

/// Default number of records returned by the development listing.
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development; enables `GET /list`.
    Development,
    /// Production.
    #[default]
    Production,
}

/// Configuration for [`MediaRequestHandler`](crate::MediaRequestHandler).
///
/// # Example
///
/// ```
/// use mediagate_media::{Environment, ServiceConfig};
///
/// let config = ServiceConfig::builder()
///     .environment(Environment::Development)
///     .cdn_host("cdn.example.com")
///     .build()?;
/// assert!(config.answers_host("CDN.example.com"));
/// assert!(!config.answers_host("www.example.com"));
/// # Ok::<(), mediagate_media::MediaError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default)]
    environment: Environment,
    #[serde(default)]
    cdn_host: Option<String>,
    #[serde(default = "default_list_limit")]
    list_limit: usize,
}

fn default_list_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { environment: Environment::default(), cdn_host: None, list_limit: DEFAULT_LIST_LIMIT }
    }
}

#[bon::bon]
impl ServiceConfig {
    /// Creates a new configuration.
    ///
    /// # Optional Fields
    ///
    /// * `environment` - Deployment environment (default: production).
    /// * `cdn_host` - Host name the handler answers for (default: any host).
    /// * `list_limit` - Records returned by `GET /list` (default: [`DEFAULT_LIST_LIMIT`]).
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Configuration`] if `cdn_host` is blank or
    /// `list_limit` is zero.
    #[builder]
    pub fn new(
        #[builder(default)] environment: Environment,
        #[builder(into)] cdn_host: Option<String>,
        #[builder(default = DEFAULT_LIST_LIMIT)] list_limit: usize,
    ) -> Result<Self> {
        let config = Self { environment, cdn_host, list_limit };
        config.validate()?;
        Ok(config)
    }

    /// Validates a configuration, e.g. one obtained through deserialization.
    ///
    /// # Errors
    ///
    /// See [`ServiceConfig::new`].
    pub fn validate(&self) -> Result<()> {
        if self.cdn_host.as_deref().is_some_and(|host| host.trim().is_empty()) {
            return Err(MediaError::configuration("cdn_host cannot be blank"));
        }
        if self.list_limit == 0 {
            return Err(MediaError::configuration("list_limit must be positive"));
        }
        Ok(())
    }

    /// Returns the deployment environment.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Returns the configured host name, if any.
    #[must_use]
    pub fn cdn_host(&self) -> Option<&str> {
        self.cdn_host.as_deref()
    }

    /// Returns the development listing limit.
    #[must_use]
    pub fn list_limit(&self) -> usize {
        self.list_limit
    }

    /// Returns `true` if requests for `host` are served.
    ///
    /// Host names compare case-insensitively; without a configured host
    /// every host is served.
    #[must_use]
    pub fn answers_host(&self, host: &str) -> bool {
        self.cdn_host.as_deref().is_none_or(|expected| expected.eq_ignore_ascii_case(host))
    }
}
