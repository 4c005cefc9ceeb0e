//! Client configuration

use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the service base URL
pub const BASE_URL_VAR: &str = "DYMIS_API_BASE_URL";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "DYMIS_API_KEY";

/// Environment variable holding the request timeout in seconds
pub const TIMEOUT_VAR: &str = "DYMIS_TIMEOUT_SECS";

/// Environment variable that turns incomplete configuration into an error
pub const STRICT_VAR: &str = "DYMIS_STRICT_CONFIG";

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Errors raised while building a client
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No base URL configured (strict mode only)
    #[error("Missing DYMIS_API_BASE_URL configuration")]
    MissingBaseUrl,

    /// No API key configured (strict mode only)
    #[error("Missing DYMIS_API_KEY configuration")]
    MissingApiKey,

    /// A configuration value could not be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },

    /// The underlying HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Settings for [`AnalysisClient`](crate::AnalysisClient)
///
/// By default an incomplete configuration only logs a warning and the client
/// still issues requests with whatever values are present. Set
/// [`strict`](Self::strict) to fail at construction instead.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service base URL, without the `/api/v1` prefix
    pub base_url: String,
    /// Value sent in the `X-API-Key` header
    pub api_key: Option<String>,
    /// Transport-level timeout for each request
    pub timeout: Option<Duration>,
    /// Reject incomplete configuration instead of warning
    pub strict: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: None,
            strict: false,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("strict", &self.strict)
            .finish()
    }
}

impl ClientConfig {
    /// Create a config for the given base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fail on incomplete configuration
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Load configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a timeout or strict flag cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Blank values are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a timeout or strict flag cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let timeout = get(TIMEOUT_VAR)
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| ConfigError::InvalidValue {
                        name: TIMEOUT_VAR,
                        value: raw,
                    })
            })
            .transpose()?;

        let strict = get(STRICT_VAR)
            .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    name: STRICT_VAR,
                    value: raw,
                }),
            })
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            base_url: get(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: get(API_KEY_VAR),
            timeout,
            strict,
        })
    }

    /// Check the configuration is complete
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`ConfigError::MissingBaseUrl`] or
    /// [`ConfigError::MissingApiKey`]. Otherwise logs a warning and succeeds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = if self.base_url.trim().is_empty() {
            Some(ConfigError::MissingBaseUrl)
        } else if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            Some(ConfigError::MissingApiKey)
        } else {
            None
        };

        match missing {
            Some(err) if self.strict => Err(err),
            Some(err) => {
                tracing::warn!(error = %err, "API configuration is incomplete, requests may be rejected");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Join `path` onto the base URL
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
