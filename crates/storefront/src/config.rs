//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AGRIMAP_API_URL` - Base URL of the marketplace backend (e.g. `https://market.example`)
//!
//! ## Optional
//! - `AGRIMAP_ORIGIN_URL` - Origin sent with checkout requests (default: `AGRIMAP_API_URL`)
//! - `AGRIMAP_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `AGRIMAP_POLL_INTERVAL_MS` - Delay between payment status polls (default: 2000)
//! - `AGRIMAP_POLL_MAX_ATTEMPTS` - Payment status polls before timing out (default: 5)
//! - `AGRIMAP_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `AGRIMAP_SESSION_TOKEN` - Existing auth session token to reuse
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
///
/// Implements `Debug` manually to redact the session token.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Backend base URL; endpoint paths are joined onto it.
    pub api_url: Url,
    /// Origin the payment provider redirects back to.
    pub origin_url: Url,
    /// Timeout applied to every backend request.
    pub request_timeout: Duration,
    /// Payment status polling settings.
    pub poll: PollConfig,
    /// Lifetime of cached catalog responses.
    pub catalog_cache_ttl: Duration,
    /// Auth session token carried over from an earlier sign-in.
    pub session_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Payment status polling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two status requests.
    pub interval: Duration,
    /// Number of status requests before giving up with a timeout.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: 5,
        }
    }
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_url", &self.api_url.as_str())
            .field("origin_url", &self.origin_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("poll", &self.poll)
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = parse_url(
            "AGRIMAP_API_URL",
            &lookup("AGRIMAP_API_URL")
                .ok_or_else(|| ConfigError::MissingEnvVar("AGRIMAP_API_URL".to_string()))?,
        )?;
        let origin_url = match lookup("AGRIMAP_ORIGIN_URL") {
            Some(value) => parse_url("AGRIMAP_ORIGIN_URL", &value)?,
            None => api_url.clone(),
        };

        let request_timeout =
            Duration::from_secs(parse_or("AGRIMAP_REQUEST_TIMEOUT_SECS", &lookup, 30)?);
        let max_attempts: u32 = parse_or("AGRIMAP_POLL_MAX_ATTEMPTS", &lookup, 5)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "AGRIMAP_POLL_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let poll = PollConfig {
            interval: Duration::from_millis(parse_or("AGRIMAP_POLL_INTERVAL_MS", &lookup, 2000)?),
            max_attempts,
        };
        let catalog_cache_ttl =
            Duration::from_secs(parse_or("AGRIMAP_CATALOG_CACHE_TTL_SECS", &lookup, 300)?);

        Ok(Self {
            api_url,
            origin_url,
            request_timeout,
            poll,
            catalog_cache_ttl,
            session_token: lookup("AGRIMAP_SESSION_TOKEN")
                .filter(|token| !token.is_empty())
                .map(SecretString::from),
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `api_url` with every other setting defaulted.
    #[must_use]
    pub fn for_api(api_url: Url) -> Self {
        Self {
            origin_url: api_url.clone(),
            api_url,
            request_timeout: Duration::from_secs(30),
            poll: PollConfig::default(),
            catalog_cache_ttl: Duration::from_secs(300),
            session_token: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a URL-valued variable.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a variable, falling back to `default` when it is unset.
fn parse_or<T>(
    key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |value| {
        value
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
