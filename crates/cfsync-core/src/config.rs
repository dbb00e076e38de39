//! Configuration types for cfsync
//!
//! A [`ReconcileConfig`] is built by the binary (flags and environment) and
//! validated before any network call is made.

use serde::{Deserialize, Serialize};

/// Default Cloudflare zones endpoint
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4/zones";

/// Default public IP trace endpoint
pub const DEFAULT_TRACE_URL: &str = "https://cloudflare.com/cdn-cgi/trace";

/// Bearer token for the zone API
///
/// The Debug implementation never exposes the value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the `Authorization` header only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken(<REDACTED>)")
    }
}

/// Settings for one reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Zone identifier scoping all record operations
    pub location: String,

    /// Zone API bearer token
    pub token: ApiToken,

    /// Zones endpoint; records live under `{api_base}/{location}/dns_records`
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Plaintext `key=value` trace endpoint used for public IP discovery
    #[serde(default = "default_trace_url")]
    pub trace_url: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of record updates allowed in flight at once
    ///
    /// 1 keeps the update phase strictly sequential. The outcome report is
    /// in listing order for any value.
    #[serde(default = "default_max_concurrent_updates")]
    pub max_concurrent_updates: usize,

    /// Capacity of the reconcile event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl ReconcileConfig {
    /// Create a configuration with defaults for everything but the zone and token
    pub fn new(location: impl Into<String>, token: ApiToken) -> Self {
        Self {
            location: location.into(),
            token,
            api_base: default_api_base(),
            trace_url: default_trace_url(),
            timeout_secs: default_timeout_secs(),
            max_concurrent_updates: default_max_concurrent_updates(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Point the zone API at another base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Point IP discovery at another trace URL
    pub fn with_trace_url(mut self, trace_url: impl Into<String>) -> Self {
        self.trace_url = trace_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_concurrent_updates(mut self, max: usize) -> Self {
        self.max_concurrent_updates = max;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.location.trim().is_empty() {
            return Err(crate::Error::config("need to pass -location <zone id>"));
        }

        if self.location.contains('/') {
            return Err(crate::Error::config(format!(
                "Zone id must not contain '/': {}",
                self.location
            )));
        }

        if self.token.is_empty() {
            return Err(crate::Error::config("need to pass -token <api token>"));
        }

        validate_url("API base", &self.api_base)?;
        validate_url("Trace URL", &self.trace_url)?;

        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }

        if self.max_concurrent_updates == 0 {
            return Err(crate::Error::config("Update concurrency must be > 0"));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

fn validate_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", what)));
    }

    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            what, url
        )));
    }

    Ok(())
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_trace_url() -> String {
    DEFAULT_TRACE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_updates() -> usize {
    1
}

fn default_event_channel_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ReconcileConfig {
        ReconcileConfig::new("zone123", ApiToken::new("secret_token_12345"))
    }

    #[test]
    fn test_defaults() {
        let config = valid();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.trace_url, DEFAULT_TRACE_URL);
        assert_eq!(config.max_concurrent_updates, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_location() {
        let config = ReconcileConfig::new("", ApiToken::new("token"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("-location"));
    }

    #[test]
    fn test_missing_token() {
        let config = ReconcileConfig::new("zone123", ApiToken::new("   "));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("-token"));
    }

    #[test]
    fn test_rejects_bad_urls_and_zero_limits() {
        assert!(valid().with_api_base("ftp://example.com").validate().is_err());
        assert!(valid().with_trace_url("").validate().is_err());
        assert!(valid().with_timeout_secs(0).validate().is_err());
        assert!(valid().with_max_concurrent_updates(0).validate().is_err());
    }

    #[test]
    fn test_token_not_exposed_in_debug() {
        let debug_str = format!("{:?}", valid());
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(debug_str.contains("REDACTED"));
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let config: ReconcileConfig =
            serde_json::from_str(r#"{"location":"zone123","token":"abc"}"#).unwrap();
        assert_eq!(config.token.expose(), "abc");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.event_channel_capacity, 256);
    }
}
