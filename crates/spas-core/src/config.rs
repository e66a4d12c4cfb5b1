//! Configuration types for the SPAS client
//!
//! This module defines the options consumed by the client core. Loading them
//! from the environment is left to binaries.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Public SPAS endpoint of the Federal Tax Service
pub const DEFAULT_BASE_URL: &str = "https://fias-public-service.nalog.ru/api/spas/v2.0";

/// Main client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SpasConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub token: String,

    /// Per-call timeout (in milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum attempts per logical operation, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum number of concurrent in-flight requests
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Requests allowed per rate limit window
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: usize,

    /// Length of the sliding rate limit window (in milliseconds)
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// Deadline for a whole logical operation, retries included (in milliseconds)
    ///
    /// When it elapses no further attempts are made and the operation fails
    /// with a timeout.
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,

    /// Address hierarchy to resolve against
    #[serde(default)]
    pub address_type: AddressType,

    /// Backoff settings
    #[serde(default)]
    pub retry: RetryConfig,
}

// Custom Debug implementation that hides the token
impl std::fmt::Debug for SpasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpasConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<REDACTED>")
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("max_connections", &self.max_connections)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window_ms", &self.rate_limit_window_ms)
            .field("operation_timeout_ms", &self.operation_timeout_ms)
            .field("address_type", &self.address_type)
            .field("retry", &self.retry)
            .finish()
    }
}

impl SpasConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            max_connections: default_max_connections(),
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            operation_timeout_ms: None,
            address_type: AddressType::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = millis(timeout);
        self
    }

    /// Set the per-call timeout in whole seconds
    pub fn with_timeout_secs(self, timeout_secs: u64) -> Self {
        self.with_timeout(Duration::from_secs(timeout_secs))
    }

    /// Set the attempt ceiling
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the connection pool size
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the rate limit
    pub fn with_rate_limit_window(mut self, requests: usize, window: Duration) -> Self {
        self.rate_limit_requests = requests;
        self.rate_limit_window_ms = millis(window);
        self
    }

    /// Set the rate limit with a window in whole seconds
    pub fn with_rate_limit(self, requests: usize, window_secs: u64) -> Self {
        self.with_rate_limit_window(requests, Duration::from_secs(window_secs))
    }

    /// Set the whole-operation deadline
    pub fn with_operation_timeout(mut self, deadline: Duration) -> Self {
        self.operation_timeout_ms = Some(millis(deadline));
        self
    }

    /// Set the whole-operation deadline in whole seconds
    pub fn with_operation_timeout_secs(self, secs: u64) -> Self {
        self.with_operation_timeout(Duration::from_secs(secs))
    }

    /// Set the address hierarchy
    pub fn with_address_type(mut self, address_type: AddressType) -> Self {
        self.address_type = address_type;
        self
    }

    /// Set the backoff settings
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.base_url.trim().is_empty() {
            return Err(crate::Error::config("Base URL cannot be empty"));
        }
        if self.timeout_ms == 0 {
            return Err(crate::Error::config("Timeout must be > 0"));
        }
        if self.max_retries == 0 {
            return Err(crate::Error::config(
                "max_retries must be >= 1 (it counts the first attempt)",
            ));
        }
        if self.max_connections == 0 {
            return Err(crate::Error::config("max_connections must be > 0"));
        }
        if self.rate_limit_requests == 0 {
            return Err(crate::Error::config("rate_limit_requests must be > 0"));
        }
        if self.rate_limit_window_ms == 0 {
            return Err(crate::Error::config("rate_limit_window_ms must be > 0"));
        }
        if self.operation_timeout_ms == Some(0) {
            return Err(crate::Error::config("operation_timeout_ms must be > 0"));
        }

        self.retry.validate()?;

        Ok(())
    }
}

impl Default for SpasConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Address hierarchy used by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    /// Administrative-territorial division
    #[default]
    Administrative,
    /// Municipal division
    Municipal,
}

impl AddressType {
    /// Numeric code sent on the wire
    pub fn code(self) -> u8 {
        match self {
            AddressType::Administrative => 1,
            AddressType::Municipal => 2,
        }
    }
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay before the second attempt (in milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Growth factor applied per further attempt
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Ceiling for any single delay (in milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Upper bound of the random jitter added to each delay (in milliseconds)
    ///
    /// Set to 0 for deterministic delays.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl RetryConfig {
    /// Validate the backoff configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(crate::Error::config("Retry multiplier must be >= 1.0"));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(crate::Error::config(
                "Retry max_delay_ms must not be below base_delay_ms",
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

/// Whole milliseconds of a duration, saturating
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_connections() -> usize {
    100
}

fn default_rate_limit_requests() -> usize {
    100
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_jitter_ms() -> u64 {
    250
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SpasConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.address_type, AddressType::Administrative);
    }

    #[test]
    fn test_zero_limits_rejected() {
        assert!(SpasConfig::new().with_max_retries(0).validate().is_err());
        assert!(SpasConfig::new().with_max_connections(0).validate().is_err());
        assert!(SpasConfig::new().with_rate_limit(0, 60).validate().is_err());
        assert!(SpasConfig::new().with_rate_limit(10, 0).validate().is_err());
        assert!(SpasConfig::new().with_timeout_secs(0).validate().is_err());
        assert!(SpasConfig::new().with_base_url("  ").validate().is_err());
    }

    #[test]
    fn test_bad_retry_config_rejected() {
        let retry = RetryConfig {
            multiplier: 0.5,
            ..RetryConfig::default()
        };
        assert!(SpasConfig::new().with_retry(retry).validate().is_err());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: SpasConfig =
            serde_json::from_str(r#"{"token": "abc", "max_retries": 5}"#).unwrap();

        assert_eq!(config.token, "abc");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.retry.base_delay_ms, 500);
        assert_eq!(config.operation_timeout_ms, None);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_sub_second_durations() {
        let config = SpasConfig::new()
            .with_timeout(Duration::from_millis(1_500))
            .with_rate_limit_window(10, Duration::from_millis(250))
            .with_operation_timeout(Duration::from_secs_f64(2.5));

        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_millis(1_500));
        assert_eq!(config.rate_limit_window(), Duration::from_millis(250));
        assert_eq!(config.operation_timeout(), Some(Duration::from_millis(2_500)));

        let parsed: SpasConfig =
            serde_json::from_str(r#"{"timeout_ms": 750, "rate_limit_window_ms": 60500}"#).unwrap();
        assert_eq!(parsed.timeout(), Duration::from_millis(750));
        assert_eq!(parsed.rate_limit_window(), Duration::from_millis(60_500));
    }

    #[test]
    fn test_sub_millisecond_window_rejected() {
        let config = SpasConfig::new().with_rate_limit_window(10, Duration::from_micros(10));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_address_type_codes() {
        assert_eq!(AddressType::Administrative.code(), 1);
        assert_eq!(AddressType::Municipal.code(), 2);
        let parsed: AddressType = serde_json::from_str("\"municipal\"").unwrap();
        assert_eq!(parsed, AddressType::Municipal);
    }

    #[test]
    fn test_token_not_exposed_in_debug() {
        let config = SpasConfig::new().with_token("secret_token_12345");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("SpasConfig"));
    }
}
