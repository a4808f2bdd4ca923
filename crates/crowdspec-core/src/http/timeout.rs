//! Timeout configuration for document fetches
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_500;
/// Default total request timeout
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Connection and request timeouts plus client identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Connection timeout - time to establish a connection
    pub connect_timeout_ms: u64,
    /// Request timeout - total time for the entire request
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            user_agent: format!("crowdspec/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Override the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Override the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Validate timeout configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.connect_timeout_ms == 0 {
            return Err("Connect timeout cannot be zero".to_string());
        }

        if self.request_timeout_ms == 0 {
            return Err("Request timeout cannot be zero".to_string());
        }

        // Request timeout should be >= connect timeout
        if self.request_timeout_ms < self.connect_timeout_ms {
            return Err("Request timeout should be >= connect timeout".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let config = FetchConfig::default();
        assert_eq!(config.connect_timeout(), Duration::from_millis(3_500));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert!(config.user_agent.starts_with("crowdspec/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_timeouts() {
        let zero = FetchConfig::default().with_connect_timeout(Duration::ZERO);
        assert!(zero.validate().is_err());

        let inverted = FetchConfig::default().with_request_timeout(Duration::from_secs(1));
        assert_eq!(
            inverted.validate().unwrap_err(),
            "Request timeout should be >= connect timeout"
        );
    }

    #[test]
    fn test_partial_deserialization() {
        let config: FetchConfig = serde_json::from_str(r#"{"request_timeout_ms": 10000}"#).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS);
    }
}
