//! WebSocket configuration.
//!
//! Provides configuration options for the push channels.

use std::time::Duration;

use super::endpoint::Scheme;
use super::error::WsError;

/// Default server host (and port).
pub const DEFAULT_WS_HOST: &str = "localhost:8000";

/// Default heartbeat interval in seconds.
pub const DEFAULT_HEARTBEAT_SECS: u64 = 30;

/// Default base reconnect delay in milliseconds.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;

/// Default maximum reconnection attempts.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// WebSocket configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsConfig {
    /// Server host, optionally with a port. No scheme.
    pub host: String,

    /// Socket scheme, mirrored from the page scheme.
    pub scheme: Scheme,

    /// Heartbeat interval.
    pub heartbeat_interval: Duration,

    /// Base reconnect delay. Attempt `n` waits `reconnect_delay * 2^(n-1)`.
    pub reconnect_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    pub max_reconnect_attempts: u32,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_WS_HOST.to_string(),
            scheme: Scheme::Ws,
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl WsConfig {
    /// Creates a new configuration with the given host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Sets the scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the scheme from the page scheme (`http`/`https`).
    #[must_use]
    pub fn with_page_scheme(mut self, page_scheme: &str) -> Self {
        self.scheme = Scheme::from_page_scheme(page_scheme);
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the base reconnect delay.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the maximum reconnection attempts.
    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), WsError> {
        if self.host.is_empty() {
            return Err(WsError::InvalidConfig("host cannot be empty".to_string()));
        }

        if self.host.contains("://") || self.host.contains('/') {
            return Err(WsError::InvalidConfig(
                "host must not contain a scheme or path".to_string(),
            ));
        }

        if self.heartbeat_interval.is_zero() {
            return Err(WsError::InvalidConfig(
                "heartbeat_interval must be > 0".to_string(),
            ));
        }

        if self.reconnect_delay.is_zero() {
            return Err(WsError::InvalidConfig(
                "reconnect_delay must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
