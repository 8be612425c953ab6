//! Monitor configuration.
//!
//! Loaded from `STA_*` environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use smart_trading_sdk::ws::config::{DEFAULT_HEARTBEAT_SECS, DEFAULT_WS_HOST};
use smart_trading_sdk::ws::Scheme;
use smart_trading_sdk::{ClientConfig, WsConfig, WsError};

/// User whose trades are followed. Required.
pub const ENV_USER_ID: &str = "STA_USER_ID";
/// Backend host and port, e.g. `localhost:8000`.
pub const ENV_WS_HOST: &str = "STA_WS_HOST";
/// `http` or `https`; selects `ws` or `wss`.
pub const ENV_PAGE_SCHEME: &str = "STA_PAGE_SCHEME";
/// REST base URL. When set, the dashboard snapshot seeds the view.
pub const ENV_API_BASE_URL: &str = "STA_API_BASE_URL";
/// Session cookie for the REST bootstrap.
pub const ENV_SESSION_ID: &str = "STA_SESSION_ID";
/// Seconds between status log lines.
pub const ENV_STATUS_INTERVAL_SECS: &str = "STA_STATUS_INTERVAL_SECS";
/// Seconds between heartbeat pings.
pub const ENV_HEARTBEAT_SECS: &str = "STA_HEARTBEAT_SECS";

/// Default seconds between status log lines.
pub const DEFAULT_STATUS_INTERVAL_SECS: u64 = 10;

/// Configuration for the monitor service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// User whose trades are followed.
    pub user_id: String,

    /// Backend host and port.
    pub ws_host: String,

    /// Page scheme the socket scheme is mirrored from.
    pub page_scheme: String,

    /// REST base URL for the dashboard bootstrap.
    pub api_base_url: Option<String>,

    /// Session cookie for the REST bootstrap.
    pub session_id: Option<String>,

    /// Seconds between status log lines.
    pub status_interval_secs: u64,

    /// Seconds between heartbeat pings.
    pub heartbeat_secs: u64,
}

impl MonitorConfig {
    /// Creates a configuration for `user_id` with defaults for everything else.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ws_host: DEFAULT_WS_HOST.to_string(),
            page_scheme: "http".to_string(),
            api_base_url: None,
            session_id: None,
            status_interval_secs: DEFAULT_STATUS_INTERVAL_SECS,
            heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
        }
    }

    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from `lookup`. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let user_id = get(ENV_USER_ID).ok_or(ConfigError::Missing(ENV_USER_ID))?;
        let mut config = Self::new(user_id);

        if let Some(host) = get(ENV_WS_HOST) {
            config.ws_host = host;
        }
        if let Some(scheme) = get(ENV_PAGE_SCHEME) {
            config.page_scheme = scheme;
        }
        config.api_base_url = get(ENV_API_BASE_URL);
        config.session_id = get(ENV_SESSION_ID);

        if let Some(value) = get(ENV_STATUS_INTERVAL_SECS) {
            config.status_interval_secs = parse_secs(ENV_STATUS_INTERVAL_SECS, &value)?;
        }
        if let Some(value) = get(ENV_HEARTBEAT_SECS) {
            config.heartbeat_secs = parse_secs(ENV_HEARTBEAT_SECS, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_USER_ID));
        }

        if self.status_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval(ENV_STATUS_INTERVAL_SECS));
        }

        if self.heartbeat_secs == 0 {
            return Err(ConfigError::ZeroInterval(ENV_HEARTBEAT_SECS));
        }

        self.ws_config().validate()?;
        Ok(())
    }

    /// Returns the push-channel configuration.
    #[must_use]
    pub fn ws_config(&self) -> WsConfig {
        WsConfig::new(self.ws_host.clone())
            .with_page_scheme(&self.page_scheme)
            .with_heartbeat_interval(Duration::from_secs(self.heartbeat_secs))
    }

    /// Returns the REST client configuration, if a base URL is set.
    #[must_use]
    pub fn client_config(&self) -> Option<ClientConfig> {
        let base_url = self.api_base_url.as_ref()?;
        let config = ClientConfig::new(base_url.clone());
        Some(match &self.session_id {
            Some(session_id) => config.with_session_id(session_id.clone()),
            None => config,
        })
    }

    /// Returns the socket scheme.
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        Scheme::from_page_scheme(&self.page_scheme)
    }

    /// Returns the status log interval.
    #[must_use]
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }
}

fn parse_secs(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        })
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required variable missing.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// Value is not a number.
    #[error("{var} must be a valid number, got {value:?}")]
    InvalidNumber {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// Interval of zero seconds.
    #[error("{0} must be > 0")]
    ZeroInterval(&'static str),

    /// Invalid push-channel settings.
    #[error(transparent)]
    Ws(#[from] WsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = MonitorConfig::from_lookup(lookup(&[(ENV_USER_ID, "42")])).expect("config");
        assert_eq!(config, MonitorConfig::new("42"));
        assert_eq!(config.scheme(), Scheme::Ws);
        assert_eq!(config.status_interval(), Duration::from_secs(10));
        assert!(config.client_config().is_none());
    }

    #[test]
    fn test_config_full() {
        let config = MonitorConfig::from_lookup(lookup(&[
            (ENV_USER_ID, "alice@example.com"),
            (ENV_WS_HOST, "trading.example.com"),
            (ENV_PAGE_SCHEME, "https:"),
            (ENV_API_BASE_URL, "https://trading.example.com"),
            (ENV_SESSION_ID, "abc123"),
            (ENV_STATUS_INTERVAL_SECS, "5"),
            (ENV_HEARTBEAT_SECS, "15"),
        ]))
        .expect("config");

        assert_eq!(config.scheme(), Scheme::Wss);
        let ws = config.ws_config();
        assert_eq!(ws.host, "trading.example.com");
        assert_eq!(ws.scheme, Scheme::Wss);
        assert_eq!(ws.heartbeat_interval, Duration::from_secs(15));

        let client = config.client_config().expect("client config");
        assert_eq!(client.base_url, "https://trading.example.com");
        assert_eq!(client.session_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_config_missing_user() {
        let err = MonitorConfig::from_lookup(lookup(&[(ENV_USER_ID, "  ")])).expect_err("missing");
        assert_eq!(err, ConfigError::Missing(ENV_USER_ID));
        assert_eq!(err.to_string(), "STA_USER_ID must be set");
    }

    #[test]
    fn test_config_invalid_number() {
        let err = MonitorConfig::from_lookup(lookup(&[
            (ENV_USER_ID, "42"),
            (ENV_HEARTBEAT_SECS, "thirty"),
        ]))
        .expect_err("invalid");
        assert!(matches!(err, ConfigError::InvalidNumber { var, .. } if var == ENV_HEARTBEAT_SECS));
    }

    #[test]
    fn test_config_zero_interval() {
        let err = MonitorConfig::from_lookup(lookup(&[
            (ENV_USER_ID, "42"),
            (ENV_STATUS_INTERVAL_SECS, "0"),
        ]))
        .expect_err("zero");
        assert_eq!(err, ConfigError::ZeroInterval(ENV_STATUS_INTERVAL_SECS));
    }

    #[test]
    fn test_config_invalid_host() {
        let err = MonitorConfig::from_lookup(lookup(&[
            (ENV_USER_ID, "42"),
            (ENV_WS_HOST, "ws://localhost:8000"),
        ]))
        .expect_err("invalid host");
        assert!(matches!(err, ConfigError::Ws(WsError::InvalidConfig(_))));
    }
}
