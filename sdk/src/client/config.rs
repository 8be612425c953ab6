//! Client configuration.
//!
//! Provides configuration options for the dashboard HTTP client.

use std::time::Duration;

use super::error::ClientError;

/// Default base URL for the API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default maximum retries.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, without the `/api` prefix.
    pub base_url: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Maximum number of retries for failed requests.
    pub max_retries: u32,

    /// Session cookie value (`sessionid`).
    pub session_id: Option<String>,

    /// CSRF token, sent as a cookie and as `X-CSRFToken`.
    pub csrf_token: Option<String>,

    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            session_id: None,
            csrf_token: None,
            user_agent: format!("smart-trading-sdk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum number of retries.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the session cookie.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Sets the CSRF token.
    #[must_use]
    pub fn with_csrf_token(mut self, csrf_token: impl Into<String>) -> Self {
        self.csrf_token = Some(csrf_token.into());
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the `Cookie` header value, if any credential is set.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        let cookies: Vec<String> = [
            self.session_id.as_ref().map(|v| format!("sessionid={}", v)),
            self.csrf_token.as_ref().map(|v| format!("csrftoken={}", v)),
        ]
        .into_iter()
        .flatten()
        .collect();

        (!cookies.is_empty()).then(|| cookies.join("; "))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.base_url.is_empty() {
            return Err(ClientError::InvalidConfig(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::InvalidConfig(
                "base_url must start with http:// or https://".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert!(config.session_id.is_none());
        assert!(config.cookie_header().is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("https://trading.example.com")
            .with_timeout(Duration::from_secs(60))
            .with_max_retries(5)
            .with_session_id("abc")
            .with_csrf_token("xyz")
            .with_user_agent("monitor/1.0");

        assert_eq!(config.base_url, "https://trading.example.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.user_agent, "monitor/1.0");
        assert_eq!(
            config.cookie_header().as_deref(),
            Some("sessionid=abc; csrftoken=xyz")
        );
    }

    #[test]
    fn test_cookie_header_session_only() {
        let config = ClientConfig::default().with_session_id("abc");
        assert_eq!(config.cookie_header().as_deref(), Some("sessionid=abc"));
    }

    #[test]
    fn test_config_validate() {
        assert!(ClientConfig::new("https://trading.example.com")
            .validate()
            .is_ok());
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("ftp://trading.example.com")
            .validate()
            .is_err());
    }
}
