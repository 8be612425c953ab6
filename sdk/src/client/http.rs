//! HTTP client implementation.
//!
//! Fetches the dashboard snapshot the push channels fold onto.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use super::config::ClientConfig;
use super::error::ClientError;
use crate::types::DashboardSnapshot;

/// Dashboard snapshot path.
pub const DASHBOARD_PATH: &str = "/api/virtual-trading-dashboard/";

/// Error body returned by the backend.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl ApiErrorResponse {
    fn into_message(self) -> Option<String> {
        self.error.or(self.detail)
    }
}

/// HTTP client for the trading dashboard REST API.
#[derive(Debug, Clone)]
pub struct TradingClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl TradingClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(cookie) = config.cookie_header() {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| ClientError::InvalidConfig(format!("invalid cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        if let Some(ref csrf_token) = config.csrf_token {
            let value = HeaderValue::from_str(csrf_token)
                .map_err(|e| ClientError::InvalidConfig(format!("invalid csrf token: {}", e)))?;
            headers.insert("X-CSRFToken", value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(&config.user_agent)
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self { config, http })
    }

    /// Creates a new client with the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(ClientConfig::new(base_url))
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetches the dashboard snapshot: wallet, open positions, recent trades
    /// and statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is not
    /// authenticated.
    pub async fn get_dashboard(&self) -> Result<DashboardSnapshot, ClientError> {
        self.get(DASHBOARD_PATH).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Makes a GET request to the given path.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        debug!(%url, "GET");
        self.request_with_retry(path, || self.http.get(&url)).await
    }

    /// Makes a request with retry logic.
    async fn request_with_retry<T, F>(&self, path: &str, request_fn: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error = None;
        let mut retry_count = 0;

        while retry_count <= self.config.max_retries {
            let response = request_fn().send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let body = resp
                            .text()
                            .await
                            .map_err(|e| ClientError::Deserialization(e.to_string()))?;

                        return serde_json::from_str(&body)
                            .map_err(|e| ClientError::Deserialization(e.to_string()));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse().ok());

                        if retry_count < self.config.max_retries {
                            let wait_time = retry_after.unwrap_or(1);
                            warn!(path, wait_time, "rate limited, retrying");
                            tokio::time::sleep(Duration::from_secs(wait_time)).await;
                            retry_count += 1;
                            continue;
                        }

                        return Err(ClientError::RateLimited { retry_after });
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ClientError::NotFound(path.to_string()));
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED
                        || status == reqwest::StatusCode::FORBIDDEN
                    {
                        return Err(ClientError::Unauthorized);
                    }

                    let body = resp.text().await.unwrap_or_default();
                    let message = serde_json::from_str::<ApiErrorResponse>(&body)
                        .ok()
                        .and_then(ApiErrorResponse::into_message)
                        .unwrap_or(body);

                    return Err(ClientError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }
                Err(e) => {
                    if e.is_timeout() && retry_count < self.config.max_retries {
                        retry_count += 1;
                        warn!(path, retry_count, "request timed out, retrying");
                        tokio::time::sleep(Duration::from_millis(100 * (1 << retry_count))).await;
                        last_error = Some(ClientError::from(e));
                        continue;
                    }
                    return Err(ClientError::from(e));
                }
            }
        }

        Err(last_error.unwrap_or(ClientError::Timeout))
    }
}
