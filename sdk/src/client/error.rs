//! Client error types.
//!
//! Provides error types for HTTP client operations.

/// Client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Failed to deserialize response.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// API returned an error response.
    #[error("API error [{status}]: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Rate limited (429).
    #[error("rate limited{}", retry_suffix(.retry_after))]
    RateLimited {
        /// Retry after seconds.
        retry_after: Option<u64>,
    },

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Unauthorized (401/403). The session is missing or expired.
    #[error("unauthorized")]
    Unauthorized,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,
}

fn retry_suffix(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!(", retry after {} seconds", secs),
        None => String::new(),
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }
}
