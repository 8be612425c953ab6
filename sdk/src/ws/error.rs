//! WebSocket error types.
//!
//! Provides error types for push-channel operations.

/// WebSocket errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WsError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// WebSocket protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Connection closed.
    #[error("connection closed")]
    Closed,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid channel endpoint.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for WsError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;

        match err {
            Error::ConnectionClosed | Error::AlreadyClosed => Self::Closed,
            other => Self::Protocol(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_error_display() {
        let err = WsError::Connection("timeout".to_string());
        assert_eq!(err.to_string(), "connection failed: timeout");
    }

    #[test]
    fn test_ws_error_from_tungstenite_closed() {
        let err = WsError::from(tokio_tungstenite::tungstenite::Error::ConnectionClosed);
        assert_eq!(err, WsError::Closed);
        assert_eq!(err.to_string(), "connection closed");
    }

    #[test]
    fn test_ws_error_invalid_endpoint() {
        let err = WsError::InvalidEndpoint("identity cannot be empty".to_string());
        assert_eq!(
            err.to_string(),
            "invalid endpoint: identity cannot be empty"
        );
    }
}
