//! Channel endpoints.
//!
//! The server exposes two push endpoints:
//!
//! - `{scheme}://{host}/ws/trading/{identity}/`: per-user wallet and trades
//! - `{scheme}://{host}/ws/prices/`: global price ticks

use std::fmt;

use super::error::WsError;

/// Role of a push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    /// Per-user wallet and trade updates.
    Trading,
    /// Global price ticks and executions.
    Price,
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trading => write!(f, "trading"),
            Self::Price => write!(f, "price"),
        }
    }
}

/// Socket scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    /// Plain `ws://`.
    #[default]
    Ws,
    /// TLS `wss://`.
    Wss,
}

impl Scheme {
    /// Mirrors a page scheme: `https` maps to `wss`, anything else to `ws`.
    ///
    /// Accepts the scheme with or without the trailing colon.
    #[must_use]
    pub fn from_page_scheme(page_scheme: &str) -> Self {
        let scheme = page_scheme.trim().trim_end_matches(':');
        if scheme.eq_ignore_ascii_case("https") {
            Self::Wss
        } else {
            Self::Ws
        }
    }

    /// Returns the scheme as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ws => "ws",
            Self::Wss => "wss",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable address of one push channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelEndpoint {
    url: String,
    scheme: Scheme,
    role: ChannelRole,
}

impl ChannelEndpoint {
    /// Creates the trading endpoint for `identity`.
    ///
    /// The identity is percent-encoded as a single path segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity is empty.
    pub fn trading(scheme: Scheme, host: &str, identity: &str) -> Result<Self, WsError> {
        if identity.trim().is_empty() {
            return Err(WsError::InvalidEndpoint(
                "identity cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            url: format!(
                "{}://{}/ws/trading/{}/",
                scheme,
                host,
                urlencoding::encode(identity)
            ),
            scheme,
            role: ChannelRole::Trading,
        })
    }

    /// Creates the global price endpoint.
    #[must_use]
    pub fn prices(scheme: Scheme, host: &str) -> Self {
        Self {
            url: format!("{}://{}/ws/prices/", scheme, host),
            scheme,
            role: ChannelRole::Price,
        }
    }

    /// Returns the full URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the scheme.
    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns the channel role.
    #[must_use]
    pub const fn role(&self) -> ChannelRole {
        self.role
    }
}

impl fmt::Display for ChannelEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_from_page_scheme() {
        assert_eq!(Scheme::from_page_scheme("https:"), Scheme::Wss);
        assert_eq!(Scheme::from_page_scheme("https"), Scheme::Wss);
        assert_eq!(Scheme::from_page_scheme("HTTPS:"), Scheme::Wss);
        assert_eq!(Scheme::from_page_scheme("http:"), Scheme::Ws);
        assert_eq!(Scheme::from_page_scheme("file:"), Scheme::Ws);
    }

    #[test]
    fn test_trading_endpoint_encodes_identity() {
        let endpoint = ChannelEndpoint::trading(Scheme::Wss, "localhost:8000", "alice@example.com")
            .expect("endpoint");
        assert_eq!(
            endpoint.url(),
            "wss://localhost:8000/ws/trading/alice%40example.com/"
        );
        assert_eq!(endpoint.role(), ChannelRole::Trading);
        assert_eq!(endpoint.scheme(), Scheme::Wss);
    }

    #[test]
    fn test_trading_endpoint_encodes_path_separators() {
        let endpoint =
            ChannelEndpoint::trading(Scheme::Ws, "localhost:8000", "a/b c").expect("endpoint");
        assert_eq!(endpoint.url(), "ws://localhost:8000/ws/trading/a%2Fb%20c/");
    }

    #[test]
    fn test_trading_endpoint_empty_identity() {
        assert!(ChannelEndpoint::trading(Scheme::Ws, "localhost:8000", "").is_err());
        assert!(ChannelEndpoint::trading(Scheme::Ws, "localhost:8000", "   ").is_err());
    }

    #[test]
    fn test_price_endpoint() {
        let endpoint = ChannelEndpoint::prices(Scheme::Ws, "localhost:8000");
        assert_eq!(endpoint.url(), "ws://localhost:8000/ws/prices/");
        assert_eq!(endpoint.role(), ChannelRole::Price);
        assert_eq!(endpoint.to_string(), endpoint.url());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(ChannelRole::Trading.to_string(), "trading");
        assert_eq!(ChannelRole::Price.to_string(), "price");
    }
}
