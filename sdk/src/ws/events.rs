//! Events published on the [`EventBus`](super::bus::EventBus).

use std::fmt;

use super::endpoint::ChannelRole;
use crate::types::{PriceTick, TradeRecord, WalletSnapshot};

/// Message used when an inbound frame is not valid JSON.
pub const MALFORMED_FRAME_MESSAGE: &str = "Invalid message format";

/// Message used for transport-level socket errors.
pub const TRANSPORT_ERROR_MESSAGE: &str = "WebSocket connection error";

/// Message used once reconnection attempts are exhausted.
pub const EXHAUSTED_MESSAGE: &str = "Connection lost. Please refresh the page.";

/// Event subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Wallet snapshot.
    WalletData,
    /// Full open-trade list.
    OpenTrades,
    /// Single trade delta.
    TradeUpdate,
    /// Price tick.
    PriceUpdate,
    /// Trade execution notice.
    TradeExecuted,
    /// Any error surfaced by the channels.
    Error,
    /// A notification the presentation layer may show.
    Notification,
}

impl EventKind {
    /// All event kinds.
    pub const ALL: [Self; 7] = [
        Self::WalletData,
        Self::OpenTrades,
        Self::TradeUpdate,
        Self::PriceUpdate,
        Self::TradeExecuted,
        Self::Error,
        Self::Notification,
    ];

    /// Returns the event kind as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WalletData => "wallet_data",
            Self::OpenTrades => "open_trades",
            Self::TradeUpdate => "trade_update",
            Self::PriceUpdate => "price_update",
            Self::TradeExecuted => "trade_executed",
            Self::Error => "error",
            Self::Notification => "notification",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of an error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Socket error or abnormal close. Recovered by reconnecting.
    Transport,
    /// Malformed frame. The frame is dropped.
    Protocol,
    /// Reconnect attempts exhausted. Terminal for this session.
    Exhausted,
    /// Error frame sent by the server.
    Application,
}

/// Typed error payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    /// Error origin.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Channel the error came from.
    pub role: Option<ChannelRole>,
}

impl ErrorEvent {
    /// Creates a new error event.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>, role: Option<ChannelRole>) -> Self {
        Self {
            kind,
            message: message.into(),
            role,
        }
    }

    /// Returns true if the session cannot recover without a fresh connect.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.kind, ErrorKind::Exhausted)
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Some(role) => write!(f, "[{}] {}", role, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    /// Informational.
    Info,
    /// Error.
    Error,
}

/// A notification requested by the core; rendering is up to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Text to show.
    pub message: String,
}

impl Notification {
    /// Creates an info notification.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    /// Creates an error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Event payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Wallet snapshot, replaces the previous one.
    WalletData(WalletSnapshot),
    /// Full open-trade list, replaces the open set.
    OpenTrades(Vec<TradeRecord>),
    /// Single trade delta, merged into the open set.
    TradeUpdate(TradeRecord),
    /// Price tick, upserted into the price map.
    PriceUpdate(PriceTick),
    /// Trade execution notice.
    TradeExecuted(TradeRecord),
    /// Error.
    Error(ErrorEvent),
    /// Notification request.
    Notification(Notification),
}

impl Event {
    /// Returns the subscription key of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::WalletData(_) => EventKind::WalletData,
            Self::OpenTrades(_) => EventKind::OpenTrades,
            Self::TradeUpdate(_) => EventKind::TradeUpdate,
            Self::PriceUpdate(_) => EventKind::PriceUpdate,
            Self::TradeExecuted(_) => EventKind::TradeExecuted,
            Self::Error(_) => EventKind::Error,
            Self::Notification(_) => EventKind::Notification,
        }
    }
}
