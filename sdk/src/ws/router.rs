//! Inbound frame classification.
//!
//! Every text frame is first parsed as `{"type", "data"}` and then decoded
//! per channel role into a closed [`Frame`] variant. Routing turns data
//! frames into bus events; protocol frames stay inside the channel.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::bus::EventBus;
use super::endpoint::ChannelRole;
use super::events::{ErrorEvent, ErrorKind, Event, MALFORMED_FRAME_MESSAGE};
use super::messages::{Frame, InboundFrame, PriceFrame, ServerError, TradingFrame};
use super::metrics::ChannelMetrics;

/// Frame decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The frame is not a JSON object with a `type` field.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The payload does not match the schema for its type.
    #[error("invalid {kind} payload: {reason}")]
    Payload {
        /// Frame type.
        kind: String,
        /// Decoder message.
        reason: String,
    },
}

/// Classifies inbound frames and publishes them on the bus.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    bus: EventBus,
    metrics: Arc<ChannelMetrics>,
}

impl MessageRouter {
    /// Creates a router publishing on `bus`.
    #[must_use]
    pub fn new(bus: EventBus, metrics: Arc<ChannelMetrics>) -> Self {
        Self { bus, metrics }
    }

    /// Decodes a text frame received on a channel with the given role.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Malformed`] if the text is not a typed JSON
    /// frame and [`RouteError::Payload`] if its payload does not decode.
    pub fn decode(role: ChannelRole, text: &str) -> Result<Frame, RouteError> {
        let frame: InboundFrame =
            serde_json::from_str(text).map_err(|e| RouteError::Malformed(e.to_string()))?;

        match role {
            ChannelRole::Trading => decode_trading(frame).map(Frame::Trading),
            ChannelRole::Price => decode_price(frame).map(Frame::Price),
        }
    }

    /// Decodes a frame and publishes the result.
    ///
    /// Data frames become events, pongs are consumed, unknown types and
    /// undecodable payloads are logged and dropped. A malformed frame
    /// publishes exactly one protocol error.
    pub fn route(&self, role: ChannelRole, text: &str) {
        self.metrics.record_frame_received();

        let frame = match Self::decode(role, text) {
            Ok(frame) => frame,
            Err(RouteError::Malformed(reason)) => {
                warn!(%role, %reason, "malformed frame");
                self.metrics.record_frame_malformed();
                self.metrics.record_error();
                self.bus.emit(&Event::Error(ErrorEvent::new(
                    ErrorKind::Protocol,
                    MALFORMED_FRAME_MESSAGE,
                    Some(role),
                )));
                return;
            }
            Err(err @ RouteError::Payload { .. }) => {
                warn!(%role, error = %err, "dropping frame");
                self.metrics.record_frame_dropped();
                return;
            }
        };

        let event = match frame {
            Frame::Trading(TradingFrame::WalletData(wallet)) => Event::WalletData(wallet),
            Frame::Trading(TradingFrame::OpenTrades(trades)) => Event::OpenTrades(trades),
            Frame::Trading(TradingFrame::TradeUpdate(trade)) => Event::TradeUpdate(trade),
            Frame::Price(PriceFrame::PriceUpdate(tick)) => Event::PriceUpdate(tick),
            Frame::Price(PriceFrame::TradeExecuted(trade)) => Event::TradeExecuted(trade),
            Frame::Trading(TradingFrame::Error(err)) | Frame::Price(PriceFrame::Error(err)) => {
                self.metrics.record_error();
                Event::Error(ErrorEvent::new(
                    ErrorKind::Application,
                    err.message,
                    Some(role),
                ))
            }
            Frame::Trading(TradingFrame::Pong) | Frame::Price(PriceFrame::Pong) => {
                debug!(%role, "pong");
                return;
            }
            Frame::Trading(TradingFrame::Unrecognized(kind))
            | Frame::Price(PriceFrame::Unrecognized(kind)) => {
                debug!(%role, kind = %kind, "unrecognized frame type");
                self.metrics.record_frame_dropped();
                return;
            }
        };

        self.bus.emit(&event);
    }
}

fn decode_trading(frame: InboundFrame) -> Result<TradingFrame, RouteError> {
    if let Some(err) = embedded_error(&frame) {
        return Ok(TradingFrame::Error(err));
    }

    Ok(match frame.kind.as_str() {
        "wallet_data" => TradingFrame::WalletData(payload(&frame)?),
        "open_trades" => TradingFrame::OpenTrades(payload(&frame)?),
        "trade_update" => TradingFrame::TradeUpdate(payload(&frame)?),
        "pong" => TradingFrame::Pong,
        "error" => TradingFrame::Error(server_error(&frame)),
        _ => TradingFrame::Unrecognized(frame.kind),
    })
}

fn decode_price(frame: InboundFrame) -> Result<PriceFrame, RouteError> {
    if let Some(err) = embedded_error(&frame) {
        return Ok(PriceFrame::Error(err));
    }

    Ok(match frame.kind.as_str() {
        "price_update" => PriceFrame::PriceUpdate(payload(&frame)?),
        "trade_executed" => PriceFrame::TradeExecuted(payload(&frame)?),
        "pong" => PriceFrame::Pong,
        "error" => PriceFrame::Error(server_error(&frame)),
        _ => PriceFrame::Unrecognized(frame.kind),
    })
}

fn payload<T: DeserializeOwned>(frame: &InboundFrame) -> Result<T, RouteError> {
    T::deserialize(&frame.data).map_err(|e| RouteError::Payload {
        kind: frame.kind.clone(),
        reason: e.to_string(),
    })
}

/// Data frames whose payload is `{"error": "..."}` report a server-side failure.
fn embedded_error(frame: &InboundFrame) -> Option<ServerError> {
    if frame.kind == "error" {
        return None;
    }

    frame
        .data
        .get("error")
        .and_then(Value::as_str)
        .map(|message| ServerError {
            message: message.to_string(),
        })
}

fn server_error(frame: &InboundFrame) -> ServerError {
    let message = frame
        .data
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| frame.message.clone())
        .unwrap_or_else(|| "Unknown server error".to_string());

    ServerError { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TradeStatus;
    use crate::ws::events::EventKind;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Mutex;

    fn capture(bus: &EventBus) -> Arc<Mutex<Vec<Event>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for kind in EventKind::ALL {
            let log = Arc::clone(&log);
            bus.on(
                kind,
                &EventBus::handler(move |event| {
                    log.lock().expect("lock").push(event.clone());
                }),
            );
        }
        log
    }

    fn router() -> (MessageRouter, Arc<Mutex<Vec<Event>>>, Arc<ChannelMetrics>) {
        let bus = EventBus::new();
        let log = capture(&bus);
        let metrics = Arc::new(ChannelMetrics::new());
        (MessageRouter::new(bus, Arc::clone(&metrics)), log, metrics)
    }

    #[test]
    fn test_decode_wallet_data() {
        let text = r#"{"type":"wallet_data","data":{"balance":"100000.00","total_pnl":"250.50","total_value":"100250.50","win_rate":"55.5","total_trades":12}}"#;
        let frame = MessageRouter::decode(ChannelRole::Trading, text).expect("decode");

        let Frame::Trading(TradingFrame::WalletData(wallet)) = frame else {
            panic!("expected wallet data, got {frame:?}");
        };
        assert_eq!(wallet.total_trades, 12);
        assert_eq!(wallet.balance, Decimal::from_str("100000.00").expect("decimal"));
    }

    #[test]
    fn test_decode_open_trades() {
        let text = r#"{"type":"open_trades","data":[{"id":1,"tradingsymbol":"TCS","status":"OPEN"},{"trade_id":2,"status":"PENDING"}]}"#;
        let frame = MessageRouter::decode(ChannelRole::Trading, text).expect("decode");

        let Frame::Trading(TradingFrame::OpenTrades(trades)) = frame else {
            panic!("expected open trades, got {frame:?}");
        };
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[1].id, 2);
        assert_eq!(trades[1].status, TradeStatus::Pending);
    }

    #[test]
    fn test_decode_price_update() {
        let text = r#"{"type":"price_update","data":{"instrument_key":"NSE_EQ|INE002A01018","current_price":1450.5,"timestamp":"2024-01-01T10:00:00Z"}}"#;
        let frame = MessageRouter::decode(ChannelRole::Price, text).expect("decode");

        let Frame::Price(PriceFrame::PriceUpdate(tick)) = frame else {
            panic!("expected price update, got {frame:?}");
        };
        assert_eq!(tick.instrument_key, "NSE_EQ|INE002A01018");
    }

    #[test]
    fn test_decode_is_role_specific() {
        let text = r#"{"type":"price_update","data":{}}"#;
        let frame = MessageRouter::decode(ChannelRole::Trading, text).expect("decode");
        assert_eq!(
            frame,
            Frame::Trading(TradingFrame::Unrecognized("price_update".to_string()))
        );
    }

    #[test]
    fn test_decode_pong() {
        let frame =
            MessageRouter::decode(ChannelRole::Price, r#"{"type":"pong"}"#).expect("decode");
        assert_eq!(frame, Frame::Price(PriceFrame::Pong));
    }

    #[test]
    fn test_decode_error_message_locations() {
        let nested = r#"{"type":"error","data":{"message":"Unknown command"}}"#;
        let top = r#"{"type":"error","message":"Invalid JSON"}"#;

        assert_eq!(
            MessageRouter::decode(ChannelRole::Trading, nested).expect("decode"),
            Frame::Trading(TradingFrame::Error(ServerError {
                message: "Unknown command".to_string()
            }))
        );
        assert_eq!(
            MessageRouter::decode(ChannelRole::Trading, top).expect("decode"),
            Frame::Trading(TradingFrame::Error(ServerError {
                message: "Invalid JSON".to_string()
            }))
        );
    }

    #[test]
    fn test_decode_embedded_error_payload() {
        let text = r#"{"type":"wallet_data","data":{"error":"User not found"}}"#;
        let frame = MessageRouter::decode(ChannelRole::Trading, text).expect("decode");
        assert_eq!(
            frame,
            Frame::Trading(TradingFrame::Error(ServerError {
                message: "User not found".to_string()
            }))
        );
    }

    #[test]
    fn test_decode_malformed() {
        let err = MessageRouter::decode(ChannelRole::Trading, "not json").expect_err("malformed");
        assert!(matches!(err, RouteError::Malformed(_)));

        let err = MessageRouter::decode(ChannelRole::Price, r#"{"data":{}}"#).expect_err("no type");
        assert!(matches!(err, RouteError::Malformed(_)));
    }

    #[test]
    fn test_decode_payload_mismatch() {
        let text = r#"{"type":"trade_update","data":{"status":"OPEN"}}"#;
        let err = MessageRouter::decode(ChannelRole::Trading, text).expect_err("missing id");
        assert!(matches!(err, RouteError::Payload { ref kind, .. } if kind == "trade_update"));
    }

    #[test]
    fn test_route_malformed_emits_single_protocol_error() {
        let (router, log, metrics) = router();
        router.route(ChannelRole::Trading, "{oops");

        let events = log.lock().expect("lock").clone();
        assert_eq!(events.len(), 1);
        let Event::Error(err) = &events[0] else {
            panic!("expected error event");
        };
        assert_eq!(err.kind, ErrorKind::Protocol);
        assert_eq!(err.message, MALFORMED_FRAME_MESSAGE);
        assert_eq!(err.role, Some(ChannelRole::Trading));
        assert_eq!(metrics.frames_malformed(), 1);
    }

    #[test]
    fn test_route_pong_and_unknown_are_silent() {
        let (router, log, metrics) = router();
        router.route(ChannelRole::Trading, r#"{"type":"pong"}"#);
        router.route(ChannelRole::Trading, r#"{"type":"portfolio_rebalanced","data":{}}"#);
        router.route(ChannelRole::Price, r#"{"type":"price_update","data":{"bogus":true}}"#);

        assert!(log.lock().expect("lock").is_empty());
        assert_eq!(metrics.frames_received(), 3);
        assert_eq!(metrics.frames_dropped(), 2);
    }

    #[test]
    fn test_route_data_frames() {
        let (router, log, _) = router();
        router.route(
            ChannelRole::Trading,
            r#"{"type":"trade_update","data":{"id":7,"status":"OPEN","tradingsymbol":"TCS","pnl":120}}"#,
        );
        router.route(
            ChannelRole::Price,
            r#"{"type":"trade_executed","data":{"id":9,"tradingsymbol":"INFY","status":"OPEN"}}"#,
        );
        router.route(ChannelRole::Price, r#"{"type":"error","message":"Rate limited"}"#);

        let events = log.lock().expect("lock").clone();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], Event::TradeUpdate(t) if t.id == 7));
        assert!(matches!(&events[1], Event::TradeExecuted(t) if t.id == 9));
        assert!(matches!(
            &events[2],
            Event::Error(e) if e.kind == ErrorKind::Application && e.message == "Rate limited"
        ));
    }
}
