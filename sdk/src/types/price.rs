//! Price types for the Smart Trading SDK.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A live price tick from the price channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Instrument key, e.g. `NSE_EQ|INE002A01018`.
    pub instrument_key: String,

    /// Last traded price.
    pub current_price: Decimal,

    /// Server time of the tick.
    pub timestamp: DateTime<Utc>,
}

impl PriceTick {
    /// Returns the price map entry for this tick.
    #[must_use]
    pub fn entry(&self) -> PriceEntry {
        PriceEntry {
            price: self.current_price,
            timestamp: self.timestamp,
        }
    }
}

/// Latest known price for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// Last traded price.
    pub price: Decimal,

    /// Server time of the tick.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_tick_deserialize() {
        let json = r#"{"instrument_key":"NSE_EQ|INE002A01018","current_price":1450.5,"timestamp":"2024-01-01T10:00:00Z"}"#;
        let tick: PriceTick = serde_json::from_str(json).expect("deserialize");
        assert_eq!(tick.instrument_key, "NSE_EQ|INE002A01018");
        assert_eq!(tick.current_price, Decimal::new(14505, 1));
        assert_eq!(tick.timestamp.to_rfc3339(), "2024-01-01T10:00:00+00:00");
    }

    #[test]
    fn test_price_tick_offset_timestamp() {
        let json = r#"{"instrument_key":"K","current_price":1,"timestamp":"2024-01-01T15:30:00.123456+05:30"}"#;
        let tick: PriceTick = serde_json::from_str(json).expect("deserialize");
        assert_eq!(tick.entry().timestamp.to_rfc3339(), "2024-01-01T10:00:00.123456+00:00");
    }
}
