//! Quote snapshot domain models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Open/high/low/close prices for the current session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Ohlc {
    /// Whether the session has traded: open, high, and low are all
    /// non-zero only once the market has printed.
    pub fn is_active_session(&self) -> bool {
        self.open > Decimal::ZERO && self.high > Decimal::ZERO && self.low > Decimal::ZERO
    }
}

/// One instrument's state as returned by the quote source.
///
/// The source may omit instruments from a response (partial coverage);
/// callers must not assume one snapshot per requested token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub instrument_token: i64,
    pub ohlc: Ohlc,
    pub last_price: Decimal,
    pub lower_circuit_limit: Decimal,
    pub upper_circuit_limit: Decimal,
    /// Exchange timestamp of the last trade, in exchange-local time.
    /// `None` when the source reports a default/zero value, i.e. the
    /// instrument has not traded.
    pub last_trade_time: Option<NaiveDateTime>,
}

impl QuoteSnapshot {
    /// The dedup key of the band history log: the circuit-limit pair and
    /// nothing else. Widening this key would change row counts and
    /// sequence numbering.
    pub fn band(&self) -> (Decimal, Decimal) {
        (self.lower_circuit_limit, self.upper_circuit_limit)
    }
}
