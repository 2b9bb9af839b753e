//! Business date domain models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily OHLC bar of the primary index.
///
/// Written by the collector's spot refresh, read back by the resolver's
/// historical fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotBar {
    pub symbol: String,
    pub trade_date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl SpotBar {
    /// Whether this bar captures an actively trading session: open,
    /// high, and low are all non-zero only once the market has printed.
    pub fn session_active(&self) -> bool {
        self.open > Decimal::ZERO && self.high > Decimal::ZERO && self.low > Decimal::ZERO
    }
}

/// A strike paired with a real (non-default) last-trade time, the raw
/// material of the strike-LTT resolution step.
#[derive(Debug, Clone)]
pub struct StrikeTrade {
    pub strike: Decimal,
    pub last_trade_time: NaiveDateTime,
}

/// Process-local cache of the last resolution.
///
/// Lives until the next successful resolution overwrites it; never a
/// source of truth across ticks.
#[derive(Debug, Clone, Copy)]
pub struct BusinessDateState {
    pub date: NaiveDate,
    pub resolved_at: DateTime<Utc>,
}
