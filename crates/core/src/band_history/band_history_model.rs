//! Band history domain models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::instruments::OptionKind;
use crate::market_data::{Ohlc, QuoteSnapshot};

/// One row in the append-only circuit-limit history log.
///
/// Rows are immutable once written; the business date is the single
/// field that may be bulk-patched after the fact. For a fixed
/// (instrument, expiry) the global sequence strictly increases by 1 per
/// row; the insertion sequence restarts at 1 on each new business date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandRecord {
    pub id: String,
    pub instrument_token: i64,
    pub tradingsymbol: String,
    pub strike: Decimal,
    pub option_kind: OptionKind,
    pub expiry: NaiveDate,
    pub ohlc: Ohlc,
    pub last_price: Decimal,
    pub lower_circuit_limit: Decimal,
    pub upper_circuit_limit: Decimal,
    pub last_trade_time: Option<NaiveDateTime>,
    /// Wall clock at ingestion.
    pub recorded_at: DateTime<Utc>,
    /// Logical trading day. Stamped retroactively; `None` only for rows
    /// the stamp has not reached yet.
    pub business_date: Option<NaiveDate>,
    /// Ordinal among rows for the same instrument+expiry+business date.
    pub insertion_seq: i32,
    /// Ordinal among all rows for the same instrument+expiry.
    pub global_seq: i64,
}

impl BandRecord {
    /// Whether the incoming snapshot carries the same circuit-limit pair
    /// as this row. This comparison is the entire dedup key - OHLC and
    /// last price never participate.
    pub fn band_matches(&self, snapshot: &QuoteSnapshot) -> bool {
        (self.lower_circuit_limit, self.upper_circuit_limit) == snapshot.band()
    }
}

/// Payload for appending a new band row; the repository assigns nothing,
/// the pipeline computes both sequence numbers before the save.
#[derive(Debug, Clone)]
pub struct NewBandRecord {
    pub instrument_token: i64,
    pub tradingsymbol: String,
    pub strike: Decimal,
    pub option_kind: OptionKind,
    pub expiry: NaiveDate,
    pub ohlc: Ohlc,
    pub last_price: Decimal,
    pub lower_circuit_limit: Decimal,
    pub upper_circuit_limit: Decimal,
    pub last_trade_time: Option<NaiveDateTime>,
    pub recorded_at: DateTime<Utc>,
    pub business_date: Option<NaiveDate>,
    pub insertion_seq: i32,
    pub global_seq: i64,
}

impl NewBandRecord {
    /// Deterministic row id: key plus the global sequence, which is
    /// unique within the key by construction.
    pub fn record_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.instrument_token,
            self.expiry.format("%Y%m%d"),
            self.global_seq
        )
    }

    pub fn into_record(self) -> BandRecord {
        let id = self.record_id();
        BandRecord {
            id,
            instrument_token: self.instrument_token,
            tradingsymbol: self.tradingsymbol,
            strike: self.strike,
            option_kind: self.option_kind,
            expiry: self.expiry,
            ohlc: self.ohlc,
            last_price: self.last_price,
            lower_circuit_limit: self.lower_circuit_limit,
            upper_circuit_limit: self.upper_circuit_limit,
            last_trade_time: self.last_trade_time,
            recorded_at: self.recorded_at,
            business_date: self.business_date,
            insertion_seq: self.insertion_seq,
            global_seq: self.global_seq,
        }
    }
}

/// Per-batch ingestion accounting, reported for observability.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    /// Rows appended because the circuit pair changed (or was unseen).
    pub saved: usize,
    /// Snapshots discarded as pure duplicates.
    pub skipped: usize,
    /// The business date stamped after a change-bearing batch; `None`
    /// when the batch appended nothing.
    pub business_date: Option<NaiveDate>,
}
