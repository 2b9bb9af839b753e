//! Database models for the band history log.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use bandwatch_core::band_history::BandRecord;
use bandwatch_core::instruments::OptionKind;
use bandwatch_core::market_data::Ohlc;

const DATE_FORMAT: &str = "%Y-%m-%d";
const LTT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Database model for band history rows
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    Queryable,
    Identifiable,
    Selectable,
    Insertable,
    QueryableByName,
)]
#[diesel(table_name = crate::schema::band_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct BandRecordDB {
    pub id: String,
    pub instrument_token: i64,
    pub tradingsymbol: String,
    pub strike: String,
    pub option_kind: String,
    pub expiry: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub last_price: String,
    pub lower_circuit_limit: String,
    pub upper_circuit_limit: String,
    pub last_trade_time: Option<String>,
    pub recorded_at: String,
    pub business_date: Option<String>,
    pub insertion_seq: i32,
    pub global_seq: i64,
}

// Conversion implementations

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

impl From<BandRecordDB> for BandRecord {
    fn from(db: BandRecordDB) -> Self {
        BandRecord {
            id: db.id,
            instrument_token: db.instrument_token,
            tradingsymbol: db.tradingsymbol,
            strike: Decimal::from_str(&db.strike).unwrap_or_default(),
            option_kind: OptionKind::from(db.option_kind.as_str()),
            expiry: parse_date(&db.expiry).unwrap_or_default(),
            ohlc: Ohlc {
                open: Decimal::from_str(&db.open).unwrap_or_default(),
                high: Decimal::from_str(&db.high).unwrap_or_default(),
                low: Decimal::from_str(&db.low).unwrap_or_default(),
                close: Decimal::from_str(&db.close).unwrap_or_default(),
            },
            last_price: Decimal::from_str(&db.last_price).unwrap_or_default(),
            lower_circuit_limit: Decimal::from_str(&db.lower_circuit_limit).unwrap_or_default(),
            upper_circuit_limit: Decimal::from_str(&db.upper_circuit_limit).unwrap_or_default(),
            last_trade_time: db
                .last_trade_time
                .as_deref()
                .and_then(|s| NaiveDateTime::parse_from_str(s, LTT_FORMAT).ok()),
            recorded_at: parse_datetime(&db.recorded_at),
            business_date: db.business_date.as_deref().and_then(parse_date),
            insertion_seq: db.insertion_seq,
            global_seq: db.global_seq,
        }
    }
}

impl From<&BandRecord> for BandRecordDB {
    fn from(record: &BandRecord) -> Self {
        BandRecordDB {
            id: record.id.clone(),
            instrument_token: record.instrument_token,
            tradingsymbol: record.tradingsymbol.clone(),
            strike: record.strike.to_string(),
            option_kind: record.option_kind.as_str().to_string(),
            expiry: record.expiry.format(DATE_FORMAT).to_string(),
            open: record.ohlc.open.to_string(),
            high: record.ohlc.high.to_string(),
            low: record.ohlc.low.to_string(),
            close: record.ohlc.close.to_string(),
            last_price: record.last_price.to_string(),
            lower_circuit_limit: record.lower_circuit_limit.to_string(),
            upper_circuit_limit: record.upper_circuit_limit.to_string(),
            last_trade_time: record
                .last_trade_time
                .map(|ltt| ltt.format(LTT_FORMAT).to_string()),
            recorded_at: record.recorded_at.to_rfc3339(),
            business_date: record
                .business_date
                .map(|d| d.format(DATE_FORMAT).to_string()),
            insertion_seq: record.insertion_seq,
            global_seq: record.global_seq,
        }
    }
}
