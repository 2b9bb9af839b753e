//! Database models for the instrument universe.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use bandwatch_core::instruments::{Instrument, NewInstrument, OptionKind};

/// Database model for instruments
#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Selectable, Insertable, AsChangeset,
)]
#[diesel(table_name = crate::schema::instruments)]
#[diesel(primary_key(instrument_token))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDB {
    pub instrument_token: i64,
    pub tradingsymbol: String,
    pub underlying: String,
    pub strike: String,
    pub option_kind: String,
    pub expiry: Option<String>,
    pub first_seen_at: String,
    pub last_fetched_at: Option<String>,
    pub is_expired: bool,
}

// Conversion implementations

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

impl From<InstrumentDB> for Instrument {
    fn from(db: InstrumentDB) -> Self {
        Instrument {
            instrument_token: db.instrument_token,
            tradingsymbol: db.tradingsymbol,
            underlying: db.underlying,
            strike: Decimal::from_str(&db.strike).unwrap_or_default(),
            option_kind: OptionKind::from(db.option_kind.as_str()),
            expiry: db.expiry.as_deref().and_then(parse_date),
            first_seen_at: parse_datetime(&db.first_seen_at),
            last_fetched_at: db.last_fetched_at.as_deref().map(parse_datetime),
            is_expired: db.is_expired,
        }
    }
}

impl InstrumentDB {
    /// Row for a newly observed instrument; first-seen is stamped now
    /// and the expired flag starts clear.
    pub fn from_new(new: &NewInstrument) -> Self {
        InstrumentDB {
            instrument_token: new.instrument_token,
            tradingsymbol: new.tradingsymbol.clone(),
            underlying: new.underlying.clone(),
            strike: new.strike.to_string(),
            option_kind: new.option_kind.as_str().to_string(),
            expiry: new.expiry.map(|d| d.format("%Y-%m-%d").to_string()),
            first_seen_at: Utc::now().to_rfc3339(),
            last_fetched_at: None,
            is_expired: false,
        }
    }
}
