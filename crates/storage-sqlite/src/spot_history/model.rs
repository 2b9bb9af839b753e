//! Database models for daily spot bars.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use bandwatch_core::business_date::SpotBar;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database model for spot history rows
#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Selectable, Insertable, AsChangeset,
)]
#[diesel(table_name = crate::schema::spot_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SpotBarDB {
    pub id: String,
    pub symbol: String,
    pub trade_date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub last_updated: String,
}

impl From<SpotBarDB> for SpotBar {
    fn from(db: SpotBarDB) -> Self {
        SpotBar {
            symbol: db.symbol,
            trade_date: NaiveDate::parse_from_str(&db.trade_date, DATE_FORMAT)
                .unwrap_or_default(),
            open: Decimal::from_str(&db.open).unwrap_or_default(),
            high: Decimal::from_str(&db.high).unwrap_or_default(),
            low: Decimal::from_str(&db.low).unwrap_or_default(),
            close: Decimal::from_str(&db.close).unwrap_or_default(),
            last_updated: DateTime::parse_from_rfc3339(&db.last_updated)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl From<&SpotBar> for SpotBarDB {
    fn from(bar: &SpotBar) -> Self {
        let trade_date = bar.trade_date.format(DATE_FORMAT).to_string();
        SpotBarDB {
            id: format!("{}_{}", bar.symbol, trade_date),
            symbol: bar.symbol.clone(),
            trade_date,
            open: bar.open.to_string(),
            high: bar.high.to_string(),
            low: bar.low.to_string(),
            close: bar.close.to_string(),
            last_updated: bar.last_updated.to_rfc3339(),
        }
    }
}
