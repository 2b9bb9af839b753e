use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use super::model::BandRecordDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::band_history::dsl as band_dsl;
use bandwatch_core::band_history::{BandHistoryRepositoryTrait, BandRecord};
use bandwatch_core::errors::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct BandHistoryRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BandHistoryRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl BandHistoryRepositoryTrait for BandHistoryRepository {
    fn latest_for_key(
        &self,
        instrument_token: i64,
        expiry: NaiveDate,
    ) -> Result<Option<BandRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let result = band_dsl::band_history
            .filter(band_dsl::instrument_token.eq(instrument_token))
            .filter(band_dsl::expiry.eq(expiry.format(DATE_FORMAT).to_string()))
            .order(band_dsl::global_seq.desc())
            .first::<BandRecordDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(result.map(BandRecord::from))
    }

    fn max_insertion_seq(
        &self,
        instrument_token: i64,
        expiry: NaiveDate,
        business_date: NaiveDate,
    ) -> Result<i32> {
        let mut conn = get_connection(&self.pool)?;

        let max: Option<i32> = band_dsl::band_history
            .filter(band_dsl::instrument_token.eq(instrument_token))
            .filter(band_dsl::expiry.eq(expiry.format(DATE_FORMAT).to_string()))
            .filter(band_dsl::business_date.eq(business_date.format(DATE_FORMAT).to_string()))
            .select(diesel::dsl::max(band_dsl::insertion_seq))
            .first(&mut conn)
            .into_core()?;

        Ok(max.unwrap_or(0))
    }

    fn max_global_seq(&self, instrument_token: i64, expiry: NaiveDate) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;

        let max: Option<i64> = band_dsl::band_history
            .filter(band_dsl::instrument_token.eq(instrument_token))
            .filter(band_dsl::expiry.eq(expiry.format(DATE_FORMAT).to_string()))
            .select(diesel::dsl::max(band_dsl::global_seq))
            .first(&mut conn)
            .into_core()?;

        Ok(max.unwrap_or(0))
    }

    async fn append_batch(&self, records: Vec<BandRecord>) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let db_rows: Vec<BandRecordDB> = records.iter().map(BandRecordDB::from).collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut total = 0;
                for chunk in db_rows.chunks(1_000) {
                    total += diesel::insert_into(band_dsl::band_history)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::QueryFailed)?;
                }
                Ok(total)
            })
            .await
    }

    async fn stamp_business_date(
        &self,
        business_date: NaiveDate,
        recorded_after: DateTime<Utc>,
    ) -> Result<usize> {
        let date_str = business_date.format(DATE_FORMAT).to_string();
        let cutoff_str = recorded_after.to_rfc3339();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::update(
                    band_dsl::band_history
                        .filter(band_dsl::business_date.is_null())
                        .filter(band_dsl::recorded_at.ge(cutoff_str)),
                )
                .set(band_dsl::business_date.eq(Some(date_str)))
                .execute(conn)
                .map_err(|e| StorageError::QueryFailed(e).into())
            })
            .await
    }

    fn list_for_key(&self, instrument_token: i64, expiry: NaiveDate) -> Result<Vec<BandRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let results = band_dsl::band_history
            .filter(band_dsl::instrument_token.eq(instrument_token))
            .filter(band_dsl::expiry.eq(expiry.format(DATE_FORMAT).to_string()))
            .order(band_dsl::global_seq.asc())
            .load::<BandRecordDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(BandRecord::from).collect())
    }

    fn list_for_business_date(&self, business_date: NaiveDate) -> Result<Vec<BandRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let results = band_dsl::band_history
            .filter(band_dsl::business_date.eq(business_date.format(DATE_FORMAT).to_string()))
            .order((
                band_dsl::instrument_token.asc(),
                band_dsl::expiry.asc(),
                band_dsl::insertion_seq.asc(),
            ))
            .load::<BandRecordDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(BandRecord::from).collect())
    }

    fn recent_with_last_trade_time(
        &self,
        recorded_after: DateTime<Utc>,
    ) -> Result<Vec<BandRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let results = band_dsl::band_history
            .filter(band_dsl::last_trade_time.is_not_null())
            .filter(band_dsl::recorded_at.ge(recorded_after.to_rfc3339()))
            .order(band_dsl::global_seq.asc())
            .load::<BandRecordDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(BandRecord::from).collect())
    }
}
