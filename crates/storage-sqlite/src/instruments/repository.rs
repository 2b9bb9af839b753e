use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use super::model::InstrumentDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::instruments::dsl as instruments_dsl;
use bandwatch_core::errors::{DatabaseError, Error, Result};
use bandwatch_core::instruments::{Instrument, InstrumentRepositoryTrait, NewInstrument, OptionKind};

pub struct InstrumentRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl InstrumentRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl InstrumentRepositoryTrait for InstrumentRepository {
    fn list(&self) -> Result<Vec<Instrument>> {
        let mut conn = get_connection(&self.pool)?;

        let results = instruments_dsl::instruments
            .order(instruments_dsl::tradingsymbol.asc())
            .load::<InstrumentDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(Instrument::from).collect())
    }

    fn list_active_options(&self) -> Result<Vec<Instrument>> {
        let mut conn = get_connection(&self.pool)?;

        let results = instruments_dsl::instruments
            .filter(instruments_dsl::is_expired.eq(false))
            .filter(instruments_dsl::option_kind.ne(OptionKind::Index.as_str()))
            .filter(instruments_dsl::expiry.is_not_null())
            .order(instruments_dsl::tradingsymbol.asc())
            .load::<InstrumentDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(Instrument::from).collect())
    }

    fn get_by_token(&self, instrument_token: i64) -> Result<Option<Instrument>> {
        let mut conn = get_connection(&self.pool)?;

        let result = instruments_dsl::instruments
            .find(instrument_token)
            .first::<InstrumentDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(result.map(Instrument::from))
    }

    async fn upsert(&self, new_instrument: NewInstrument) -> Result<Instrument> {
        let token = new_instrument.instrument_token;
        let db_row = InstrumentDB::from_new(&new_instrument);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                // First-seen metadata is write-once: an already-known
                // instrument keeps its stored row.
                diesel::insert_into(instruments_dsl::instruments)
                    .values(&db_row)
                    .on_conflict(instruments_dsl::instrument_token)
                    .do_nothing()
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await?;

        self.get_by_token(token)?.ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!(
                "Instrument {} missing after upsert",
                token
            )))
        })
    }

    async fn mark_fetched(
        &self,
        instrument_tokens: &[i64],
        fetched_at: DateTime<Utc>,
    ) -> Result<usize> {
        if instrument_tokens.is_empty() {
            return Ok(0);
        }

        let tokens = instrument_tokens.to_vec();
        let fetched_at_str = fetched_at.to_rfc3339();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut total = 0;
                // Chunked to stay under SQLite's bound-parameter limit.
                for chunk in tokens.chunks(500) {
                    total += diesel::update(
                        instruments_dsl::instruments
                            .filter(instruments_dsl::instrument_token.eq_any(chunk.to_vec())),
                    )
                    .set(instruments_dsl::last_fetched_at.eq(Some(fetched_at_str.clone())))
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                }
                Ok(total)
            })
            .await
    }

    async fn refresh_expired_flags(&self, business_date: NaiveDate) -> Result<usize> {
        let date_str = business_date.format("%Y-%m-%d").to_string();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                // Contracts whose expiry has passed the business date.
                let expired = diesel::update(
                    instruments_dsl::instruments
                        .filter(instruments_dsl::is_expired.eq(false))
                        .filter(instruments_dsl::expiry.lt(date_str.clone()))
                        .filter(instruments_dsl::expiry.is_not_null()),
                )
                .set(instruments_dsl::is_expired.eq(true))
                .execute(conn)
                .map_err(StorageError::QueryFailed)?;

                // Flags flip back if the business date moved backward.
                let revived = diesel::update(
                    instruments_dsl::instruments
                        .filter(instruments_dsl::is_expired.eq(true))
                        .filter(instruments_dsl::expiry.ge(date_str)),
                )
                .set(instruments_dsl::is_expired.eq(false))
                .execute(conn)
                .map_err(StorageError::QueryFailed)?;

                Ok(expired + revived)
            })
            .await
    }

    async fn delete_all(&self) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(instruments_dsl::instruments)
                    .execute(conn)
                    .map_err(|e| StorageError::QueryFailed(e).into())
            })
            .await
    }
}
