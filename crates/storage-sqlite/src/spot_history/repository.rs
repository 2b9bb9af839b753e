use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use super::model::SpotBarDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::spot_history::dsl as spot_dsl;
use bandwatch_core::business_date::{SpotBar, SpotHistoryRepositoryTrait};
use bandwatch_core::errors::Result;

pub struct SpotHistoryRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SpotHistoryRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SpotHistoryRepositoryTrait for SpotHistoryRepository {
    fn latest_for_symbol(&self, symbol: &str) -> Result<Option<SpotBar>> {
        let mut conn = get_connection(&self.pool)?;

        let result = spot_dsl::spot_history
            .filter(spot_dsl::symbol.eq(symbol))
            .order((spot_dsl::trade_date.desc(), spot_dsl::last_updated.desc()))
            .first::<SpotBarDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(result.map(SpotBar::from))
    }

    async fn upsert_daily_bar(&self, bar: SpotBar) -> Result<()> {
        let db_row = SpotBarDB::from(&bar);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::replace_into(spot_dsl::spot_history)
                    .values(&db_row)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }
}
