use async_trait::async_trait;
use chrono::NaiveDate;

use super::business_date_model::{SpotBar, StrikeTrade};
use crate::errors::Result;

/// Resolves the logical trading day currently in effect.
#[async_trait]
pub trait BusinessDateServiceTrait: Send + Sync {
    /// Recomputes the business date and overwrites the cache.
    ///
    /// `live_trades` are strike/last-trade-time pairs from the batch
    /// being ingested; when present they take precedence over persisted
    /// rows in the strike-LTT step, so a day rollover is detected on
    /// the first traded batch of the new session. Resolution never
    /// fails - the chain bottoms out at the wall-clock date.
    async fn resolve(&self, live_trades: &[StrikeTrade]) -> NaiveDate;

    /// The cached value, or a fresh resolution when nothing is cached.
    async fn current(&self) -> NaiveDate;
}

/// Storage interface for daily spot bars of the primary index.
#[async_trait]
pub trait SpotHistoryRepositoryTrait: Send + Sync {
    /// Most recent bar for the symbol, by trade date then last-updated.
    fn latest_for_symbol(&self, symbol: &str) -> Result<Option<SpotBar>>;

    /// Inserts or refreshes the bar for (symbol, trade date).
    async fn upsert_daily_bar(&self, bar: SpotBar) -> Result<()>;
}
