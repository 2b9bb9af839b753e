use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::instruments_model::{Instrument, NewInstrument};
use crate::errors::Result;

#[async_trait]
pub trait InstrumentServiceTrait: Send + Sync {
    fn get_instruments(&self) -> Result<Vec<Instrument>>;
    fn get_active_options(&self) -> Result<Vec<Instrument>>;
    fn get_instrument(&self, instrument_token: i64) -> Result<Instrument>;
    async fn register_observed(&self, new_instrument: NewInstrument) -> Result<Instrument>;
    async fn refresh_expired_flags(&self, business_date: NaiveDate) -> Result<usize>;
    async fn reset_universe(&self) -> Result<usize>;
}

#[async_trait]
pub trait InstrumentRepositoryTrait: Send + Sync {
    fn list(&self) -> Result<Vec<Instrument>>;
    /// Option contracts that are not flagged expired - the collection universe.
    fn list_active_options(&self) -> Result<Vec<Instrument>>;
    fn get_by_token(&self, instrument_token: i64) -> Result<Option<Instrument>>;
    /// Inserts the instrument if unseen, otherwise leaves the stored row
    /// untouched (first-seen metadata is write-once).
    async fn upsert(&self, new_instrument: NewInstrument) -> Result<Instrument>;
    async fn mark_fetched(
        &self,
        instrument_tokens: &[i64],
        fetched_at: DateTime<Utc>,
    ) -> Result<usize>;
    /// Recomputes every expired flag against the given business date.
    async fn refresh_expired_flags(&self, business_date: NaiveDate) -> Result<usize>;
    /// Explicit reset - the only path that deletes instruments.
    async fn delete_all(&self) -> Result<usize>;
}
