use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

use super::band_history_model::{BandRecord, IngestOutcome};
use crate::errors::Result;
use crate::instruments::Instrument;
use crate::market_data::QuoteSnapshot;

/// The change-tracking ingestion pipeline.
#[async_trait]
pub trait BandIngestServiceTrait: Send + Sync {
    /// Diffs a batch of fresh snapshots against the last persisted state
    /// and appends exactly the rows whose circuit-limit pair changed,
    /// with correct sequencing. Appending anything triggers a
    /// business-date re-resolution and retroactive stamp.
    ///
    /// `universe` maps instrument tokens to their contract metadata;
    /// snapshots for unknown tokens are dropped with a warning.
    async fn ingest_batch(
        &self,
        snapshots: &[QuoteSnapshot],
        universe: &HashMap<i64, Instrument>,
    ) -> Result<IngestOutcome>;
}

/// Storage interface for the append-only band history log.
///
/// Reads are synchronous pool queries; mutations go through the storage
/// crate's single writer so a batch save is one transaction.
#[async_trait]
pub trait BandHistoryRepositoryTrait: Send + Sync {
    /// Most recently persisted row for the key, by global sequence.
    fn latest_for_key(&self, instrument_token: i64, expiry: NaiveDate)
        -> Result<Option<BandRecord>>;

    /// Highest insertion sequence for the key on the given business
    /// date; 0 when the date has no rows yet.
    fn max_insertion_seq(
        &self,
        instrument_token: i64,
        expiry: NaiveDate,
        business_date: NaiveDate,
    ) -> Result<i32>;

    /// Highest global sequence for the key; 0 when the key is unseen.
    fn max_global_seq(&self, instrument_token: i64, expiry: NaiveDate) -> Result<i64>;

    /// Appends the batch in a single transaction. Returns the row count.
    async fn append_batch(&self, records: Vec<BandRecord>) -> Result<usize>;

    /// Stamps the business date onto every not-yet-stamped row recorded
    /// after the cutoff, reconciling rows written before the date was
    /// known. Idempotent: re-applying the same date is a no-op. Returns
    /// the number of rows touched.
    async fn stamp_business_date(
        &self,
        business_date: NaiveDate,
        recorded_after: DateTime<Utc>,
    ) -> Result<usize>;

    /// Full history for a key, ordered by global sequence ascending.
    fn list_for_key(&self, instrument_token: i64, expiry: NaiveDate) -> Result<Vec<BandRecord>>;

    /// All rows carrying the given business date, for reporting reads.
    fn list_for_business_date(&self, business_date: NaiveDate) -> Result<Vec<BandRecord>>;

    /// Recent rows with a real last-trade time, for the business-date
    /// resolver's strike scan.
    fn recent_with_last_trade_time(
        &self,
        recorded_after: DateTime<Utc>,
    ) -> Result<Vec<BandRecord>>;
}
