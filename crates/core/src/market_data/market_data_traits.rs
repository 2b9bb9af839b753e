use async_trait::async_trait;

use super::market_data_errors::QuoteSourceError;
use super::market_data_model::QuoteSnapshot;

/// Trait for quote sources.
///
/// Implement this trait to plug in a broker or data-vendor quote API.
/// The collector depends only on this interface.
#[async_trait]
pub trait QuoteSourceTrait: Send + Sync {
    /// Unique identifier for this source, used in logging and errors.
    fn id(&self) -> &'static str;

    /// Fetch current snapshots for the given instrument tokens.
    ///
    /// The returned vector may cover a strict subset of the requested
    /// tokens; a missing instrument is not an error. A failed call
    /// returns an error and no snapshots.
    async fn fetch_quotes(
        &self,
        instrument_tokens: &[i64],
    ) -> Result<Vec<QuoteSnapshot>, QuoteSourceError>;
}
