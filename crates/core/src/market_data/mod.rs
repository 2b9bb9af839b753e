//! Market data module - quote snapshot model, source trait, and source
//! implementations.

mod market_data_errors;
mod market_data_model;
mod market_data_traits;
pub mod sources;

// Re-export the public interface
pub use market_data_errors::QuoteSourceError;
pub use market_data_model::{Ohlc, QuoteSnapshot};
pub use market_data_traits::QuoteSourceTrait;

// Re-export source implementations
pub use sources::http_source::HttpQuoteSource;
