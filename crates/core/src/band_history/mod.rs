//! Band history module - the append-only circuit-limit log and the
//! change-tracking ingestion pipeline that feeds it.

mod band_history_model;
mod band_history_service;
mod band_history_traits;

// Re-export the public interface
pub use band_history_model::{BandRecord, IngestOutcome, NewBandRecord};
pub use band_history_service::BandIngestService;
pub use band_history_traits::{BandHistoryRepositoryTrait, BandIngestServiceTrait};
