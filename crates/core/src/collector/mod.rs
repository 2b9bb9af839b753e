//! Collector module - the adaptive collection scheduler.

mod collector_constants;
mod collector_model;
mod collector_service;

// Re-export the public interface
pub use collector_constants::*;
pub use collector_model::{CollectorConfig, SessionRegime, TickSummary};
pub use collector_service::CollectorService;
