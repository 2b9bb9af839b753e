//! Business date module - resolves the single logical trading day in
//! effect and caches the result for the duration of a tick.

mod business_date_model;
mod business_date_service;
#[cfg(test)]
mod business_date_service_tests;
mod business_date_traits;

// Re-export the public interface
pub use business_date_model::{BusinessDateState, SpotBar, StrikeTrade};
pub use business_date_service::BusinessDateService;
pub use business_date_traits::{BusinessDateServiceTrait, SpotHistoryRepositoryTrait};
