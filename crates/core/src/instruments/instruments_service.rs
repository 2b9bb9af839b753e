use chrono::NaiveDate;
use log::{debug, info};
use std::sync::Arc;

use super::instruments_model::{Instrument, NewInstrument};
use super::instruments_traits::{InstrumentRepositoryTrait, InstrumentServiceTrait};
use crate::errors::{DatabaseError, Error, Result};

/// Service for managing the tracked instrument universe.
pub struct InstrumentService {
    repository: Arc<dyn InstrumentRepositoryTrait>,
}

impl InstrumentService {
    pub fn new(repository: Arc<dyn InstrumentRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl InstrumentServiceTrait for InstrumentService {
    fn get_instruments(&self) -> Result<Vec<Instrument>> {
        self.repository.list()
    }

    fn get_active_options(&self) -> Result<Vec<Instrument>> {
        self.repository.list_active_options()
    }

    fn get_instrument(&self, instrument_token: i64) -> Result<Instrument> {
        self.repository
            .get_by_token(instrument_token)?
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!(
                    "No instrument with token {}",
                    instrument_token
                )))
            })
    }

    async fn register_observed(&self, new_instrument: NewInstrument) -> Result<Instrument> {
        debug!(
            "Registering observed instrument {} ({})",
            new_instrument.tradingsymbol, new_instrument.instrument_token
        );
        self.repository.upsert(new_instrument).await
    }

    async fn refresh_expired_flags(&self, business_date: NaiveDate) -> Result<usize> {
        let changed = self.repository.refresh_expired_flags(business_date).await?;
        if changed > 0 {
            info!(
                "Expired flags recomputed against {}: {} instruments updated",
                business_date, changed
            );
        }
        Ok(changed)
    }

    async fn reset_universe(&self) -> Result<usize> {
        let removed = self.repository.delete_all().await?;
        info!("Instrument universe reset: {} instruments removed", removed);
        Ok(removed)
    }
}
