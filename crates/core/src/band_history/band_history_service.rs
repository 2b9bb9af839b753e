use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use super::band_history_model::{BandRecord, IngestOutcome, NewBandRecord};
use super::band_history_traits::{BandHistoryRepositoryTrait, BandIngestServiceTrait};
use crate::business_date::{BusinessDateServiceTrait, StrikeTrade};
use crate::constants::BUSINESS_DATE_STAMP_WINDOW_HOURS;
use crate::errors::Result;
use crate::instruments::Instrument;
use crate::market_data::QuoteSnapshot;

/// The change-tracking ingestion pipeline.
///
/// Converts a batch of fresh snapshots into zero or more appended band
/// rows. A row is appended iff the incoming circuit-limit pair differs
/// from the most recent persisted row for the same (instrument, expiry),
/// or no prior row exists; identical pairs are silently discarded.
///
/// Sequencing is read-then-write against committed state and assumes a
/// single writer process; concurrent writer instances would race the
/// max+1 computation.
pub struct BandIngestService {
    repository: Arc<dyn BandHistoryRepositoryTrait>,
    business_date: Arc<dyn BusinessDateServiceTrait>,
    stamp_window: Duration,
}

impl BandIngestService {
    pub fn new(
        repository: Arc<dyn BandHistoryRepositoryTrait>,
        business_date: Arc<dyn BusinessDateServiceTrait>,
    ) -> Self {
        Self {
            repository,
            business_date,
            stamp_window: Duration::hours(BUSINESS_DATE_STAMP_WINDOW_HOURS),
        }
    }

    /// Strike/last-trade-time evidence for business-date resolution,
    /// taken from the batch itself so a session rollover is seen before
    /// any sequencing happens.
    fn live_trades(
        snapshots: &[QuoteSnapshot],
        universe: &HashMap<i64, Instrument>,
    ) -> Vec<StrikeTrade> {
        snapshots
            .iter()
            .filter_map(|snapshot| {
                let instrument = universe.get(&snapshot.instrument_token)?;
                let last_trade_time = snapshot.last_trade_time?;
                Some(StrikeTrade {
                    strike: instrument.strike,
                    last_trade_time,
                })
            })
            .collect()
    }
}

#[async_trait]
impl BandIngestServiceTrait for BandIngestService {
    async fn ingest_batch(
        &self,
        snapshots: &[QuoteSnapshot],
        universe: &HashMap<i64, Instrument>,
    ) -> Result<IngestOutcome> {
        if snapshots.is_empty() {
            return Ok(IngestOutcome::default());
        }

        // One resolution per batch: it drives the per-day sequencing and,
        // when the batch turns out to be change-bearing, the retroactive
        // stamp below.
        let resolved = self
            .business_date
            .resolve(&Self::live_trades(snapshots, universe))
            .await;

        let recorded_at = Utc::now();
        let mut to_save: Vec<BandRecord> = Vec::new();
        let mut skipped = 0usize;

        for snapshot in snapshots {
            let Some(instrument) = universe.get(&snapshot.instrument_token) else {
                warn!(
                    "Dropping snapshot for unknown instrument token {}",
                    snapshot.instrument_token
                );
                continue;
            };
            let Some(expiry) = instrument.expiry else {
                warn!(
                    "Dropping snapshot for {}: no contract expiry",
                    instrument.tradingsymbol
                );
                continue;
            };

            let latest = self
                .repository
                .latest_for_key(snapshot.instrument_token, expiry)?;

            let (insertion_seq, global_seq) = match latest {
                Some(ref existing) if existing.band_matches(snapshot) => {
                    // Pure duplicate: no row, no sequence movement.
                    skipped += 1;
                    continue;
                }
                Some(_) => {
                    let insertion = self.repository.max_insertion_seq(
                        snapshot.instrument_token,
                        expiry,
                        resolved,
                    )? + 1;
                    let global = self
                        .repository
                        .max_global_seq(snapshot.instrument_token, expiry)?
                        + 1;
                    (insertion, global)
                }
                // First observation for this key.
                None => (1, 1),
            };

            let record = NewBandRecord {
                instrument_token: snapshot.instrument_token,
                tradingsymbol: instrument.tradingsymbol.clone(),
                strike: instrument.strike,
                option_kind: instrument.option_kind,
                expiry,
                ohlc: snapshot.ohlc.clone(),
                last_price: snapshot.last_price,
                lower_circuit_limit: snapshot.lower_circuit_limit,
                upper_circuit_limit: snapshot.upper_circuit_limit,
                last_trade_time: snapshot.last_trade_time,
                recorded_at,
                // Stamped by the retroactive pass below once the batch
                // is known to be change-bearing.
                business_date: None,
                insertion_seq,
                global_seq,
            }
            .into_record();
            to_save.push(record);
        }

        let saved = if to_save.is_empty() {
            0
        } else {
            // One transaction for the whole batch; a failure here aborts
            // everything and surfaces as a tick-level error.
            self.repository.append_batch(to_save).await?
        };

        let mut business_date = None;
        if saved > 0 {
            let cutoff = Utc::now() - self.stamp_window;
            let stamped = self
                .repository
                .stamp_business_date(resolved, cutoff)
                .await?;
            debug!(
                "Stamped business date {} onto {} rows in trailing window",
                resolved, stamped
            );
            business_date = Some(resolved);
        }

        info!(
            "Band ingest: {} saved, {} skipped of {} snapshots",
            saved,
            skipped,
            snapshots.len()
        );

        Ok(IngestOutcome {
            saved,
            skipped,
            business_date,
        })
    }
}
