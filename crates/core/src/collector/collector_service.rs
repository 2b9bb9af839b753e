use chrono::Utc;
use log::{debug, error, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};
use uuid::Uuid;

use super::collector_model::{CollectorConfig, SessionRegime, TickSummary};
use crate::band_history::BandIngestServiceTrait;
use crate::business_date::{SpotBar, SpotHistoryRepositoryTrait};
use crate::errors::Result;
use crate::instruments::{Instrument, InstrumentRepositoryTrait};
use crate::market_data::{QuoteSnapshot, QuoteSourceTrait};
use crate::utils::time_utils;

/// The adaptive collection scheduler.
///
/// One cooperative periodic loop: a tick runs to completion before the
/// next delay is computed, and the regime is re-evaluated from the IST
/// wall clock on every iteration. A failed tick is logged and the loop
/// continues; only the stop signal, observed between ticks, ends it.
pub struct CollectorService {
    config: CollectorConfig,
    quote_source: Arc<dyn QuoteSourceTrait>,
    instrument_repository: Arc<dyn InstrumentRepositoryTrait>,
    spot_repository: Arc<dyn SpotHistoryRepositoryTrait>,
    ingest_service: Arc<dyn BandIngestServiceTrait>,
    is_running: Arc<RwLock<bool>>,
    stop_signal: Notify,
}

impl CollectorService {
    pub fn new(
        config: CollectorConfig,
        quote_source: Arc<dyn QuoteSourceTrait>,
        instrument_repository: Arc<dyn InstrumentRepositoryTrait>,
        spot_repository: Arc<dyn SpotHistoryRepositoryTrait>,
        ingest_service: Arc<dyn BandIngestServiceTrait>,
    ) -> Self {
        Self {
            config,
            quote_source,
            instrument_repository,
            spot_repository,
            ingest_service,
            is_running: Arc::new(RwLock::new(false)),
            stop_signal: Notify::new(),
        }
    }

    /// Runs the collection loop until [`stop`](Self::stop) is called.
    pub async fn run(&self) {
        *self.is_running.write().await = true;
        info!("Collector started (source: {})", self.quote_source.id());

        while *self.is_running.read().await {
            let regime = self.config.regime_at(time_utils::market_time_now());

            match self.collect_tick(regime).await {
                Ok(summary) => info!(
                    "Tick {} [{}]: {}/{} instruments covered ({:.0}%), {} saved, {} skipped",
                    summary.tick_id,
                    summary.regime.as_str(),
                    summary.received,
                    summary.targets,
                    summary.coverage() * 100.0,
                    summary.saved,
                    summary.skipped
                ),
                Err(e) => error!(
                    "Collection tick failed in {} regime: {}",
                    regime.as_str(),
                    e
                ),
            }

            // The stop signal is observed between ticks; a tick in
            // flight always completes.
            if !*self.is_running.read().await {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval_for(regime)) => {}
                _ = self.stop_signal.notified() => break,
            }
        }

        info!("Collector stopped");
    }

    /// Signals the loop to exit before its next tick. A sleeping loop
    /// wakes immediately; a tick in flight completes first.
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        self.stop_signal.notify_one();
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// One collection tick: fetch snapshots for the target universe,
    /// ingest the changes, then do the instrument bookkeeping.
    pub async fn collect_tick(&self, regime: SessionRegime) -> Result<TickSummary> {
        let tick_id = Uuid::new_v4();

        let universe = self.instrument_repository.list_active_options()?;
        if universe.is_empty() {
            warn!("Tick {}: no active option instruments to collect", tick_id);
            return Ok(TickSummary {
                tick_id,
                regime,
                targets: 0,
                received: 0,
                saved: 0,
                skipped: 0,
            });
        }

        // AFTER_HOURS is change-detection only; the other regimes also
        // refresh the daily spot bar. A failed refresh degrades the
        // business-date chain but never fails the tick.
        if regime != SessionRegime::AfterHours {
            if let Err(e) = self.refresh_spot().await {
                warn!("Tick {}: spot refresh failed: {}", tick_id, e);
            }
        }

        let tokens: Vec<i64> = universe.iter().map(|i| i.instrument_token).collect();

        let snapshots = match regime {
            SessionRegime::MarketHours => self.fetch_with_coverage(&tokens).await?,
            // Single best-effort attempt: these regimes exist for
            // low-frequency change detection, not completeness.
            _ => self.quote_source.fetch_quotes(&tokens).await?,
        };

        let received_tokens: Vec<i64> = snapshots.iter().map(|s| s.instrument_token).collect();
        let universe_map: HashMap<i64, Instrument> = universe
            .into_iter()
            .map(|i| (i.instrument_token, i))
            .collect();

        let outcome = self
            .ingest_service
            .ingest_batch(&snapshots, &universe_map)
            .await?;

        if !received_tokens.is_empty() {
            self.instrument_repository
                .mark_fetched(&received_tokens, Utc::now())
                .await?;
        }
        if let Some(business_date) = outcome.business_date {
            self.instrument_repository
                .refresh_expired_flags(business_date)
                .await?;
        }

        Ok(TickSummary {
            tick_id,
            regime,
            targets: tokens.len(),
            received: received_tokens.len(),
            saved: outcome.saved,
            skipped: outcome.skipped,
        })
    }

    /// Market-hours coverage protocol: up to `coverage_attempts` fetches,
    /// accumulating the union of returned tokens, stopping early once the
    /// target set is covered. Whatever was collected is returned after
    /// the final attempt; residual gaps are logged, not fatal.
    async fn fetch_with_coverage(&self, tokens: &[i64]) -> Result<Vec<QuoteSnapshot>> {
        let target: HashSet<i64> = tokens.iter().copied().collect();
        let mut collected: HashMap<i64, QuoteSnapshot> = HashMap::new();
        let mut missing: Vec<i64> = tokens.to_vec();
        let mut last_error = None;

        for attempt in 1..=self.config.coverage_attempts {
            match self.quote_source.fetch_quotes(&missing).await {
                Ok(batch) => {
                    for snapshot in batch {
                        collected.insert(snapshot.instrument_token, snapshot);
                    }
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!(
                            "Quote fetch attempt {}/{} failed: {}",
                            attempt, self.config.coverage_attempts, e
                        );
                    } else {
                        error!(
                            "Quote fetch attempt {}/{} failed terminally: {}",
                            attempt, self.config.coverage_attempts, e
                        );
                    }
                    last_error = Some(e);
                }
            }

            missing = target
                .iter()
                .filter(|token| !collected.contains_key(*token))
                .copied()
                .collect();
            if missing.is_empty() {
                break;
            }
            if attempt < self.config.coverage_attempts {
                debug!(
                    "Coverage attempt {}/{}: {} of {} instruments still missing",
                    attempt,
                    self.config.coverage_attempts,
                    missing.len(),
                    target.len()
                );
                tokio::time::sleep(self.config.coverage_backoff).await;
            }
        }

        if collected.is_empty() {
            // Nothing at all came back; surface the source failure as a
            // tick-level error if there was one.
            if let Some(e) = last_error {
                return Err(e.into());
            }
        }
        if !missing.is_empty() {
            warn!(
                "Coverage incomplete after {} attempts: {} of {} instruments missing",
                self.config.coverage_attempts,
                missing.len(),
                target.len()
            );
        }

        Ok(collected.into_values().collect())
    }

    /// Upserts today's spot bar while the index session is actively
    /// trading. Outside the session the stored history already carries
    /// the latest close, so there is nothing to write.
    async fn refresh_spot(&self) -> Result<()> {
        let snapshots = self
            .quote_source
            .fetch_quotes(&[self.config.spot_token])
            .await?;
        let Some(snapshot) = snapshots.into_iter().next() else {
            warn!(
                "Spot quote for {} missing from response",
                self.config.spot_symbol
            );
            return Ok(());
        };

        if !snapshot.ohlc.is_active_session() {
            debug!("Spot session not active; daily bar left untouched");
            return Ok(());
        }

        let bar = SpotBar {
            symbol: self.config.spot_symbol.clone(),
            trade_date: time_utils::market_today(),
            open: snapshot.ohlc.open,
            high: snapshot.ohlc.high,
            low: snapshot.ohlc.low,
            close: snapshot.last_price,
            last_updated: Utc::now(),
        };
        self.spot_repository.upsert_daily_bar(bar).await
    }
}
