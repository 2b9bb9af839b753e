use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use log::{debug, error};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::business_date_model::{BusinessDateState, StrikeTrade};
use super::business_date_traits::{BusinessDateServiceTrait, SpotHistoryRepositoryTrait};
use crate::band_history::BandHistoryRepositoryTrait;
use crate::constants::STRIKE_LTT_LOOKBACK_HOURS;
use crate::errors::Result;
use crate::utils::time_utils;

/// Resolves the logical trading day through a fixed priority chain:
///
/// 1. Strike-LTT: the last-trade-time date of the option strike nearest
///    to the reference spot price.
/// 2. Most recent historical spot bar's trade date.
/// 3. Previous weekday relative to wall-clock now.
/// 4. Wall-clock today (also the answer when any step errors).
///
/// Each step is an ordinary found/not-found branch; absence of data is
/// never an exception.
pub struct BusinessDateService {
    band_repository: Arc<dyn BandHistoryRepositoryTrait>,
    spot_repository: Arc<dyn SpotHistoryRepositoryTrait>,
    spot_symbol: String,
    state: RwLock<Option<BusinessDateState>>,
}

impl BusinessDateService {
    pub fn new(
        band_repository: Arc<dyn BandHistoryRepositoryTrait>,
        spot_repository: Arc<dyn SpotHistoryRepositoryTrait>,
        spot_symbol: String,
    ) -> Self {
        Self {
            band_repository,
            spot_repository,
            spot_symbol,
            state: RwLock::new(None),
        }
    }

    fn resolve_chain(&self, live_trades: &[StrikeTrade]) -> Result<NaiveDate> {
        if let Some(date) = self.from_strike_ltt(live_trades)? {
            debug!("Business date {} resolved via strike-LTT", date);
            return Ok(date);
        }

        if let Some(date) = self.from_spot_history()? {
            debug!("Business date {} resolved via historical spot", date);
            return Ok(date);
        }

        let date = time_utils::previous_trading_day(time_utils::market_today());
        debug!("Business date {} resolved via previous trading day", date);
        Ok(date)
    }

    /// Strike-LTT method: pick the strike nearest the reference spot
    /// price among candidates carrying a real last-trade time; the date
    /// component of that trade is the business date.
    fn from_strike_ltt(&self, live_trades: &[StrikeTrade]) -> Result<Option<NaiveDate>> {
        let Some(spot) = self.spot_repository.latest_for_symbol(&self.spot_symbol)? else {
            return Ok(None);
        };
        // Today's actively trading session anchors on its open; a bar
        // carried over from an earlier session contributes its close
        // (the "previous close" branch).
        let reference = if spot.trade_date == time_utils::market_today() && spot.session_active() {
            spot.open
        } else {
            spot.close
        };
        if reference <= Decimal::ZERO {
            return Ok(None);
        }

        let candidates = if live_trades.is_empty() {
            self.persisted_strike_trades()?
        } else {
            dedup_by_strike(live_trades)
        };

        Ok(candidates
            .into_iter()
            .min_by_key(|trade| (trade.strike - reference).abs())
            .map(|trade| trade.last_trade_time.date()))
    }

    /// Fallback candidates from the store: recent band rows with a real
    /// last-trade time, keeping only the most-recently-inserted row per
    /// strike.
    fn persisted_strike_trades(&self) -> Result<Vec<StrikeTrade>> {
        let cutoff = Utc::now() - Duration::hours(STRIKE_LTT_LOOKBACK_HOURS);
        let rows = self.band_repository.recent_with_last_trade_time(cutoff)?;

        let mut latest_per_strike: HashMap<Decimal, (i64, StrikeTrade)> = HashMap::new();
        for row in rows {
            let Some(ltt) = row.last_trade_time else {
                continue;
            };
            let entry = (
                row.global_seq,
                StrikeTrade {
                    strike: row.strike,
                    last_trade_time: ltt,
                },
            );
            match latest_per_strike.get(&row.strike) {
                Some((seq, _)) if *seq >= row.global_seq => {}
                _ => {
                    latest_per_strike.insert(row.strike, entry);
                }
            }
        }

        Ok(latest_per_strike
            .into_values()
            .map(|(_, trade)| trade)
            .collect())
    }

    fn from_spot_history(&self) -> Result<Option<NaiveDate>> {
        Ok(self
            .spot_repository
            .latest_for_symbol(&self.spot_symbol)?
            .map(|bar| bar.trade_date))
    }
}

/// Keeps the freshest trade per strike.
fn dedup_by_strike(trades: &[StrikeTrade]) -> Vec<StrikeTrade> {
    let mut latest: HashMap<Decimal, StrikeTrade> = HashMap::new();
    for trade in trades {
        match latest.get(&trade.strike) {
            Some(existing) if existing.last_trade_time >= trade.last_trade_time => {}
            _ => {
                latest.insert(trade.strike, trade.clone());
            }
        }
    }
    latest.into_values().collect()
}

#[async_trait]
impl BusinessDateServiceTrait for BusinessDateService {
    async fn resolve(&self, live_trades: &[StrikeTrade]) -> NaiveDate {
        let date = match self.resolve_chain(live_trades) {
            Ok(date) => date,
            Err(e) => {
                error!(
                    "Business date resolution failed ({}), falling back to wall-clock today",
                    e
                );
                time_utils::market_today()
            }
        };

        let mut state = self.state.write().await;
        *state = Some(BusinessDateState {
            date,
            resolved_at: Utc::now(),
        });
        date
    }

    async fn current(&self) -> NaiveDate {
        if let Some(state) = *self.state.read().await {
            return state.date;
        }
        self.resolve(&[]).await
    }
}
