//! Collector domain models: session regimes and the immutable
//! collection configuration.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::collector_constants::*;
use crate::constants::{DEFAULT_SPOT_SYMBOL, DEFAULT_SPOT_TOKEN};

/// Collection regime, a pure function of IST wall-clock time.
///
/// Nothing is persisted: a restarted process lands in the correct
/// regime on its first tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionRegime {
    /// 06:00-09:15: low-frequency change detection plus spot refresh.
    PreMarket,
    /// 09:15-15:30: full-universe collection with the coverage protocol.
    MarketHours,
    /// 15:30-06:00: hourly change detection, no spot refresh.
    AfterHours,
}

impl SessionRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionRegime::PreMarket => "PRE_MARKET",
            SessionRegime::MarketHours => "MARKET_HOURS",
            SessionRegime::AfterHours => "AFTER_HOURS",
        }
    }
}

/// Immutable collection configuration, assembled once at startup and
/// passed into the collector; nothing re-reads ambient configuration
/// per tick.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub pre_market_start: NaiveTime,
    pub market_open: NaiveTime,
    pub market_close: NaiveTime,
    pub pre_market_interval: Duration,
    pub market_hours_interval: Duration,
    pub after_hours_interval: Duration,
    /// Bounded attempts of the market-hours coverage protocol.
    pub coverage_attempts: u32,
    /// Fixed pause between coverage attempts.
    pub coverage_backoff: Duration,
    /// Trading symbol of the primary index.
    pub spot_symbol: String,
    /// Instrument token of the primary index on the quote source.
    pub spot_token: i64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            pre_market_start: time_of(PRE_MARKET_START),
            market_open: time_of(MARKET_OPEN),
            market_close: time_of(MARKET_CLOSE),
            pre_market_interval: Duration::from_secs(PRE_MARKET_INTERVAL_SECS),
            market_hours_interval: Duration::from_secs(MARKET_HOURS_INTERVAL_SECS),
            after_hours_interval: Duration::from_secs(AFTER_HOURS_INTERVAL_SECS),
            coverage_attempts: COVERAGE_MAX_ATTEMPTS,
            coverage_backoff: Duration::from_secs(COVERAGE_BACKOFF_SECS),
            spot_symbol: DEFAULT_SPOT_SYMBOL.to_string(),
            spot_token: DEFAULT_SPOT_TOKEN,
        }
    }
}

fn time_of((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("static session boundary")
}

impl CollectorConfig {
    /// Selects the regime for an IST wall-clock time. Exactly one regime
    /// matches any time; boundaries belong to the later window.
    pub fn regime_at(&self, time: NaiveTime) -> SessionRegime {
        if time >= self.pre_market_start && time < self.market_open {
            SessionRegime::PreMarket
        } else if time >= self.market_open && time < self.market_close {
            SessionRegime::MarketHours
        } else {
            SessionRegime::AfterHours
        }
    }

    /// The tick interval dictated by a regime.
    pub fn interval_for(&self, regime: SessionRegime) -> Duration {
        match regime {
            SessionRegime::PreMarket => self.pre_market_interval,
            SessionRegime::MarketHours => self.market_hours_interval,
            SessionRegime::AfterHours => self.after_hours_interval,
        }
    }
}

/// Outcome of one collection tick, logged for observability.
#[derive(Debug, Clone)]
pub struct TickSummary {
    pub tick_id: Uuid,
    pub regime: SessionRegime,
    /// Instruments in the target universe this tick.
    pub targets: usize,
    /// Instruments for which a fresh quote was obtained.
    pub received: usize,
    pub saved: usize,
    pub skipped: usize,
}

impl TickSummary {
    /// Fraction of the target set covered this tick.
    pub fn coverage(&self) -> f64 {
        if self.targets == 0 {
            1.0
        } else {
            self.received as f64 / self.targets as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_regime_selection_is_deterministic() {
        let config = CollectorConfig::default();

        assert_eq!(config.regime_at(at(5, 59)), SessionRegime::AfterHours);
        assert_eq!(config.regime_at(at(6, 0)), SessionRegime::PreMarket);
        assert_eq!(config.regime_at(at(9, 14)), SessionRegime::PreMarket);
        assert_eq!(config.regime_at(at(9, 15)), SessionRegime::MarketHours);
        assert_eq!(config.regime_at(at(9, 20)), SessionRegime::MarketHours);
        assert_eq!(config.regime_at(at(15, 29)), SessionRegime::MarketHours);
        assert_eq!(config.regime_at(at(15, 30)), SessionRegime::AfterHours);
        assert_eq!(config.regime_at(at(23, 45)), SessionRegime::AfterHours);
        assert_eq!(config.regime_at(at(0, 30)), SessionRegime::AfterHours);
    }

    #[test]
    fn test_intervals_follow_the_regime_table() {
        let config = CollectorConfig::default();

        assert_eq!(
            config.interval_for(SessionRegime::PreMarket),
            Duration::from_secs(180)
        );
        assert_eq!(
            config.interval_for(SessionRegime::MarketHours),
            Duration::from_secs(60)
        );
        assert_eq!(
            config.interval_for(SessionRegime::AfterHours),
            Duration::from_secs(3_600)
        );
    }

    #[test]
    fn test_coverage_ratio() {
        let summary = TickSummary {
            tick_id: Uuid::new_v4(),
            regime: SessionRegime::MarketHours,
            targets: 4,
            received: 3,
            saved: 1,
            skipped: 2,
        };
        assert!((summary.coverage() - 0.75).abs() < f64::EPSILON);
    }
}
