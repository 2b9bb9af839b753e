#[cfg(test)]
mod tests {
    use crate::band_history::{BandHistoryRepositoryTrait, BandRecord};
    use crate::business_date::{
        BusinessDateService, BusinessDateServiceTrait, SpotBar, SpotHistoryRepositoryTrait,
        StrikeTrade,
    };
    use crate::errors::Result;
    use crate::instruments::OptionKind;
    use crate::market_data::Ohlc;
    use crate::utils::time_utils;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    const SPOT_SYMBOL: &str = "NIFTY 50";

    // --- Mock BandHistoryRepository (read side only) ---

    #[derive(Default)]
    struct MockBandRepository {
        rows: Mutex<Vec<BandRecord>>,
    }

    impl MockBandRepository {
        fn push(&self, strike: Decimal, global_seq: i64, ltt: NaiveDateTime) {
            self.rows.lock().unwrap().push(BandRecord {
                id: format!("row_{}_{}", strike, global_seq),
                instrument_token: 111,
                tradingsymbol: "OPT".to_string(),
                strike,
                option_kind: OptionKind::Call,
                expiry: NaiveDate::from_ymd_opt(2025, 3, 27).unwrap(),
                ohlc: Ohlc::default(),
                last_price: Decimal::ZERO,
                lower_circuit_limit: Decimal::ZERO,
                upper_circuit_limit: Decimal::ZERO,
                last_trade_time: Some(ltt),
                recorded_at: Utc::now(),
                business_date: None,
                insertion_seq: 1,
                global_seq,
            });
        }
    }

    #[async_trait]
    impl BandHistoryRepositoryTrait for MockBandRepository {
        fn latest_for_key(&self, _: i64, _: NaiveDate) -> Result<Option<BandRecord>> {
            Ok(None)
        }

        fn max_insertion_seq(&self, _: i64, _: NaiveDate, _: NaiveDate) -> Result<i32> {
            Ok(0)
        }

        fn max_global_seq(&self, _: i64, _: NaiveDate) -> Result<i64> {
            Ok(0)
        }

        async fn append_batch(&self, _: Vec<BandRecord>) -> Result<usize> {
            unimplemented!()
        }

        async fn stamp_business_date(&self, _: NaiveDate, _: DateTime<Utc>) -> Result<usize> {
            unimplemented!()
        }

        fn list_for_key(&self, _: i64, _: NaiveDate) -> Result<Vec<BandRecord>> {
            Ok(Vec::new())
        }

        fn list_for_business_date(&self, _: NaiveDate) -> Result<Vec<BandRecord>> {
            Ok(Vec::new())
        }

        fn recent_with_last_trade_time(&self, _: DateTime<Utc>) -> Result<Vec<BandRecord>> {
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    // --- Mock SpotHistoryRepository ---

    #[derive(Default)]
    struct MockSpotRepository {
        bars: Mutex<Vec<SpotBar>>,
    }

    impl MockSpotRepository {
        fn push(&self, bar: SpotBar) {
            self.bars.lock().unwrap().push(bar);
        }
    }

    #[async_trait]
    impl SpotHistoryRepositoryTrait for MockSpotRepository {
        fn latest_for_symbol(&self, symbol: &str) -> Result<Option<SpotBar>> {
            Ok(self
                .bars
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.symbol == symbol)
                .max_by_key(|b| (b.trade_date, b.last_updated))
                .cloned())
        }

        async fn upsert_daily_bar(&self, bar: SpotBar) -> Result<()> {
            self.push(bar);
            Ok(())
        }
    }

    // --- Helpers ---

    fn bar(trade_date: NaiveDate, open: Decimal, close: Decimal) -> SpotBar {
        let active = open > Decimal::ZERO;
        SpotBar {
            symbol: SPOT_SYMBOL.to_string(),
            trade_date,
            open,
            high: if active { close + dec!(50) } else { Decimal::ZERO },
            low: if active { open - dec!(50) } else { Decimal::ZERO },
            close,
            last_updated: Utc::now(),
        }
    }

    fn ltt(date: NaiveDate) -> NaiveDateTime {
        date.and_hms_opt(15, 29, 0).unwrap()
    }

    fn service(
        band: Arc<MockBandRepository>,
        spot: Arc<MockSpotRepository>,
    ) -> BusinessDateService {
        BusinessDateService::new(band, spot, SPOT_SYMBOL.to_string())
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_strike_ltt_wins_over_spot_history() {
        let band = Arc::new(MockBandRepository::default());
        let spot = Arc::new(MockSpotRepository::default());

        let trade_day = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
        let spot_day = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();

        // Today's session is active around 22510; nearest strike is 22500.
        spot.push(bar(time_utils::market_today(), dec!(22510), dec!(22540)));
        band.push(dec!(22500), 4, ltt(trade_day));
        band.push(dec!(23000), 7, ltt(spot_day));

        let resolved = service(band, spot).resolve(&[]).await;
        assert_eq!(resolved, trade_day);
    }

    #[tokio::test]
    async fn test_live_trades_take_precedence_over_persisted_rows() {
        let band = Arc::new(MockBandRepository::default());
        let spot = Arc::new(MockSpotRepository::default());

        let yesterday = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();

        spot.push(bar(time_utils::market_today(), dec!(22510), dec!(22540)));
        // Persisted rows still carry yesterday's trades.
        band.push(dec!(22500), 4, ltt(yesterday));

        let live = vec![StrikeTrade {
            strike: dec!(22500),
            last_trade_time: ltt(today),
        }];

        let resolved = service(band, spot).resolve(&live).await;
        assert_eq!(resolved, today);
    }

    #[tokio::test]
    async fn test_nearest_strike_is_selected() {
        let band = Arc::new(MockBandRepository::default());
        let spot = Arc::new(MockSpotRepository::default());

        let near_day = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
        let far_day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();

        spot.push(bar(time_utils::market_today(), dec!(22480), dec!(22540)));
        band.push(dec!(22500), 2, ltt(near_day)); // 20 points away
        band.push(dec!(22000), 9, ltt(far_day)); // 480 points away

        let resolved = service(band, spot).resolve(&[]).await;
        assert_eq!(resolved, near_day);
    }

    #[tokio::test]
    async fn test_newest_row_per_strike_wins() {
        let band = Arc::new(MockBandRepository::default());
        let spot = Arc::new(MockSpotRepository::default());

        let stale_day = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let fresh_day = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();

        spot.push(bar(time_utils::market_today(), dec!(22500), dec!(22540)));
        // Two rows for the same strike; the higher global sequence is newer.
        band.push(dec!(22500), 3, ltt(stale_day));
        band.push(dec!(22500), 8, ltt(fresh_day));

        let resolved = service(band, spot).resolve(&[]).await;
        assert_eq!(resolved, fresh_day);
    }

    #[tokio::test]
    async fn test_spot_history_fallback_when_no_trades() {
        let band = Arc::new(MockBandRepository::default());
        let spot = Arc::new(MockSpotRepository::default());

        let spot_day = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        spot.push(bar(spot_day, dec!(22400), dec!(22450)));

        // No band rows at all: strike-LTT yields nothing, the historical
        // spot row decides.
        let resolved = service(band, spot).resolve(&[]).await;
        assert_eq!(resolved, spot_day);
    }

    #[tokio::test]
    async fn test_weekday_fallback_when_no_data_at_all() {
        let band = Arc::new(MockBandRepository::default());
        let spot = Arc::new(MockSpotRepository::default());

        let resolved = service(band, spot).resolve(&[]).await;
        assert_eq!(
            resolved,
            time_utils::previous_trading_day(time_utils::market_today())
        );
    }

    #[tokio::test]
    async fn test_resolution_is_cached_for_current() {
        let band = Arc::new(MockBandRepository::default());
        let spot = Arc::new(MockSpotRepository::default());

        let spot_day = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        spot.push(bar(spot_day, dec!(22400), dec!(22450)));

        let service = service(band, spot.clone());
        let resolved = service.resolve(&[]).await;

        // A newer spot row does not change the cached value until the
        // next resolution.
        spot.push(bar(
            NaiveDate::from_ymd_opt(2025, 3, 6).unwrap(),
            dec!(22500),
            dec!(22550),
        ));
        assert_eq!(service.current().await, resolved);
    }
}
