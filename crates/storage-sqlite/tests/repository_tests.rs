//! Repository integration tests against a real on-disk SQLite database.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::TempDir;

use bandwatch_core::band_history::{BandHistoryRepositoryTrait, BandRecord};
use bandwatch_core::business_date::{SpotBar, SpotHistoryRepositoryTrait};
use bandwatch_core::instruments::{
    InstrumentRepositoryTrait, NewInstrument, OptionKind,
};
use bandwatch_core::market_data::Ohlc;
use bandwatch_storage_sqlite::band_history::BandHistoryRepository;
use bandwatch_storage_sqlite::instruments::InstrumentRepository;
use bandwatch_storage_sqlite::spot_history::SpotHistoryRepository;
use bandwatch_storage_sqlite::{create_pool, init, run_migrations, spawn_writer, DbPool, WriteHandle};

struct TestDb {
    // Held for the lifetime of the test so the directory isn't removed.
    _dir: TempDir,
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

fn setup() -> TestDb {
    let dir = TempDir::new().unwrap();
    let db_path = init(dir.path().to_str().unwrap()).unwrap();
    let pool = create_pool(&db_path).unwrap();
    run_migrations(&pool).unwrap();
    let writer = spawn_writer((*pool).clone());
    TestDb {
        _dir: dir,
        pool,
        writer,
    }
}

fn expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 27).unwrap()
}

fn new_instrument(token: i64, kind: OptionKind) -> NewInstrument {
    NewInstrument {
        instrument_token: token,
        tradingsymbol: format!("NIFTY25MAR22500{}", kind.as_str()),
        underlying: "NIFTY 50".to_string(),
        strike: dec!(22500),
        option_kind: kind,
        expiry: match kind {
            OptionKind::Index => None,
            _ => Some(expiry()),
        },
    }
}

fn band_record(token: i64, global_seq: i64, insertion_seq: i32, business_date: Option<NaiveDate>) -> BandRecord {
    BandRecord {
        id: format!("{}_{}_{}", token, expiry().format("%Y%m%d"), global_seq),
        instrument_token: token,
        tradingsymbol: "NIFTY25MAR22500CE".to_string(),
        strike: dec!(22500),
        option_kind: OptionKind::Call,
        expiry: expiry(),
        ohlc: Ohlc {
            open: dec!(100),
            high: dec!(110),
            low: dec!(90),
            close: dec!(105),
        },
        last_price: dec!(104),
        lower_circuit_limit: dec!(80) + rust_decimal::Decimal::from(global_seq),
        upper_circuit_limit: dec!(120),
        last_trade_time: Some(
            NaiveDate::from_ymd_opt(2025, 3, 6)
                .unwrap()
                .and_hms_opt(15, 29, 0)
                .unwrap(),
        ),
        recorded_at: Utc::now(),
        business_date,
        insertion_seq,
        global_seq,
    }
}

// --- Instrument repository ---

#[tokio::test]
async fn test_instrument_upsert_is_first_write_wins() {
    let db = setup();
    let repo = InstrumentRepository::new(db.pool.clone(), db.writer.clone());

    let first = repo.upsert(new_instrument(111, OptionKind::Call)).await.unwrap();

    let mut renamed = new_instrument(111, OptionKind::Call);
    renamed.tradingsymbol = "RENAMED".to_string();
    let second = repo.upsert(renamed).await.unwrap();

    // The stored row is untouched by the second observation.
    assert_eq!(second.tradingsymbol, first.tradingsymbol);
    assert_eq!(repo.list().unwrap().len(), 1);
}

#[tokio::test]
async fn test_active_options_excludes_index_and_expired() {
    let db = setup();
    let repo = InstrumentRepository::new(db.pool.clone(), db.writer.clone());

    repo.upsert(new_instrument(111, OptionKind::Call)).await.unwrap();
    repo.upsert(new_instrument(222, OptionKind::Put)).await.unwrap();
    repo.upsert(new_instrument(333, OptionKind::Index)).await.unwrap();

    let active = repo.list_active_options().unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|i| i.is_option()));

    // A business date past the contract expiry flags both options.
    let changed = repo
        .refresh_expired_flags(expiry() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(changed, 2);
    assert!(repo.list_active_options().unwrap().is_empty());

    // Moving the business date back revives them.
    let changed = repo.refresh_expired_flags(expiry()).await.unwrap();
    assert_eq!(changed, 2);
    assert_eq!(repo.list_active_options().unwrap().len(), 2);
}

#[tokio::test]
async fn test_mark_fetched_stamps_timestamp() {
    let db = setup();
    let repo = InstrumentRepository::new(db.pool.clone(), db.writer.clone());

    repo.upsert(new_instrument(111, OptionKind::Call)).await.unwrap();
    assert!(repo.get_by_token(111).unwrap().unwrap().last_fetched_at.is_none());

    let now = Utc::now();
    let touched = repo.mark_fetched(&[111], now).await.unwrap();
    assert_eq!(touched, 1);

    let fetched_at = repo
        .get_by_token(111)
        .unwrap()
        .unwrap()
        .last_fetched_at
        .unwrap();
    assert!((fetched_at - now).num_seconds().abs() < 2);
}

#[tokio::test]
async fn test_delete_all_resets_the_universe() {
    let db = setup();
    let repo = InstrumentRepository::new(db.pool.clone(), db.writer.clone());

    repo.upsert(new_instrument(111, OptionKind::Call)).await.unwrap();
    repo.upsert(new_instrument(222, OptionKind::Put)).await.unwrap();

    assert_eq!(repo.delete_all().await.unwrap(), 2);
    assert!(repo.list().unwrap().is_empty());
}

// --- Band history repository ---

#[tokio::test]
async fn test_latest_for_key_follows_global_seq() {
    let db = setup();
    let repo = BandHistoryRepository::new(db.pool.clone(), db.writer.clone());

    let day = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
    repo.append_batch(vec![
        band_record(111, 1, 1, Some(day)),
        band_record(111, 2, 2, Some(day)),
    ])
    .await
    .unwrap();

    let latest = repo.latest_for_key(111, expiry()).unwrap().unwrap();
    assert_eq!(latest.global_seq, 2);

    assert!(repo.latest_for_key(999, expiry()).unwrap().is_none());
}

#[tokio::test]
async fn test_sequence_aggregates() {
    let db = setup();
    let repo = BandHistoryRepository::new(db.pool.clone(), db.writer.clone());

    let day_one = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
    let day_two = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
    repo.append_batch(vec![
        band_record(111, 1, 1, Some(day_one)),
        band_record(111, 2, 2, Some(day_one)),
        band_record(111, 3, 1, Some(day_two)),
    ])
    .await
    .unwrap();

    assert_eq!(repo.max_global_seq(111, expiry()).unwrap(), 3);
    assert_eq!(repo.max_insertion_seq(111, expiry(), day_one).unwrap(), 2);
    assert_eq!(repo.max_insertion_seq(111, expiry(), day_two).unwrap(), 1);

    // Unseen key and unseen date both report zero.
    assert_eq!(repo.max_global_seq(999, expiry()).unwrap(), 0);
    assert_eq!(
        repo.max_insertion_seq(111, expiry(), day_two + Duration::days(1))
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_stamp_business_date_fills_unstamped_rows_only() {
    let db = setup();
    let repo = BandHistoryRepository::new(db.pool.clone(), db.writer.clone());

    let day_one = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
    let day_two = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();

    repo.append_batch(vec![
        band_record(111, 1, 1, Some(day_one)),
        band_record(111, 2, 1, None),
    ])
    .await
    .unwrap();

    let cutoff = Utc::now() - Duration::hours(24);
    let touched = repo.stamp_business_date(day_two, cutoff).await.unwrap();
    assert_eq!(touched, 1);

    let rows = repo.list_for_key(111, expiry()).unwrap();
    assert_eq!(rows[0].business_date, Some(day_one));
    assert_eq!(rows[1].business_date, Some(day_two));

    // Idempotent: nothing left to stamp.
    assert_eq!(repo.stamp_business_date(day_two, cutoff).await.unwrap(), 0);
}

#[tokio::test]
async fn test_reads_by_business_date_and_recency() {
    let db = setup();
    let repo = BandHistoryRepository::new(db.pool.clone(), db.writer.clone());

    let day = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
    let mut no_ltt = band_record(111, 1, 1, Some(day));
    no_ltt.last_trade_time = None;
    repo.append_batch(vec![no_ltt, band_record(111, 2, 2, Some(day))])
        .await
        .unwrap();

    assert_eq!(repo.list_for_business_date(day).unwrap().len(), 2);

    let cutoff = Utc::now() - Duration::hours(1);
    let with_ltt = repo.recent_with_last_trade_time(cutoff).unwrap();
    assert_eq!(with_ltt.len(), 1);
    assert_eq!(with_ltt[0].global_seq, 2);
}

#[tokio::test]
async fn test_round_trip_preserves_decimals_and_times() {
    let db = setup();
    let repo = BandHistoryRepository::new(db.pool.clone(), db.writer.clone());

    let day = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
    let record = band_record(111, 1, 1, Some(day));
    repo.append_batch(vec![record.clone()]).await.unwrap();

    let stored = repo.latest_for_key(111, expiry()).unwrap().unwrap();
    assert_eq!(stored.lower_circuit_limit, record.lower_circuit_limit);
    assert_eq!(stored.upper_circuit_limit, record.upper_circuit_limit);
    assert_eq!(stored.strike, record.strike);
    assert_eq!(stored.last_trade_time, record.last_trade_time);
    assert_eq!(stored.expiry, record.expiry);
}

// --- Spot history repository ---

#[tokio::test]
async fn test_spot_upsert_replaces_same_day_bar() {
    let db = setup();
    let repo = SpotHistoryRepository::new(db.pool.clone(), db.writer.clone());

    let day = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
    let mut bar = SpotBar {
        symbol: "NIFTY 50".to_string(),
        trade_date: day,
        open: dec!(22500),
        high: dec!(22550),
        low: dec!(22480),
        close: dec!(22520),
        last_updated: Utc::now(),
    };
    repo.upsert_daily_bar(bar.clone()).await.unwrap();

    bar.close = dec!(22540);
    repo.upsert_daily_bar(bar).await.unwrap();

    let latest = repo.latest_for_symbol("NIFTY 50").unwrap().unwrap();
    assert_eq!(latest.close, dec!(22540));
    assert_eq!(latest.trade_date, day);
}

#[tokio::test]
async fn test_latest_spot_bar_orders_by_trade_date() {
    let db = setup();
    let repo = SpotHistoryRepository::new(db.pool.clone(), db.writer.clone());

    let older = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
    let newer = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();

    for (day, close) in [(newer, dec!(22540)), (older, dec!(22400))] {
        repo.upsert_daily_bar(SpotBar {
            symbol: "NIFTY 50".to_string(),
            trade_date: day,
            open: dec!(22500),
            high: dec!(22560),
            low: dec!(22380),
            close,
            last_updated: Utc::now(),
        })
        .await
        .unwrap();
    }

    let latest = repo.latest_for_symbol("NIFTY 50").unwrap().unwrap();
    assert_eq!(latest.trade_date, newer);

    assert!(repo.latest_for_symbol("BANKNIFTY").unwrap().is_none());
}
