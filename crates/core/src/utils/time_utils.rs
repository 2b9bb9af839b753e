use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

/// Exchange timezone for all session arithmetic.
/// Market windows and business dates are defined in IST, never in the
/// host's local timezone.
pub const MARKET_TZ: Tz = chrono_tz::Asia::Kolkata;

/// Current instant in the exchange timezone.
pub fn market_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&MARKET_TZ)
}

/// Current wall-clock time-of-day in the exchange timezone.
pub fn market_time_now() -> NaiveTime {
    market_now().time()
}

/// Today's calendar date in the exchange timezone.
pub fn market_today() -> NaiveDate {
    market_now().date_naive()
}

/// Walks backward from the day before `from`, skipping Saturdays and
/// Sundays, until a weekday is reached.
///
/// Resolving on a Monday therefore yields the preceding Friday.
pub fn previous_trading_day(from: NaiveDate) -> NaiveDate {
    let mut day = from - Duration::days(1);
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day -= Duration::days(1);
    }
    day
}
