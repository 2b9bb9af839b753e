//! Cross-module constants for the collection service.

/// Trading symbol of the primary index whose spot price anchors
/// business-date resolution.
pub const DEFAULT_SPOT_SYMBOL: &str = "NIFTY 50";

/// Instrument token of the primary index on the quote source.
pub const DEFAULT_SPOT_TOKEN: i64 = 256_265;

/// Trailing window, in hours, over which a freshly resolved business date
/// is retroactively stamped onto band rows.
pub const BUSINESS_DATE_STAMP_WINDOW_HOURS: i64 = 24;

/// Lookback, in hours, when scanning recent band rows for real
/// last-trade times during business-date resolution.
pub const STRIKE_LTT_LOOKBACK_HOURS: i64 = 24;
