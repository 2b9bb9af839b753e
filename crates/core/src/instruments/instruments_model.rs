//! Instrument domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Contract kind for a tracked instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionKind {
    /// Call option (CE).
    Call,
    /// Put option (PE).
    Put,
    /// Underlying index, tracked for spot reference only.
    Index,
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Call => "CE",
            OptionKind::Put => "PE",
            OptionKind::Index => "INDEX",
        }
    }
}

impl From<&str> for OptionKind {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "CE" | "CALL" => OptionKind::Call,
            "PE" | "PUT" => OptionKind::Put,
            _ => OptionKind::Index,
        }
    }
}

impl From<OptionKind> for String {
    fn from(kind: OptionKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Domain model for a tracked instrument.
///
/// Created once when first observed in an instrument refresh and never
/// deleted except by explicit reset. The expired flag is recomputed
/// against the current business date, not the calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Stable numeric id assigned by the quote source.
    pub instrument_token: i64,
    pub tradingsymbol: String,
    /// Name of the underlying index (e.g. "NIFTY 50").
    pub underlying: String,
    pub strike: Decimal,
    pub option_kind: OptionKind,
    /// Contract expiry. `None` for index instruments.
    pub expiry: Option<NaiveDate>,
    pub first_seen_at: DateTime<Utc>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
}

impl Instrument {
    /// Whether this instrument belongs in the option collection universe.
    pub fn is_option(&self) -> bool {
        matches!(self.option_kind, OptionKind::Call | OptionKind::Put)
    }
}

/// Payload for registering a newly observed instrument.
#[derive(Debug, Clone)]
pub struct NewInstrument {
    pub instrument_token: i64,
    pub tradingsymbol: String,
    pub underlying: String,
    pub strike: Decimal,
    pub option_kind: OptionKind,
    pub expiry: Option<NaiveDate>,
}
