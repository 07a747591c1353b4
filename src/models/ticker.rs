//! Ticker snapshot for a market.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest market statistics. Exchanges differ in what they publish, so
/// everything except the last price is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub last: Decimal,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub low: Option<Decimal>,
    #[serde(default)]
    pub high: Option<Decimal>,
    #[serde(default)]
    pub open: Option<Decimal>,
    #[serde(default)]
    pub volume: Option<Decimal>,
    #[serde(default)]
    pub vwap: Option<Decimal>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Ticker {
    /// Ticker carrying only the last traded price.
    pub fn from_last(last: Decimal) -> Self {
        Self {
            last,
            bid: None,
            ask: None,
            low: None,
            high: None,
            open: None,
            volume: None,
            vwap: None,
            timestamp: Some(Utc::now()),
        }
    }
}
