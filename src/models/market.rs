//! Market model representing a tradable currency pair on an exchange.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A currency pair on a specific exchange.
///
/// Built once during wiring from the market configuration and never mutated
/// afterwards; strategies receive their own copy in `init`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Market {
    /// Exchange-specific market identifier (e.g. "btcusd", "XBT/USD")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Currency being bought or sold (e.g. "BTC")
    pub base_currency: String,

    /// Currency used to price the base currency (e.g. "USD")
    pub counter_currency: String,
}

impl Market {
    /// Create a new market.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        base_currency: impl Into<String>,
        counter_currency: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_currency: base_currency.into(),
            counter_currency: counter_currency.into(),
        }
    }

    /// Pair label in `BASE/COUNTER` form.
    pub fn pair(&self) -> String {
        format!("{}/{}", self.base_currency, self.counter_currency)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.name, self.id, self.pair())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_display() {
        let market = Market::new("btcusd", "BTC/USD", "BTC", "USD");
        assert_eq!(market.pair(), "BTC/USD");
        assert_eq!(market.to_string(), "BTC/USD [btcusd] (BTC/USD)");
    }
}
