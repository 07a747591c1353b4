//! Wallet balances as reported by an exchange.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Balances keyed by currency code.
///
/// Sorted maps keep the rendering used in alerts and logs stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceInfo {
    /// Funds free to trade
    #[serde(default)]
    pub available: BTreeMap<String, Decimal>,

    /// Funds reserved by open orders
    #[serde(default)]
    pub on_hold: BTreeMap<String, Decimal>,
}

impl BalanceInfo {
    pub fn new(
        available: BTreeMap<String, Decimal>,
        on_hold: BTreeMap<String, Decimal>,
    ) -> Self {
        Self { available, on_hold }
    }

    /// Available balance for a currency, if the exchange reported one.
    pub fn available_for(&self, currency: &str) -> Option<Decimal> {
        self.available.get(currency).copied()
    }

    /// Render the available balances as `{BTC=1.5, USD=100}`.
    pub fn available_summary(&self) -> String {
        let entries: Vec<String> = self
            .available
            .iter()
            .map(|(currency, amount)| format!("{}={}", currency, amount))
            .collect();
        format!("{{{}}}", entries.join(", "))
    }
}
