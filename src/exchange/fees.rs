//! Fee overrides read from the exchange's `otherConfig`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::api::{TradingApiError, TradingApiResult};

pub const BUY_FEE_KEY: &str = "buy-fee";
pub const SELL_FEE_KEY: &str = "sell-fee";

/// Buy/sell fee fractions configured for an exchange (0.0025 is 0.25%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeOverrides {
    pub buy: Option<Decimal>,
    pub sell: Option<Decimal>,
}

impl FeeOverrides {
    pub fn from_other_config(other: &BTreeMap<String, String>) -> TradingApiResult<Self> {
        Ok(Self {
            buy: parse_fee(other, BUY_FEE_KEY)?,
            sell: parse_fee(other, SELL_FEE_KEY)?,
        })
    }
}

fn parse_fee(other: &BTreeMap<String, String>, key: &str) -> TradingApiResult<Option<Decimal>> {
    let Some(raw) = other.get(key) else {
        return Ok(None);
    };
    let fee: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| TradingApiError::api(format!("Invalid {} '{}' in otherConfig", key, raw)))?;
    if fee < Decimal::ZERO || fee >= Decimal::ONE {
        return Err(TradingApiError::api(format!(
            "{} must be a fraction in [0, 1), got {}",
            key, fee
        )));
    }
    Ok(Some(fee))
}
