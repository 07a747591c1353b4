//! Pre-cycle emergency-stop balance check.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::api::TradingApi;

use super::failure::{format_amount, panic_message, Fatal};

/// Outcome of a check that did not hit a fatal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceCheck {
    /// Balance at or above the threshold; dispatch may proceed.
    Passed,
    /// Balances could not be fetched because of a network error; skip
    /// dispatch this cycle and try again on the next one.
    Unavailable,
}

/// Fetch balances and compare the watched currency against the threshold.
pub async fn check(
    api: &dyn TradingApi,
    currency: &str,
    threshold: Decimal,
) -> Result<BalanceCheck, Fatal> {
    let balances = match AssertUnwindSafe(api.get_balance_info()).catch_unwind().await {
        Ok(Ok(balances)) => balances,
        Ok(Err(e)) if e.is_network() => {
            warn!(
                error = %e.detail(),
                "Network error fetching balances for emergency stop check, will try again next cycle"
            );
            return Ok(BalanceCheck::Unavailable);
        }
        Ok(Err(e)) => return Err(Fatal::Adapter(e.to_string())),
        Err(panic) => return Err(Fatal::Unexpected(panic_message(panic))),
    };

    let Some(balance) = balances.available_for(currency) else {
        return Err(Fatal::MissingBalance {
            currency: currency.to_string(),
            balances: balances.available_summary(),
        });
    };

    if balance < threshold {
        return Err(Fatal::EmergencyStop {
            currency: currency.to_string(),
            balance,
            threshold,
        });
    }

    debug!(
        currency = %currency,
        balance = %format_amount(balance),
        threshold = %format_amount(threshold),
        "Emergency stop check passed"
    );
    Ok(BalanceCheck::Passed)
}
