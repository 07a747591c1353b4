//! Fatal conditions that end a run, and the alert text each one produces.

use std::any::Any;
use std::fmt;

use rust_decimal::Decimal;

/// Render an amount with at most 8 decimal places and no trailing zeros.
pub fn format_amount(amount: Decimal) -> String {
    amount.round_dp(8).normalize().to_string()
}

/// A condition that triggers an alert followed by shutdown.
#[derive(Debug, Clone, PartialEq)]
pub enum Fatal {
    /// Available balance fell below the configured threshold.
    EmergencyStop {
        currency: String,
        balance: Decimal,
        threshold: Decimal,
    },

    /// The watched currency was absent from the balances returned.
    MissingBalance { currency: String, balances: String },

    /// A strategy asked the engine to stop.
    Strategy(String),

    /// A call the engine made itself failed with the permanent kind.
    Adapter(String),

    /// Anything unclassified, panics included.
    Unexpected(String),
}

impl Fatal {
    /// Alert body. The leading text identifies the path taken.
    pub fn alert_body(&self) -> String {
        match self {
            Fatal::EmergencyStop {
                currency,
                balance,
                threshold,
            } => format!(
                "EMERGENCY STOP triggered! - Current Emergency Stop Currency [{}] wallet balance [{}] \
                 on exchange is lower than configured Emergency Stop balance [{}]",
                currency,
                format_amount(*balance),
                format_amount(*threshold)
            ),
            Fatal::MissingBalance { currency, balances } => format!(
                "Emergency stop check: Failed to get current Emergency Stop Currency balance as '{}' \
                 key into Balances map returned null. Balances returned: {}",
                currency, balances
            ),
            Fatal::Strategy(details) => format!(
                "A FATAL error has occurred in Trading Strategy! Details: {}",
                details
            ),
            Fatal::Adapter(details) => format!(
                "A FATAL error has occurred in Exchange Adapter! Details: {}",
                details
            ),
            Fatal::Unexpected(details) => format!(
                "An unexpected FATAL error has occurred in Exchange Adapter or Trading Strategy! Details: {}",
                details
            ),
        }
    }
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.alert_body())
    }
}

/// Best-effort message from a caught panic payload.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panic: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panic: {}", msg)
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(1.50000000)), "1.5");
        assert_eq!(format_amount(dec!(100)), "100");
        assert_eq!(format_amount(dec!(0.00)), "0");
        assert_eq!(format_amount(dec!(0.123456789)), "0.12345679");
        assert_eq!(format_amount(dec!(0.00000001)), "0.00000001");
    }

    #[test]
    fn test_emergency_stop_body() {
        let fatal = Fatal::EmergencyStop {
            currency: "BTC".to_string(),
            balance: dec!(0.4999),
            threshold: dec!(0.50000000),
        };
        assert_eq!(
            fatal.alert_body(),
            "EMERGENCY STOP triggered! - Current Emergency Stop Currency [BTC] wallet balance [0.4999] \
             on exchange is lower than configured Emergency Stop balance [0.5]"
        );
    }

    #[test]
    fn test_missing_balance_body() {
        let fatal = Fatal::MissingBalance {
            currency: "BTC".to_string(),
            balances: "{}".to_string(),
        };
        assert!(fatal.alert_body().starts_with(
            "Emergency stop check: Failed to get current Emergency Stop Currency balance as 'BTC' key"
        ));
        assert!(fatal.alert_body().ends_with("Balances returned: {}"));
    }

    #[test]
    fn test_failure_bodies() {
        assert_eq!(
            Fatal::Strategy("boom".into()).alert_body(),
            "A FATAL error has occurred in Trading Strategy! Details: boom"
        );
        assert_eq!(
            Fatal::Adapter("bad key".into()).alert_body(),
            "A FATAL error has occurred in Exchange Adapter! Details: bad key"
        );
        assert!(Fatal::Unexpected("oops".into()).alert_body().starts_with(
            "An unexpected FATAL error has occurred in Exchange Adapter or Trading Strategy!"
        ));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("index out of bounds");
        assert_eq!(panic_message(payload), "panic: index out of bounds");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload), "panic: owned");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload), "panic with non-string payload");
    }
}
