//! Failure kinds surfaced by every exchange-facing Trading API call.

use thiserror::Error;

/// Result alias for Trading API operations.
pub type TradingApiResult<T> = Result<T, TradingApiError>;

/// The two failure kinds callers of the Trading API must distinguish.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TradingApiError {
    /// Transient connectivity problem (timeouts, refused connections, and
    /// anything matching the exchange's configured non-fatal codes or
    /// messages). Safe to retry on a later trade cycle.
    #[error("exchange network error: {0}")]
    Network(String),

    /// Any other failure reported by the exchange. Retrying will not help.
    #[error("exchange API error: {0}")]
    Api(String),
}

impl TradingApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::Api(message.into())
    }

    /// True for the transient kind.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// The message without the kind prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::Network(msg) | Self::Api(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let net = TradingApiError::network("timed out");
        let api = TradingApiError::api("invalid nonce");

        assert!(net.is_network());
        assert!(!api.is_network());
        assert_eq!(net.detail(), "timed out");
        assert_eq!(api.to_string(), "exchange API error: invalid nonce");
    }
}
