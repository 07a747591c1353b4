//! Strategy contract: `init` once per market, then `execute` once per trade cycle.

mod market_watch;

use async_trait::async_trait;
use thiserror::Error;

use crate::api::SharedTradingApi;
use crate::config::StrategyConfig;
use crate::models::Market;

pub use market_watch::{MarketWatchStrategy, MARKET_WATCH_ID};

/// Errors a strategy can hand back to the engine. Both are fatal.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// The strategy asks the engine to shut down now.
    #[error("{0}")]
    Failure(String),

    /// Anything the strategy did not classify itself.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl StrategyError {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}

/// A trading algorithm bound to a single market.
///
/// The engine calls `execute` from its loop only, one market at a time, so
/// implementations never see concurrent calls and may keep plain mutable
/// state between cycles.
///
/// There is no `From<TradingApiError>` for [`StrategyError`]:
/// each Trading API failure has to be either handled (typically the
/// `Network` kind, retried next cycle) or wrapped into
/// [`StrategyError::Failure`].
#[async_trait]
pub trait TradingStrategy: Send {
    /// Called once during wiring.
    async fn init(
        &mut self,
        trading_api: SharedTradingApi,
        market: Market,
        config: &StrategyConfig,
    ) -> Result<(), StrategyError>;

    /// Run one trade cycle for this strategy's market.
    async fn execute(&mut self) -> Result<(), StrategyError>;
}
