//! Turns loaded configuration into a ready adapter and per-market strategies.

use tracing::info;

use crate::api::SharedTradingApi;
use crate::config::{ConfigRepository, EngineConfig};
use crate::models::Market;
use crate::registry::ComponentRegistry;
use crate::strategy::TradingStrategy;

use super::EngineError;

/// An enabled market and the strategy instance bound to it.
pub struct WiredMarket {
    pub market: Market,
    pub strategy_id: String,
    pub strategy: Box<dyn TradingStrategy>,
}

/// Everything one run of the trade-cycle loop owns.
pub struct WiredRun {
    pub engine: EngineConfig,
    pub api: SharedTradingApi,
    /// Enabled markets in configuration order
    pub markets: Vec<WiredMarket>,
}

pub async fn wire(
    repository: &dyn ConfigRepository,
    registry: &ComponentRegistry,
) -> Result<WiredRun, EngineError> {
    let config = repository.load()?;

    let adapter_id = config.exchange.adapter.as_str();
    let mut adapter = registry
        .create_exchange_adapter(adapter_id)
        .ok_or_else(|| EngineError::UnknownComponent {
            kind: "exchange adapter",
            id: adapter_id.to_string(),
        })?;
    adapter.init(&config.exchange).await.map_err(|e| {
        EngineError::Wiring(format!(
            "exchange adapter '{}' failed to initialise: {}",
            adapter_id, e
        ))
    })?;
    info!(
        exchange = %config.exchange.name,
        adapter = adapter.impl_name(),
        "Exchange adapter initialised"
    );
    let api = adapter.into_shared();

    let mut markets = Vec::new();
    for market_config in config.enabled_markets() {
        let strategy_config = config
            .strategy(&market_config.trading_strategy_id)
            .ok_or_else(|| {
                EngineError::Wiring(format!(
                    "market '{}' references unknown tradingStrategyId '{}'",
                    market_config.id, market_config.trading_strategy_id
                ))
            })?;

        let mut strategy = registry
            .create_strategy(&strategy_config.class_name)
            .ok_or_else(|| EngineError::UnknownComponent {
                kind: "trading strategy",
                id: strategy_config.class_name.clone(),
            })?;

        let market = Market::new(
            market_config.id.clone(),
            market_config.name.clone(),
            market_config.base_currency.clone(),
            market_config.counter_currency.clone(),
        );
        strategy
            .init(api.clone(), market.clone(), strategy_config)
            .await
            .map_err(|e| {
                EngineError::Wiring(format!(
                    "strategy '{}' failed to initialise for market '{}': {}",
                    strategy_config.id, market.id, e
                ))
            })?;

        info!(market = %market, strategy = %strategy_config.id, "Market wired");
        markets.push(WiredMarket {
            market,
            strategy_id: strategy_config.id.clone(),
            strategy,
        });
    }

    Ok(WiredRun {
        engine: config.engine,
        api,
        markets,
    })
}
