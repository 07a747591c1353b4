//! Resolves configured adapter and strategy ids to fresh instances.

use std::collections::HashMap;

use crate::api::ExchangeAdapter;
use crate::exchange::{PaperExchangeAdapter, PAPER_ADAPTER_ID};
use crate::strategy::{MarketWatchStrategy, TradingStrategy, MARKET_WATCH_ID};

pub type AdapterFactory = Box<dyn Fn() -> Box<dyn ExchangeAdapter> + Send + Sync>;
pub type StrategyFactory = Box<dyn Fn() -> Box<dyn TradingStrategy> + Send + Sync>;

/// Factories keyed by the ids used in `exchange.adapter` and
/// `strategy.className`.
#[derive(Default)]
pub struct ComponentRegistry {
    adapters: HashMap<String, AdapterFactory>,
    strategies: HashMap<String, StrategyFactory>,
}

impl ComponentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled paper exchange and market watch strategy.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_exchange_adapter(PAPER_ADAPTER_ID, || {
            Box::new(PaperExchangeAdapter::new())
        });
        registry.register_strategy(MARKET_WATCH_ID, || Box::new(MarketWatchStrategy::new()));
        registry
    }

    pub fn register_exchange_adapter<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ExchangeAdapter> + Send + Sync + 'static,
    {
        self.adapters.insert(id.into(), Box::new(factory));
    }

    pub fn register_strategy<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn TradingStrategy> + Send + Sync + 'static,
    {
        self.strategies.insert(id.into(), Box::new(factory));
    }

    /// New adapter instance, if the id is registered.
    pub fn create_exchange_adapter(&self, id: &str) -> Option<Box<dyn ExchangeAdapter>> {
        self.adapters.get(id).map(|factory| factory())
    }

    /// New strategy instance, if the id is registered.
    pub fn create_strategy(&self, id: &str) -> Option<Box<dyn TradingStrategy>> {
        self.strategies.get(id).map(|factory| factory())
    }

    /// Registered adapter ids, sorted.
    pub fn adapter_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Registered strategy ids, sorted.
    pub fn strategy_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = ComponentRegistry::with_defaults();

        assert_eq!(registry.adapter_ids(), vec![PAPER_ADAPTER_ID]);
        assert_eq!(registry.strategy_ids(), vec![MARKET_WATCH_ID]);
        assert!(registry.create_exchange_adapter(PAPER_ADAPTER_ID).is_some());
        assert!(registry.create_strategy(MARKET_WATCH_ID).is_some());
    }

    #[test]
    fn test_unknown_ids() {
        let registry = ComponentRegistry::new();
        assert!(registry.create_exchange_adapter("bitstamp").is_none());
        assert!(registry.create_strategy("scalper").is_none());
    }

    #[test]
    fn test_each_call_builds_a_new_instance() {
        let mut registry = ComponentRegistry::new();
        registry.register_strategy("watch-a", || Box::new(MarketWatchStrategy::new()));

        let first = registry.create_strategy("watch-a");
        let second = registry.create_strategy("watch-a");
        assert!(first.is_some() && second.is_some());
    }
}
