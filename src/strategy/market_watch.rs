//! Market watch: logs the latest price (and optionally the top of the book)
//! every trade cycle without placing orders.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::api::{SharedTradingApi, TradingApiError};
use crate::config::StrategyConfig;
use crate::models::Market;

use super::{StrategyError, TradingStrategy};

/// Registry id.
pub const MARKET_WATCH_ID: &str = "market-watch";

const LOG_ORDER_BOOK_KEY: &str = "log-order-book";

#[derive(Default)]
pub struct MarketWatchStrategy {
    api: Option<SharedTradingApi>,
    market: Option<Market>,
    log_order_book: bool,
    last_price: Option<Decimal>,
}

impl MarketWatchStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Price seen on the most recent successful cycle.
    pub fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }

    fn bound(&self) -> Result<(&SharedTradingApi, &Market), StrategyError> {
        match (&self.api, &self.market) {
            (Some(api), Some(market)) => Ok((api, market)),
            _ => Err(StrategyError::failure("market watch executed before init")),
        }
    }
}

/// Network errors are skipped for this cycle; anything else stops the bot.
fn classify(market: &Market, err: TradingApiError) -> Result<(), StrategyError> {
    if err.is_network() {
        warn!(market = %market.id, error = %err.detail(), "Network error, will retry next cycle");
        return Ok(());
    }
    Err(StrategyError::failure(format!(
        "Exchange API error while watching market {}: {}",
        market.id,
        err.detail()
    )))
}

#[async_trait]
impl TradingStrategy for MarketWatchStrategy {
    async fn init(
        &mut self,
        trading_api: SharedTradingApi,
        market: Market,
        config: &StrategyConfig,
    ) -> Result<(), StrategyError> {
        self.log_order_book = match config.config_items.get(LOG_ORDER_BOOK_KEY) {
            None => false,
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| {
                StrategyError::failure(format!(
                    "Invalid '{}' value '{}' for strategy {}",
                    LOG_ORDER_BOOK_KEY, raw, config.id
                ))
            })?,
        };

        info!(
            market = %market.id,
            exchange = trading_api.impl_name(),
            log_order_book = self.log_order_book,
            "Market watch initialised"
        );

        self.api = Some(trading_api);
        self.market = Some(market);
        Ok(())
    }

    async fn execute(&mut self) -> Result<(), StrategyError> {
        let (api, market) = self.bound()?;
        let api = api.clone();
        let market = market.clone();

        let price = match api.get_latest_market_price(&market.id).await {
            Ok(price) => price,
            Err(e) => return classify(&market, e),
        };

        info!(market = %market.id, price = %price, "Latest market price");

        if self.log_order_book {
            match api.get_market_orders(&market.id).await {
                Ok(book) => info!(
                    market = %market.id,
                    best_bid = ?book.best_bid(),
                    best_ask = ?book.best_ask(),
                    "Order book top"
                ),
                Err(e) => classify(&market, e)?,
            }
        }

        self.last_price = Some(price);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ExchangeAdapter, TradingApi, TradingApiResult};
    use crate::config::ExchangeConfig;
    use crate::exchange::PaperExchangeAdapter;
    use crate::models::{BalanceInfo, MarketOrderBook, OpenOrder, OrderType};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn strategy_config(items: &[(&str, &str)]) -> StrategyConfig {
        StrategyConfig {
            id: "watch".to_string(),
            name: "Watch".to_string(),
            description: String::new(),
            class_name: MARKET_WATCH_ID.to_string(),
            config_items: items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    async fn paper_api() -> SharedTradingApi {
        let mut other = BTreeMap::new();
        other.insert("price.btcusd".to_string(), "1000".to_string());
        let config = ExchangeConfig {
            name: "Paper".to_string(),
            adapter: "paper".to_string(),
            authentication_config: BTreeMap::new(),
            network_config: None,
            other_config: other,
        };
        let mut adapter = Box::new(PaperExchangeAdapter::new());
        adapter.init(&config).await.unwrap();
        adapter.into_shared()
    }

    /// Fails every call with the given error.
    struct FailingApi(TradingApiError);

    #[async_trait]
    impl TradingApi for FailingApi {
        fn impl_name(&self) -> &str {
            "failing"
        }
        async fn get_market_orders(&self, _: &str) -> TradingApiResult<MarketOrderBook> {
            Err(self.0.clone())
        }
        async fn get_your_open_orders(&self, _: &str) -> TradingApiResult<Vec<OpenOrder>> {
            Err(self.0.clone())
        }
        async fn create_order(
            &self,
            _: &str,
            _: OrderType,
            _: Decimal,
            _: Decimal,
        ) -> TradingApiResult<String> {
            Err(self.0.clone())
        }
        async fn cancel_order(&self, _: &str, _: &str) -> TradingApiResult<bool> {
            Err(self.0.clone())
        }
        async fn get_latest_market_price(&self, _: &str) -> TradingApiResult<Decimal> {
            Err(self.0.clone())
        }
        async fn get_balance_info(&self) -> TradingApiResult<BalanceInfo> {
            Err(self.0.clone())
        }
        async fn get_percentage_of_buy_order_taken_for_exchange_fee(
            &self,
            _: &str,
        ) -> TradingApiResult<Decimal> {
            Err(self.0.clone())
        }
        async fn get_percentage_of_sell_order_taken_for_exchange_fee(
            &self,
            _: &str,
        ) -> TradingApiResult<Decimal> {
            Err(self.0.clone())
        }
    }

    fn market() -> Market {
        Market::new("btcusd", "BTC/USD", "BTC", "USD")
    }

    #[tokio::test]
    async fn test_records_latest_price() {
        let mut strategy = MarketWatchStrategy::new();
        strategy
            .init(paper_api().await, market(), &strategy_config(&[("log-order-book", "true")]))
            .await
            .unwrap();

        strategy.execute().await.unwrap();
        assert_eq!(strategy.last_price(), Some(dec!(1000)));
    }

    #[tokio::test]
    async fn test_network_error_is_skipped() {
        let api: SharedTradingApi = Arc::new(FailingApi(TradingApiError::network("timeout")));
        let mut strategy = MarketWatchStrategy::new();
        strategy.init(api, market(), &strategy_config(&[])).await.unwrap();

        assert!(strategy.execute().await.is_ok());
        assert_eq!(strategy.last_price(), None);
    }

    #[tokio::test]
    async fn test_api_error_becomes_failure() {
        let api: SharedTradingApi = Arc::new(FailingApi(TradingApiError::api("bad key")));
        let mut strategy = MarketWatchStrategy::new();
        strategy.init(api, market(), &strategy_config(&[])).await.unwrap();

        let err = strategy.execute().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Exchange API error while watching market btcusd: bad key"
        );
    }

    #[tokio::test]
    async fn test_execute_before_init_fails() {
        let mut strategy = MarketWatchStrategy::new();
        assert!(matches!(strategy.execute().await, Err(StrategyError::Failure(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_item() {
        let mut strategy = MarketWatchStrategy::new();
        let result = strategy
            .init(paper_api().await, market(), &strategy_config(&[("log-order-book", "maybe")]))
            .await;
        assert!(result.is_err());
    }
}
