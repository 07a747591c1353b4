//! The Trading API contract implemented by exchange adapters and consumed
//! by strategies and the engine.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::config::ExchangeConfig;
use crate::models::{BalanceInfo, MarketOrderBook, OpenOrder, OrderType, Ticker};

use super::{TradingApiError, TradingApiResult};

/// Uniform trading operations against one exchange.
///
/// Every call that talks to the exchange fails with exactly one of the two
/// [`TradingApiError`] kinds. A single instance is shared by the engine and
/// all strategies of a run, and is only ever used sequentially from the
/// engine's loop.
#[async_trait]
pub trait TradingApi: Send + Sync {
    /// Short name of the implementation, used in logs.
    fn impl_name(&self) -> &str;

    /// Current order book for a market.
    async fn get_market_orders(&self, market_id: &str) -> TradingApiResult<MarketOrderBook>;

    /// Our own open orders for a market.
    async fn get_your_open_orders(&self, market_id: &str) -> TradingApiResult<Vec<OpenOrder>>;

    /// Place a limit order. Returns the exchange-assigned order id.
    async fn create_order(
        &self,
        market_id: &str,
        order_type: OrderType,
        quantity: Decimal,
        price: Decimal,
    ) -> TradingApiResult<String>;

    /// Cancel an order. Returns whether the exchange accepted the cancel.
    async fn cancel_order(&self, order_id: &str, market_id: &str) -> TradingApiResult<bool>;

    /// Last traded price for a market.
    async fn get_latest_market_price(&self, market_id: &str) -> TradingApiResult<Decimal>;

    /// Wallet balances.
    async fn get_balance_info(&self) -> TradingApiResult<BalanceInfo>;

    /// Fee taken on buy orders, as a fraction (0.0025 is 0.25%).
    async fn get_percentage_of_buy_order_taken_for_exchange_fee(
        &self,
        market_id: &str,
    ) -> TradingApiResult<Decimal>;

    /// Fee taken on sell orders, as a fraction.
    async fn get_percentage_of_sell_order_taken_for_exchange_fee(
        &self,
        market_id: &str,
    ) -> TradingApiResult<Decimal>;

    /// Ticker for a market. Not every exchange exposes one.
    async fn get_ticker(&self, market_id: &str) -> TradingApiResult<Ticker> {
        Err(TradingApiError::api(format!(
            "get_ticker is not supported by {} (market {})",
            self.impl_name(),
            market_id
        )))
    }
}

/// Shared handle to the run's single adapter.
pub type SharedTradingApi = Arc<dyn TradingApi>;

/// An exchange adapter: the Trading API plus one-time initialisation from
/// the exchange configuration, performed during wiring before the adapter
/// is shared.
#[async_trait]
pub trait ExchangeAdapter: TradingApi {
    async fn init(&mut self, config: &ExchangeConfig) -> TradingApiResult<()>;

    /// Hand the initialised adapter over as the shared Trading API handle.
    fn into_shared(self: Box<Self>) -> SharedTradingApi;
}
