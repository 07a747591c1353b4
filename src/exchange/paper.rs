//! Paper exchange: an in-memory simulated exchange for dry runs.
//!
//! Seeded from the exchange `otherConfig`:
//! - `balance.<CCY>` available balance per currency
//! - `price.<marketId>` last price per market
//! - `buy-fee` / `sell-fee` fee fractions
//! - `price-feed-url` optional live price source
//!
//! With a price feed, prices come from `GET {price-feed-url}/ticker/{marketId}`
//! (`{"last": "..."}`) through an [`ExchangeHttpClient`] built from the
//! exchange's network settings; otherwise the seeded prices are used.
//!
//! Orders rest on the book until cancelled; nothing ever fills.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::{
    ExchangeAdapter, SharedTradingApi, TradingApi, TradingApiError, TradingApiResult,
};
use crate::config::ExchangeConfig;
use crate::models::{
    BalanceInfo, MarketOrder, MarketOrderBook, OpenOrder, OrderType, Ticker,
};

use super::{ExchangeHttpClient, FeeOverrides};

/// Registry id.
pub const PAPER_ADAPTER_ID: &str = "paper";

const BALANCE_PREFIX: &str = "balance.";
const PRICE_PREFIX: &str = "price.";
const PRICE_FEED_KEY: &str = "price-feed-url";

/// Fee applied when no override is configured.
const DEFAULT_FEE: Decimal = dec!(0.002);

/// Price step between synthesised order book levels (0.1%).
const BOOK_STEP: Decimal = dec!(0.001);
const BOOK_DEPTH: u32 = 5;

#[derive(Debug, Default)]
struct PaperState {
    available: BTreeMap<String, Decimal>,
    prices: HashMap<String, Decimal>,
    open_orders: Vec<OpenOrder>,
}

/// Simulated exchange adapter.
#[derive(Default)]
pub struct PaperExchangeAdapter {
    state: RwLock<PaperState>,
    fees: FeeOverrides,
    price_feed: Option<ExchangeHttpClient>,
}

#[derive(Debug, Deserialize)]
struct FeedTicker {
    last: Decimal,
}

impl PaperExchangeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the simulated last price of a market.
    pub async fn set_price(&self, market_id: &str, price: Decimal) {
        self.state.write().await.prices.insert(market_id.to_string(), price);
    }

    async fn price(&self, market_id: &str) -> TradingApiResult<Decimal> {
        if let Some(feed) = &self.price_feed {
            let ticker: FeedTicker = feed.get_json(&format!("/ticker/{}", market_id)).await?;
            self.set_price(market_id, ticker.last).await;
            return Ok(ticker.last);
        }

        self.state
            .read()
            .await
            .prices
            .get(market_id)
            .copied()
            .ok_or_else(|| TradingApiError::api(format!("Unknown market '{}'", market_id)))
    }
}

fn parse_entries(
    other: &BTreeMap<String, String>,
    prefix: &str,
) -> TradingApiResult<Vec<(String, Decimal)>> {
    other
        .iter()
        .filter_map(|(key, raw)| key.strip_prefix(prefix).map(|name| (name, raw)))
        .map(|(name, raw)| {
            raw.trim()
                .parse::<Decimal>()
                .map(|value| (name.to_string(), value))
                .map_err(|_| {
                    TradingApiError::api(format!("Invalid value '{}' for {}{}", raw, prefix, name))
                })
        })
        .collect()
}

#[async_trait]
impl TradingApi for PaperExchangeAdapter {
    fn impl_name(&self) -> &str {
        "Paper Exchange (simulated)"
    }

    async fn get_market_orders(&self, market_id: &str) -> TradingApiResult<MarketOrderBook> {
        let price = self.price(market_id).await?;

        let level = |i: u32| Decimal::from(i) * BOOK_STEP * price;
        let sell_orders = (1..=BOOK_DEPTH)
            .map(|i| MarketOrder::new(OrderType::Sell, price + level(i), Decimal::ONE))
            .collect();
        let buy_orders = (1..=BOOK_DEPTH)
            .map(|i| MarketOrder::new(OrderType::Buy, price - level(i), Decimal::ONE))
            .collect();

        Ok(MarketOrderBook {
            market_id: market_id.to_string(),
            sell_orders,
            buy_orders,
        })
    }

    async fn get_your_open_orders(&self, market_id: &str) -> TradingApiResult<Vec<OpenOrder>> {
        Ok(self
            .state
            .read()
            .await
            .open_orders
            .iter()
            .filter(|o| o.market_id == market_id)
            .cloned()
            .collect())
    }

    async fn create_order(
        &self,
        market_id: &str,
        order_type: OrderType,
        quantity: Decimal,
        price: Decimal,
    ) -> TradingApiResult<String> {
        if quantity <= Decimal::ZERO || price <= Decimal::ZERO {
            return Err(TradingApiError::api(format!(
                "Order quantity and price must be positive, got {} @ {}",
                quantity, price
            )));
        }
        self.price(market_id).await?;

        let id = uuid::Uuid::new_v4().to_string();
        let order = OpenOrder {
            id: id.clone(),
            created_at: Utc::now(),
            market_id: market_id.to_string(),
            order_type,
            price,
            quantity,
            original_quantity: quantity,
            total: price * quantity,
        };

        info!(
            order_id = %id,
            market = %market_id,
            side = %order_type,
            quantity = %quantity,
            price = %price,
            "[PAPER] Order placed"
        );
        self.state.write().await.open_orders.push(order);
        Ok(id)
    }

    async fn cancel_order(&self, order_id: &str, market_id: &str) -> TradingApiResult<bool> {
        let mut state = self.state.write().await;
        let before = state.open_orders.len();
        state
            .open_orders
            .retain(|o| !(o.id == order_id && o.market_id == market_id));
        let cancelled = state.open_orders.len() < before;

        debug!(order_id = %order_id, market = %market_id, cancelled, "[PAPER] Cancel");
        Ok(cancelled)
    }

    async fn get_latest_market_price(&self, market_id: &str) -> TradingApiResult<Decimal> {
        self.price(market_id).await
    }

    async fn get_balance_info(&self) -> TradingApiResult<BalanceInfo> {
        let state = self.state.read().await;

        // Funds tied up in resting orders are reported on hold, keyed by
        // market id since the paper exchange does not know currency pairs.
        let mut on_hold = BTreeMap::new();
        for order in &state.open_orders {
            *on_hold.entry(order.market_id.clone()).or_insert(Decimal::ZERO) += order.total;
        }

        Ok(BalanceInfo::new(state.available.clone(), on_hold))
    }

    async fn get_percentage_of_buy_order_taken_for_exchange_fee(
        &self,
        _market_id: &str,
    ) -> TradingApiResult<Decimal> {
        Ok(self.fees.buy.unwrap_or(DEFAULT_FEE))
    }

    async fn get_percentage_of_sell_order_taken_for_exchange_fee(
        &self,
        _market_id: &str,
    ) -> TradingApiResult<Decimal> {
        Ok(self.fees.sell.unwrap_or(DEFAULT_FEE))
    }

    async fn get_ticker(&self, market_id: &str) -> TradingApiResult<Ticker> {
        let book = self.get_market_orders(market_id).await?;
        let mut ticker = Ticker::from_last(self.price(market_id).await?);
        ticker.bid = book.best_bid();
        ticker.ask = book.best_ask();
        Ok(ticker)
    }
}

#[async_trait]
impl ExchangeAdapter for PaperExchangeAdapter {
    async fn init(&mut self, config: &ExchangeConfig) -> TradingApiResult<()> {
        self.fees = FeeOverrides::from_other_config(&config.other_config)?;
        if let Some(url) = config.other_config.get(PRICE_FEED_KEY) {
            self.price_feed = Some(ExchangeHttpClient::new(url.trim(), config.network())?);
        }

        let state = self.state.get_mut();
        state.available = parse_entries(&config.other_config, BALANCE_PREFIX)?
            .into_iter()
            .collect();
        state.prices = parse_entries(&config.other_config, PRICE_PREFIX)?
            .into_iter()
            .collect();

        info!(
            exchange = %config.name,
            currencies = state.available.len(),
            markets = state.prices.len(),
            price_feed = self.price_feed.is_some(),
            "Paper exchange initialised"
        );
        Ok(())
    }

    fn into_shared(self: Box<Self>) -> SharedTradingApi {
        Arc::new(*self)
    }
}
