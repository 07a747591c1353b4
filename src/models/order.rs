//! Order and order book models exchanged through the Trading API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Buy,
    Sell,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Buy => "BUY",
            OrderType::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of our own orders still open on the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    /// Exchange-assigned order id
    pub id: String,

    /// When the order was placed
    pub created_at: DateTime<Utc>,

    /// Market the order belongs to
    pub market_id: String,

    pub order_type: OrderType,

    /// Limit price in the counter currency
    pub price: Decimal,

    /// Amount still unfilled, in the base currency
    pub quantity: Decimal,

    /// Amount originally requested, in the base currency
    pub original_quantity: Decimal,

    /// price * quantity
    pub total: Decimal,
}

impl OpenOrder {
    /// Amount already filled.
    pub fn filled_quantity(&self) -> Decimal {
        self.original_quantity - self.quantity
    }
}

/// A single price level in a market's order book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOrder {
    pub order_type: OrderType,
    pub price: Decimal,
    pub quantity: Decimal,
    pub total: Decimal,
}

impl MarketOrder {
    pub fn new(order_type: OrderType, price: Decimal, quantity: Decimal) -> Self {
        Self {
            order_type,
            price,
            quantity,
            total: price * quantity,
        }
    }
}

/// Current order book for a market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketOrderBook {
    pub market_id: String,

    /// Sell side, best (lowest) price first
    pub sell_orders: Vec<MarketOrder>,

    /// Buy side, best (highest) price first
    pub buy_orders: Vec<MarketOrder>,
}

impl MarketOrderBook {
    pub fn best_bid(&self) -> Option<Decimal> {
        self.buy_orders.first().map(|o| o.price)
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.sell_orders.first().map(|o| o.price)
    }

    /// Ask minus bid, when both sides are present.
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()? - self.best_bid()?)
    }
}
