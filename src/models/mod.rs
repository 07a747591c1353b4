//! Data models for markets, orders, order books, balances and tickers.

mod balance;
mod market;
mod order;
mod ticker;

pub use balance::BalanceInfo;
pub use market::Market;
pub use order::{MarketOrder, MarketOrderBook, OpenOrder, OrderType};
pub use ticker::Ticker;
