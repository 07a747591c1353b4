//! Trading API contract shared by exchange adapters, strategies and the engine.

mod error;
mod trading_api;

pub use error::{TradingApiError, TradingApiResult};
pub use trading_api::{ExchangeAdapter, SharedTradingApi, TradingApi};
