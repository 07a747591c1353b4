//! BX-bot trading engine
//!
//! Loads engine, exchange, market and strategy configuration, wires one
//! exchange adapter and a strategy per enabled market, then runs trade
//! cycles until shut down. Fatal conditions raise a critical alert and
//! stop the engine.

pub mod alerts;
pub mod api;
pub mod config;
pub mod engine;
pub mod exchange;
pub mod models;
pub mod registry;
pub mod strategy;

pub use alerts::{Alerter, LogAlerter, WebhookAlerter, CRITICAL_ALERT_SUBJECT};
pub use api::{ExchangeAdapter, SharedTradingApi, TradingApi, TradingApiError, TradingApiResult};
pub use config::{BotConfig, ConfigError, ConfigRepository, YamlConfigRepository};
pub use engine::{EngineError, EngineState, ShutdownHandle, TradingEngine};
pub use registry::ComponentRegistry;
pub use strategy::{StrategyError, TradingStrategy};
