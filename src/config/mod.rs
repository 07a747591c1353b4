//! Engine, exchange, market, strategy and alert configuration.

mod repository;

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use repository::{ConfigRepository, YamlConfigRepository};

/// Connection timeout used when the exchange config has no network section.
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Engine-wide settings. Loaded once per start and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub bot_id: String,

    /// Descriptive only
    #[serde(default)]
    pub bot_name: String,

    /// Currency whose available balance is watched
    #[serde(default)]
    pub emergency_stop_currency: String,

    /// Minimum available balance; zero disables the check
    #[serde(default)]
    pub emergency_stop_balance: Decimal,

    /// Seconds between trade cycles
    pub trade_cycle_interval: u64,
}

impl EngineConfig {
    /// Whether the pre-cycle balance check runs at all.
    pub fn emergency_stop_enabled(&self) -> bool {
        self.emergency_stop_balance > Decimal::ZERO
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_id.trim().is_empty() {
            return Err(ConfigError::Invalid("engine botId must not be empty".into()));
        }
        if self.trade_cycle_interval == 0 {
            return Err(ConfigError::Invalid(
                "engine tradeCycleInterval must be a positive number of seconds".into(),
            ));
        }
        if self.emergency_stop_balance < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "engine emergencyStopBalance must not be negative, got {}",
                self.emergency_stop_balance
            )));
        }
        if self.emergency_stop_enabled() && self.emergency_stop_currency.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "engine emergencyStopCurrency is required when emergencyStopBalance is set".into(),
            ));
        }
        Ok(())
    }
}

/// Network behaviour the exchange adapter applies to its own calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// HTTP status codes treated as transient
    #[serde(default)]
    pub non_fatal_error_codes: Vec<u16>,

    /// Error message fragments treated as transient
    #[serde(default)]
    pub non_fatal_error_messages: Vec<String>,
}

fn default_connection_timeout() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT_SECS,
            non_fatal_error_codes: Vec::new(),
            non_fatal_error_messages: Vec::new(),
        }
    }
}

impl NetworkConfig {
    /// Whether a failure with this status and message counts as transient.
    pub fn is_non_fatal(&self, status: Option<u16>, message: &str) -> bool {
        if let Some(code) = status {
            if self.non_fatal_error_codes.contains(&code) {
                return true;
            }
        }
        self.non_fatal_error_messages
            .iter()
            .any(|fragment| !fragment.is_empty() && message.contains(fragment.as_str()))
    }
}

/// Exchange adapter selection and settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeConfig {
    pub name: String,

    /// Registry id of the adapter implementation
    pub adapter: String,

    /// Opaque credentials handed to the adapter
    #[serde(default)]
    pub authentication_config: BTreeMap<String, String>,

    #[serde(default)]
    pub network_config: Option<NetworkConfig>,

    /// Opaque adapter-specific settings (fee overrides and the like)
    #[serde(default)]
    pub other_config: BTreeMap<String, String>,
}

impl ExchangeConfig {
    /// Network settings, falling back to defaults when none are configured.
    pub fn network(&self) -> NetworkConfig {
        self.network_config.clone().unwrap_or_default()
    }
}

/// A configured market and the strategy bound to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketConfig {
    pub id: String,
    pub name: String,
    pub base_currency: String,
    pub counter_currency: String,
    #[serde(default)]
    pub enabled: bool,
    pub trading_strategy_id: String,
}

/// A configured strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,

    /// Registry id of the strategy implementation
    #[serde(alias = "beanName")]
    pub class_name: String,

    /// Passed verbatim to the strategy's `init`
    #[serde(default)]
    pub config_items: BTreeMap<String, String>,
}

/// Alert delivery settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Complete configuration for one engine run.
///
/// Also serves as an in-memory [`ConfigRepository`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub engine: EngineConfig,
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub markets: Vec<MarketConfig>,
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
    #[serde(default)]
    pub alerts: AlertsConfig,
}

impl BotConfig {
    /// Check the sections against each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;

        if self.exchange.adapter.trim().is_empty() {
            return Err(ConfigError::Invalid("exchange adapter must not be empty".into()));
        }

        let mut strategy_ids = HashSet::new();
        for strategy in &self.strategies {
            if !strategy_ids.insert(strategy.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate strategy id '{}'",
                    strategy.id
                )));
            }
        }

        let mut market_ids = HashSet::new();
        for market in &self.markets {
            if !market_ids.insert(market.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate market id '{}'", market.id)));
            }
            if market.enabled && !strategy_ids.contains(market.trading_strategy_id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "market '{}' references unknown tradingStrategyId '{}'",
                    market.id, market.trading_strategy_id
                )));
            }
        }

        Ok(())
    }

    /// Enabled markets in configuration order.
    pub fn enabled_markets(&self) -> impl Iterator<Item = &MarketConfig> {
        self.markets.iter().filter(|m| m.enabled)
    }

    pub fn strategy(&self, id: &str) -> Option<&StrategyConfig> {
        self.strategies.iter().find(|s| s.id == id)
    }
}
