//! Configuration sources.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{
    AlertsConfig, BotConfig, ConfigError, EngineConfig, ExchangeConfig, MarketConfig,
    StrategyConfig,
};

/// Source of the configuration the engine loads when it starts.
pub trait ConfigRepository: Send + Sync {
    fn engine(&self) -> Result<EngineConfig, ConfigError>;
    fn exchange(&self) -> Result<ExchangeConfig, ConfigError>;
    fn markets(&self) -> Result<Vec<MarketConfig>, ConfigError>;
    fn strategies(&self) -> Result<Vec<StrategyConfig>, ConfigError>;
    fn alerts(&self) -> Result<AlertsConfig, ConfigError>;

    /// Load every section and validate them together.
    fn load(&self) -> Result<BotConfig, ConfigError> {
        let config = BotConfig {
            engine: self.engine()?,
            exchange: self.exchange()?,
            markets: self.markets()?,
            strategies: self.strategies()?,
            alerts: self.alerts()?,
        };
        config.validate()?;
        Ok(config)
    }
}

impl ConfigRepository for BotConfig {
    fn engine(&self) -> Result<EngineConfig, ConfigError> {
        Ok(self.engine.clone())
    }

    fn exchange(&self) -> Result<ExchangeConfig, ConfigError> {
        Ok(self.exchange.clone())
    }

    fn markets(&self) -> Result<Vec<MarketConfig>, ConfigError> {
        Ok(self.markets.clone())
    }

    fn strategies(&self) -> Result<Vec<StrategyConfig>, ConfigError> {
        Ok(self.strategies.clone())
    }

    fn alerts(&self) -> Result<AlertsConfig, ConfigError> {
        Ok(self.alerts.clone())
    }
}

pub const ENGINE_FILE: &str = "engine.yaml";
pub const EXCHANGE_FILE: &str = "exchange.yaml";
pub const MARKETS_FILE: &str = "markets.yaml";
pub const STRATEGIES_FILE: &str = "strategies.yaml";
pub const ALERTS_FILE: &str = "alerts.yaml";

#[derive(Deserialize)]
struct EngineFile {
    engine: EngineConfig,
}

#[derive(Deserialize)]
struct ExchangeFile {
    exchange: ExchangeConfig,
}

#[derive(Deserialize)]
struct MarketsFile {
    #[serde(default)]
    markets: Vec<MarketConfig>,
}

#[derive(Deserialize)]
struct StrategiesFile {
    #[serde(default)]
    strategies: Vec<StrategyConfig>,
}

#[derive(Deserialize)]
struct AlertsFile {
    #[serde(default)]
    alerts: AlertsConfig,
}

/// Reads one YAML file per section from a config directory.
#[derive(Debug, Clone)]
pub struct YamlConfigRepository {
    dir: PathBuf,
}

impl YamlConfigRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<T, ConfigError> {
        let path = self.dir.join(file);
        let path_str = path.display().to_string();
        debug!(path = %path_str, "Reading config file");

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path_str.clone(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path_str,
            source,
        })
    }
}

impl ConfigRepository for YamlConfigRepository {
    fn engine(&self) -> Result<EngineConfig, ConfigError> {
        self.read::<EngineFile>(ENGINE_FILE).map(|f| f.engine)
    }

    fn exchange(&self) -> Result<ExchangeConfig, ConfigError> {
        self.read::<ExchangeFile>(EXCHANGE_FILE).map(|f| f.exchange)
    }

    fn markets(&self) -> Result<Vec<MarketConfig>, ConfigError> {
        self.read::<MarketsFile>(MARKETS_FILE).map(|f| f.markets)
    }

    fn strategies(&self) -> Result<Vec<StrategyConfig>, ConfigError> {
        self.read::<StrategiesFile>(STRATEGIES_FILE).map(|f| f.strategies)
    }

    /// Alerts are optional; no file means alerts disabled.
    fn alerts(&self) -> Result<AlertsConfig, ConfigError> {
        if !self.dir.join(ALERTS_FILE).exists() {
            return Ok(AlertsConfig::default());
        }
        self.read::<AlertsFile>(ALERTS_FILE).map(|f| f.alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;

    fn write_config(dir: &Path, exchange: &str) {
        fs::write(
            dir.join(ENGINE_FILE),
            r#"
engine:
  botId: my-bot
  botName: My Bot
  emergencyStopCurrency: BTC
  emergencyStopBalance: "0.5"
  tradeCycleInterval: 20
"#,
        )
        .unwrap();
        fs::write(dir.join(EXCHANGE_FILE), exchange).unwrap();
        fs::write(
            dir.join(MARKETS_FILE),
            r#"
markets:
  - id: btcusd
    name: BTC/USD
    baseCurrency: BTC
    counterCurrency: USD
    enabled: true
    tradingStrategyId: watch
  - id: ltcusd
    name: LTC/USD
    baseCurrency: LTC
    counterCurrency: USD
    enabled: false
    tradingStrategyId: watch
"#,
        )
        .unwrap();
        fs::write(
            dir.join(STRATEGIES_FILE),
            r#"
strategies:
  - id: watch
    name: Market Watch
    description: Logs the latest price
    className: market-watch
    configItems:
      log-order-book: "true"
"#,
        )
        .unwrap();
    }

    #[test]
    fn test_load_without_network_or_alerts() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
exchange:
  name: Paper
  adapter: paper
  otherConfig:
    balance.BTC: "2"
"#,
        );

        let config = YamlConfigRepository::new(dir.path()).load().unwrap();

        assert_eq!(config.engine.bot_id, "my-bot");
        assert_eq!(config.engine.emergency_stop_balance, dec!(0.5));
        assert_eq!(config.engine.trade_cycle_interval, 20);
        assert!(config.exchange.network_config.is_none());
        assert_eq!(config.exchange.other_config.get("balance.BTC").unwrap(), "2");
        assert_eq!(config.markets.len(), 2);
        assert_eq!(config.enabled_markets().count(), 1);
        assert_eq!(config.strategies[0].class_name, "market-watch");
        assert_eq!(config.strategies[0].config_items.get("log-order-book").unwrap(), "true");
        assert!(!config.alerts.enabled);
    }

    #[test]
    fn test_load_network_and_alerts() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
exchange:
  name: Paper
  adapter: paper
  networkConfig:
    connectionTimeout: 15
    nonFatalErrorCodes: [502, 503, 520]
    nonFatalErrorMessages:
      - Connection refused
"#,
        );
        fs::write(
            dir.path().join(ALERTS_FILE),
            "alerts:\n  enabled: true\n  webhookUrl: http://localhost:9000/alerts\n",
        )
        .unwrap();

        let config = YamlConfigRepository::new(dir.path()).load().unwrap();
        let network = config.exchange.network();

        assert_eq!(network.connection_timeout, 15);
        assert_eq!(network.non_fatal_error_codes, vec![502, 503, 520]);
        assert!(config.alerts.enabled);
        assert_eq!(
            config.alerts.webhook_url.as_deref(),
            Some("http://localhost:9000/alerts")
        );
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = YamlConfigRepository::new(dir.path()).engine().unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains(ENGINE_FILE));
    }

    #[test]
    fn test_malformed_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ENGINE_FILE), "engine: [not, a, map]").unwrap();

        let err = YamlConfigRepository::new(dir.path()).engine().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
