//! BX-bot command line: run the trading engine or check a config directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use bxbot::alerts;
use bxbot::engine::format_amount;
use bxbot::{ComponentRegistry, ConfigRepository, TradingEngine, YamlConfigRepository};

/// BX-bot trading engine CLI.
#[derive(Parser)]
#[command(name = "bxbot")]
#[command(about = "Automated trading engine for cryptocurrency exchanges", long_about = None)]
struct Cli {
    /// Directory holding engine.yaml, exchange.yaml, markets.yaml and strategies.yaml
    #[arg(short, long, env = "BXBOT_CONFIG_DIR", default_value = "./config")]
    config_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the trading engine and run until Ctrl-C or a fatal error
    Run,

    /// Load and validate the configuration, then print a summary
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let repository = YamlConfigRepository::new(&cli.config_dir);

    match cli.command {
        Commands::Run => run(repository).await?,
        Commands::Check => check(&repository)?,
    }

    Ok(())
}

async fn run(repository: YamlConfigRepository) -> Result<()> {
    info!(config_dir = %repository.dir().display(), "Loading configuration");

    let config = repository
        .load()
        .with_context(|| format!("invalid configuration in {}", repository.dir().display()))?;
    let alerter = alerts::from_config(&config.alerts, &config.engine.bot_id)?;

    let engine = Arc::new(TradingEngine::new(
        Arc::new(repository),
        ComponentRegistry::with_defaults(),
        alerter,
    ));

    let shutdown = engine.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping after the current trade cycle");
            shutdown.shutdown();
        }
    });

    let handle = tokio::spawn({
        let engine = engine.clone();
        async move { engine.start().await }
    });

    match handle.await? {
        Ok(()) => {
            info!(cycles = engine.completed_cycles(), "BX-bot stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "BX-bot failed to start");
            Err(e.into())
        }
    }
}

fn check(repository: &YamlConfigRepository) -> Result<()> {
    let config = repository
        .load()
        .with_context(|| format!("invalid configuration in {}", repository.dir().display()))?;
    let registry = ComponentRegistry::with_defaults();

    println!("\n=== BX-bot Configuration ===\n");
    println!("Bot:            {} ({})", config.engine.bot_name, config.engine.bot_id);
    println!("Cycle interval: {}s", config.engine.trade_cycle_interval);
    if config.engine.emergency_stop_enabled() {
        println!(
            "Emergency stop: {} below {}",
            config.engine.emergency_stop_currency,
            format_amount(config.engine.emergency_stop_balance)
        );
    } else {
        println!("Emergency stop: disabled");
    }

    let adapter_known = registry.create_exchange_adapter(&config.exchange.adapter).is_some();
    println!(
        "Exchange:       {} [{}]{}",
        config.exchange.name,
        config.exchange.adapter,
        if adapter_known { "" } else { " (unknown adapter)" }
    );
    println!(
        "Alerts:         {}",
        match (&config.alerts.webhook_url, config.alerts.enabled) {
            (Some(url), true) => format!("webhook {}", url),
            _ => "log only".to_string(),
        }
    );

    println!("\n{:<12} {:<16} {:<10} {:<16} {:<8}", "MARKET", "NAME", "PAIR", "STRATEGY", "ENABLED");
    println!("{}", "-".repeat(66));
    for market in &config.markets {
        println!(
            "{:<12} {:<16} {:<10} {:<16} {:<8}",
            market.id,
            market.name,
            format!("{}/{}", market.base_currency, market.counter_currency),
            market.trading_strategy_id,
            if market.enabled { "yes" } else { "no" }
        );
    }

    let mut unknown = Vec::new();
    for market in config.enabled_markets() {
        if let Some(strategy) = config.strategy(&market.trading_strategy_id) {
            if registry.create_strategy(&strategy.class_name).is_none() {
                unknown.push(format!("strategy '{}' ({})", strategy.id, strategy.class_name));
            }
        }
    }
    if !adapter_known {
        unknown.push(format!("exchange adapter '{}'", config.exchange.adapter));
    }

    if unknown.is_empty() {
        println!("\nConfiguration OK");
        Ok(())
    } else {
        println!("\nAvailable adapters:   {}", registry.adapter_ids().join(", "));
        println!("Available strategies: {}", registry.strategy_ids().join(", "));
        anyhow::bail!("unregistered components: {}", unknown.join(", "))
    }
}
