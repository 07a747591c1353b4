//! Trading engine: owns the bot lifecycle and drives the trade-cycle loop.
//!
//! Each cycle:
//! 1. Exit if shutdown was requested.
//! 2. Run the emergency-stop balance check when a threshold is configured.
//! 3. Call `execute` on every enabled market's strategy, one at a time, in
//!    configuration order.
//! 4. Sleep for the trade cycle interval in short ticks, so a shutdown
//!    request takes effect within about one tick.
//!
//! Any fatal condition sends exactly one critical alert and ends the run.
//! Network errors from the engine's own balance fetch are logged and the
//! cycle is skipped; they never stop the engine.

mod emergency_stop;
mod failure;
mod wiring;

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::alerts::{Alerter, CRITICAL_ALERT_SUBJECT};
use crate::config::{ConfigError, ConfigRepository};
use crate::registry::ComponentRegistry;
use crate::strategy::StrategyError;

pub use emergency_stop::BalanceCheck;
pub use failure::{format_amount, Fatal};

use failure::panic_message;
use wiring::WiredRun;

/// How often the inter-cycle sleep re-checks the shutdown flag.
pub const SHUTDOWN_POLL_TICK: Duration = Duration::from_secs(1);

/// Errors returned by [`TradingEngine::start`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no {kind} registered as '{id}'")]
    UnknownComponent { kind: &'static str, id: String },

    #[error("wiring failed: {0}")]
    Wiring(String),
}

/// Engine run-state. Moves only forward: `NotStarted -> Running -> Shutdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    NotStarted = 0,
    Running = 1,
    Shutdown = 2,
}

impl EngineState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => EngineState::NotStarted,
            1 => EngineState::Running,
            _ => EngineState::Shutdown,
        }
    }
}

/// Cloneable handle for requesting shutdown from another task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if !self.0.swap(true, Ordering::SeqCst) {
            info!("Shutdown requested");
        }
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The trading engine. One instance runs at most once.
///
/// [`start`](Self::start) runs the loop on whatever task awaits it; the
/// engine never spawns one itself. To keep control of the calling task,
/// put the engine in an `Arc` and `tokio::spawn` the start future, then
/// call [`shutdown`](Self::shutdown) from anywhere.
pub struct TradingEngine {
    config_repository: Arc<dyn ConfigRepository>,
    registry: ComponentRegistry,
    alerter: Arc<dyn Alerter>,
    state: AtomicU8,
    shutdown: ShutdownHandle,
    completed_cycles: AtomicU64,
}

impl TradingEngine {
    pub fn new(
        config_repository: Arc<dyn ConfigRepository>,
        registry: ComponentRegistry,
        alerter: Arc<dyn Alerter>,
    ) -> Self {
        Self {
            config_repository,
            registry,
            alerter,
            state: AtomicU8::new(EngineState::NotStarted as u8),
            shutdown: ShutdownHandle(Arc::new(AtomicBool::new(false))),
            completed_cycles: AtomicU64::new(0),
        }
    }

    /// Load and wire configuration, then run trade cycles until shutdown is
    /// requested or a fatal condition occurs.
    ///
    /// Fails with [`EngineError::InvalidState`] if the engine is already
    /// running or has already run. A wiring failure leaves the engine shut
    /// down.
    pub async fn start(&self) -> Result<(), EngineError> {
        self.state
            .compare_exchange(
                EngineState::NotStarted as u8,
                EngineState::Running as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map_err(|current| {
                EngineError::InvalidState(match EngineState::from_u8(current) {
                    EngineState::Running => "engine is already running".to_string(),
                    _ => "engine has already been shut down and cannot be restarted".to_string(),
                })
            })?;

        info!("Starting trading engine");

        let run = match wiring::wire(self.config_repository.as_ref(), &self.registry).await {
            Ok(run) => run,
            Err(e) => {
                error!(error = %e, "Failed to wire trading engine");
                self.set_state(EngineState::Shutdown);
                return Err(e);
            }
        };

        info!(
            bot_id = %run.engine.bot_id,
            bot_name = %run.engine.bot_name,
            exchange = run.api.impl_name(),
            markets = run.markets.len(),
            trade_cycle_interval = run.engine.trade_cycle_interval,
            emergency_stop_currency = %run.engine.emergency_stop_currency,
            emergency_stop_balance = %format_amount(run.engine.emergency_stop_balance),
            "Trading engine running"
        );

        self.run_loop(run).await;

        self.set_state(EngineState::Shutdown);
        info!(
            cycles = self.completed_cycles(),
            "Trading engine shut down"
        );
        Ok(())
    }

    /// Ask the loop to stop at its next poll point. Never blocks, never
    /// interrupts a strategy call in flight, and may be called any number
    /// of times, before or after start.
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// True from the moment `start()` claims the engine until the loop
    /// exits. This includes the wiring window before the first cycle, so a
    /// concurrent second `start()` is rejected as soon as the first begins.
    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Trade cycles that ran to the end without a fatal condition.
    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: EngineState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    async fn run_loop(&self, mut run: WiredRun) {
        let interval = Duration::from_secs(run.engine.trade_cycle_interval);

        loop {
            if self.shutdown.is_requested() {
                info!("Shutdown observed, leaving trade cycle loop");
                break;
            }

            if let Err(fatal) = self.run_trade_cycle(&mut run).await {
                self.raise_fatal(fatal).await;
                break;
            }
            let cycle = self.completed_cycles.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(cycle, "Trade cycle complete");

            self.sleep_between_cycles(interval).await;
        }
    }

    async fn run_trade_cycle(&self, run: &mut WiredRun) -> Result<(), Fatal> {
        if run.engine.emergency_stop_enabled() {
            let check = emergency_stop::check(
                run.api.as_ref(),
                &run.engine.emergency_stop_currency,
                run.engine.emergency_stop_balance,
            )
            .await?;
            if check == BalanceCheck::Unavailable {
                return Ok(());
            }
        }

        for wired in &mut run.markets {
            debug!(market = %wired.market.id, strategy = %wired.strategy_id, "Executing strategy");

            match AssertUnwindSafe(wired.strategy.execute()).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(StrategyError::Failure(msg))) => return Err(Fatal::Strategy(msg)),
                Ok(Err(StrategyError::Unexpected(e))) => {
                    return Err(Fatal::Unexpected(format!("{:#}", e)))
                }
                Err(panic) => return Err(Fatal::Unexpected(panic_message(panic))),
            }
        }

        Ok(())
    }

    /// Alert, then flag shutdown. Alert delivery problems are logged only.
    async fn raise_fatal(&self, fatal: Fatal) {
        let body = fatal.alert_body();
        error!(reason = %body, "Fatal condition, shutting down trading engine");

        if let Err(e) = self.alerter.send_alert(CRITICAL_ALERT_SUBJECT, &body).await {
            error!(error = %e, "Failed to send critical alert");
        }

        self.shutdown.shutdown();
    }

    async fn sleep_between_cycles(&self, interval: Duration) {
        let deadline = Instant::now() + interval;

        while !self.shutdown.is_requested() {
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            sleep(SHUTDOWN_POLL_TICK.min(deadline - now)).await;
        }
        warn!("Shutdown requested during inter-cycle sleep");
    }
}
