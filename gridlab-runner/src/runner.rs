//! Backtest runner — wires together strategy, engine, and metrics.
//!
//! Two entry points:
//! - `run_strategy()`: one generator over pre-loaded bars. Used by the optimizer.
//! - `run_from_config()`: builds strategy and sizer from a `GridlabConfig`. Used by the CLI.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gridlab_core::domain::{Bar, TradeRecord};
use gridlab_core::engine::{run_backtest, EngineConfig, EngineError, RunResult};
use gridlab_core::signals::{MaCrossover, SignalGenerator, StrategyConfig, StrategyError};
use gridlab_core::sizers::Sizer;

use crate::config::GridlabConfig;
use crate::metrics::RiskMetrics;

/// Errors from a single run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy: String,
    pub sizer: String,
    pub metrics: RiskMetrics,
    pub trades: Vec<TradeRecord>,
    pub initial_balance: f64,
    pub fees_paid: f64,
    pub bar_count: usize,
    pub signal_count: usize,
    pub start: Option<String>,
    pub end: Option<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestReport {
    fn new(strategy: &str, sizer: &str, bars: &[Bar], result: RunResult) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            strategy: strategy.to_string(),
            sizer: sizer.to_string(),
            metrics: RiskMetrics::compute(&result),
            initial_balance: result.initial_balance,
            fees_paid: result.fees_paid,
            bar_count: result.bar_count,
            signal_count: result.signal_count,
            start: bars.first().map(|b| b.timestamp.to_rfc3339()),
            end: bars.last().map(|b| b.timestamp.to_rfc3339()),
            trades: result.trades,
        }
    }

    pub fn final_balance(&self) -> f64 {
        self.metrics.final_balance
    }
}

/// Generate signals and replay them. No I/O.
pub fn run_strategy(
    bars: &[Bar],
    strategy: &dyn SignalGenerator,
    config: &EngineConfig,
    sizer: &dyn Sizer,
) -> Result<BacktestReport, RunError> {
    let signals = strategy.generate(bars)?;
    let result = run_backtest(bars, &signals, config, sizer)?;
    Ok(BacktestReport::new(strategy.name(), sizer.name(), bars, result))
}

/// Run the crossover from a config, optionally overriding its windows.
pub fn run_from_config(
    bars: &[Bar],
    config: &GridlabConfig,
    windows: Option<(usize, usize)>,
) -> Result<BacktestReport, RunError> {
    let strategy_config: StrategyConfig = match windows {
        Some((short, long)) => config.strategy.clone().with_windows(short, long),
        None => config.strategy.clone(),
    };
    let strategy = MaCrossover::new(strategy_config)?;
    let sizer = config.build_sizer();
    run_strategy(bars, &strategy, &config.engine_config(), sizer.as_ref())
}
