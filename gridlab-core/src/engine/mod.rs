//! Backtesting engine — single-instrument, close-fill replay.
//!
//! The engine consumes an index-aligned pair of bars and signals and replays
//! them through a `PositionLedger`:
//!
//! 1. Bar 0 seeds indicators only, no trade
//! 2. Bars `1..n`: open, reverse or hold at the bar's close
//! 3. After the last bar: force-close any open position

pub mod error;
pub mod ledger;
pub mod loop_runner;
pub mod state;

pub use error::EngineError;
pub use ledger::PositionLedger;
pub use loop_runner::{run_backtest, validate_bars, validate_inputs};
pub use state::{EngineConfig, RunResult, DEFAULT_FEE_RATE, DEFAULT_INITIAL_BALANCE};
