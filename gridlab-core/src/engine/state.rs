//! Engine configuration and run result types.

use serde::{Deserialize, Serialize};

use crate::domain::TradeRecord;
use crate::engine::error::EngineError;

/// Default starting balance (quote currency).
pub const DEFAULT_INITIAL_BALANCE: f64 = 1000.0;

/// Default proportional fee (0.04%, a typical futures taker rate).
pub const DEFAULT_FEE_RATE: f64 = 0.0004;

/// Configuration for a single backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_balance: f64,
    /// Proportional fee on entry and exit notional, charged when a position closes.
    pub fee_rate: f64,
}

impl EngineConfig {
    pub fn new(initial_balance: f64, fee_rate: f64) -> Self {
        Self {
            initial_balance,
            fee_rate,
        }
    }

    /// Frictionless config: no fees.
    pub fn frictionless(initial_balance: f64) -> Self {
        Self::new(initial_balance, 0.0)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.initial_balance.is_finite() || self.initial_balance <= 0.0 {
            return Err(EngineError::invalid(format!(
                "initial_balance must be finite and > 0, got {}",
                self.initial_balance
            )));
        }
        if !self.fee_rate.is_finite() || self.fee_rate < 0.0 {
            return Err(EngineError::invalid(format!(
                "fee_rate must be finite and >= 0, got {}",
                self.fee_rate
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_BALANCE, DEFAULT_FEE_RATE)
    }
}

/// Outcome of one backtest run. Every position is closed by the time this exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub trades: Vec<TradeRecord>,
    /// Total fees charged across all closes.
    pub fees_paid: f64,
    pub bar_count: usize,
    /// Directional signals seen on tradable bars (index >= 1).
    pub signal_count: usize,
}

impl RunResult {
    pub fn net_pnl(&self) -> f64 {
        self.final_balance - self.initial_balance
    }

    /// Completed round trips (one per exit record).
    pub fn round_trips(&self) -> usize {
        self.trades.iter().filter(|t| t.kind.is_exit()).count()
    }
}
