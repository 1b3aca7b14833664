//! Signal generation — turns bars into a `SignalSeries`.
//!
//! Generators must NEVER depend on ledger state (position, balance).
//! They describe "what do I want?", not "what do I have?".

pub mod factory;
pub mod ma_crossover;

pub use factory::{MaCrossoverFactory, ParamSet, StrategyFactory};
pub use ma_crossover::{MaCrossover, MaKind, StrategyConfig};

use thiserror::Error;

use crate::domain::{Bar, SignalSeries};

/// Errors raised while building a strategy or deriving its signals.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("invalid strategy parameters: {0}")]
    InvalidParams(String),

    #[error("non-finite close at bar {index}")]
    NonFiniteClose { index: usize },
}

/// Ledger-agnostic signal generator.
///
/// # Invariants
/// - `generate()` MUST be deterministic for the same bar sequence
/// - the returned series has exactly `bars.len()` entries
pub trait SignalGenerator: Send + Sync {
    fn generate(&self, bars: &[Bar]) -> Result<SignalSeries, StrategyError>;

    /// Generator name for reports/logging
    fn name(&self) -> &str;
}
