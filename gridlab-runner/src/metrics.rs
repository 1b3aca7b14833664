//! Risk metrics — pure functions over a run's balance trajectory.
//!
//! The trajectory is the ordered `balance` field of every trade record,
//! entries included. Entries repeat the prior balance, so they add zero
//! deltas and never create a drawdown.

use serde::{Deserialize, Serialize};
use gridlab_core::domain::TradeRecord;
use gridlab_core::engine::RunResult;

/// Aggregate metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub final_balance: f64,
    /// (final - initial) / initial
    pub total_return: f64,
    /// Largest peak-to-trough decline in balance units (>= 0).
    pub max_drawdown: f64,
    /// Largest peak-to-trough decline as a fraction of the peak.
    pub max_drawdown_pct: f64,
    /// Gains / losses over balance deltas. `+inf` when nothing was lost.
    #[serde(with = "unbounded")]
    pub profit_factor: f64,
    /// Fraction of closes that raised the balance.
    pub win_rate: f64,
    pub trade_count: usize,
    pub round_trips: usize,
}

impl RiskMetrics {
    /// Compute all metrics from a trade log.
    pub fn from_trades(trades: &[TradeRecord], initial_balance: f64) -> Self {
        let balances = balance_trajectory(trades);
        let final_balance = balances.last().copied().unwrap_or(initial_balance);
        Self {
            final_balance,
            total_return: total_return(initial_balance, final_balance),
            max_drawdown: max_drawdown(&balances),
            max_drawdown_pct: max_drawdown_pct(&balances),
            profit_factor: profit_factor(&balances),
            win_rate: win_rate(trades, initial_balance),
            trade_count: trades.len(),
            round_trips: trades.iter().filter(|t| t.kind.is_exit()).count(),
        }
    }

    pub fn compute(result: &RunResult) -> Self {
        let mut metrics = Self::from_trades(&result.trades, result.initial_balance);
        metrics.final_balance = result.final_balance;
        metrics.total_return = total_return(result.initial_balance, result.final_balance);
        metrics
    }
}

/// Serde for ratios that may be `+inf`: written as the string `"inf"`,
/// since JSON has no infinity literal.
pub mod unbounded {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            Some(Repr::Number(v)) => Ok(v),
            Some(Repr::Text(s)) => s.parse::<f64>().map_err(serde::de::Error::custom),
            None => Ok(f64::INFINITY),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Ordered balances recorded by the trade log.
pub fn balance_trajectory(trades: &[TradeRecord]) -> Vec<f64> {
    trades.iter().map(|t| t.balance).collect()
}

pub fn total_return(initial: f64, final_balance: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_balance - initial) / initial
}

/// Maximum of `running_peak[k] - balance[k]`. Zero for an empty or
/// non-decreasing trajectory.
pub fn max_drawdown(balances: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &b in balances {
        peak = peak.max(b);
        max_dd = max_dd.max(peak - b);
    }
    max_dd
}

/// Maximum drawdown relative to the running peak, as a positive fraction.
pub fn max_drawdown_pct(balances: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &b in balances {
        peak = peak.max(b);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - b) / peak);
        }
    }
    max_dd
}

/// Sum of positive deltas over the absolute sum of negative deltas.
///
/// Returns `f64::INFINITY` when there are no losses, including an empty or
/// single-point trajectory.
pub fn profit_factor(balances: &[f64]) -> f64 {
    let (gains, losses) = gains_and_losses(balances);
    if losses > 0.0 {
        gains / losses
    } else {
        f64::INFINITY
    }
}

/// `(gains, losses)` over consecutive balance deltas; both non-negative.
pub fn gains_and_losses(balances: &[f64]) -> (f64, f64) {
    balances
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), d| {
            if d > 0.0 {
                (g + d, l)
            } else if d < 0.0 {
                (g, l - d)
            } else {
                (g, l)
            }
        })
}

/// Fraction of exit records whose balance rose versus the record before.
pub fn win_rate(trades: &[TradeRecord], initial_balance: f64) -> f64 {
    let mut prev = initial_balance;
    let mut exits = 0usize;
    let mut wins = 0usize;
    for t in trades {
        if t.kind.is_exit() {
            exits += 1;
            if t.balance > prev {
                wins += 1;
            }
        }
        prev = t.balance;
    }
    if exits == 0 {
        return 0.0;
    }
    wins as f64 / exits as f64
}
