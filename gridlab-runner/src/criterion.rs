//! Selection criterion — which metric the optimizer maximizes.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::metrics::RiskMetrics;

/// Metric used to rank grid points. Every score is maximized.
///
/// Parsed leniently: an unknown name falls back to `FinalBalance`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SelectionCriterion {
    #[default]
    FinalBalance,
    /// Scored as `-max_drawdown`, so the smallest drawdown wins.
    MaxDrawdown,
    /// `+inf` (no losing deltas) beats every finite score.
    ProfitFactor,
}

impl SelectionCriterion {
    pub const ALL: [SelectionCriterion; 3] = [
        SelectionCriterion::FinalBalance,
        SelectionCriterion::MaxDrawdown,
        SelectionCriterion::ProfitFactor,
    ];

    /// Strict parse; `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "final_balance" => Some(Self::FinalBalance),
            "max_drawdown" => Some(Self::MaxDrawdown),
            "profit_factor" => Some(Self::ProfitFactor),
            _ => None,
        }
    }

    /// Lenient parse used by config and CLI.
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            warn!(criterion = name, "unknown criterion, using final_balance");
            Self::FinalBalance
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FinalBalance => "final_balance",
            Self::MaxDrawdown => "max_drawdown",
            Self::ProfitFactor => "profit_factor",
        }
    }

    /// Score for a run; higher is better.
    pub fn score(&self, metrics: &RiskMetrics) -> f64 {
        match self {
            Self::FinalBalance => metrics.final_balance,
            Self::MaxDrawdown => -metrics.max_drawdown,
            Self::ProfitFactor => metrics.profit_factor,
        }
    }

    /// Returns true if `candidate` replaces `best`. Ties keep `best`.
    pub fn is_better(candidate: f64, best: f64) -> bool {
        candidate > best
    }
}

impl fmt::Display for SelectionCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SelectionCriterion {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<SelectionCriterion> for String {
    fn from(c: SelectionCriterion) -> Self {
        c.as_str().to_string()
    }
}
