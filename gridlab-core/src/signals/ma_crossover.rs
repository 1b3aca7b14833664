//! Moving average crossover — level-based trend signal.
//!
//! Per bar the strategy compares a fast and a slow moving average:
//! - Long (+1) while fast > slow
//! - Short (-1) while fast < slow
//! - No change (0) when equal or either average is undefined
//!
//! Two optional filters can clear a level from bar 1 on:
//! - trend filter: keep +1 only while the slow MA rises, -1 only while it falls
//! - distance filter: drop the level when the averages are closer than
//!   `close * min_distance_pct`

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Signal, SignalSeries};
use crate::indicators::{Ema, Indicator, Sma};

use super::{SignalGenerator, StrategyError};

/// Moving average type selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaKind {
    #[default]
    Ema,
    Sma,
}

impl MaKind {
    fn indicator(&self, window: usize) -> Box<dyn Indicator> {
        match self {
            MaKind::Ema => Box::new(Ema::new(window)),
            MaKind::Sma => Box::new(Sma::new(window)),
        }
    }
}

/// Crossover parameters, passed explicitly at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub ma_kind: MaKind,
    pub trend_filter: bool,
    /// Minimum `|fast - slow|` as a fraction of the close. `None` disables.
    pub min_distance_pct: Option<f64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            short_window: 9,
            long_window: 21,
            ma_kind: MaKind::Ema,
            trend_filter: false,
            min_distance_pct: None,
        }
    }
}

impl StrategyConfig {
    pub fn with_windows(mut self, short_window: usize, long_window: usize) -> Self {
        self.short_window = short_window;
        self.long_window = long_window;
        self
    }

    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.short_window == 0 {
            return Err(StrategyError::InvalidParams(
                "short_window must be >= 1".into(),
            ));
        }
        if self.short_window >= self.long_window {
            return Err(StrategyError::InvalidParams(format!(
                "short_window ({}) must be < long_window ({})",
                self.short_window, self.long_window
            )));
        }
        if let Some(pct) = self.min_distance_pct {
            if !pct.is_finite() || pct < 0.0 {
                return Err(StrategyError::InvalidParams(format!(
                    "min_distance_pct must be finite and >= 0, got {pct}"
                )));
            }
        }
        Ok(())
    }
}

/// Moving average crossover signal generator.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    config: StrategyConfig,
    name: String,
}

impl MaCrossover {
    pub fn new(config: StrategyConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        let kind = match config.ma_kind {
            MaKind::Ema => "ema",
            MaKind::Sma => "sma",
        };
        let name = format!(
            "{kind}_cross_{}_{}",
            config.short_window, config.long_window
        );
        Ok(Self { config, name })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Raw crossover levels (+1 / -1 / 0) after filters.
    pub fn levels(&self, bars: &[Bar]) -> Result<Vec<i8>, StrategyError> {
        if let Some(index) = bars.iter().position(|b| !b.close.is_finite()) {
            return Err(StrategyError::NonFiniteClose { index });
        }

        let fast = self.config.ma_kind.indicator(self.config.short_window).compute(bars);
        let slow = self.config.ma_kind.indicator(self.config.long_window).compute(bars);

        let mut levels: Vec<i8> = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| {
                if f > s {
                    1
                } else if f < s {
                    -1
                } else {
                    0
                }
            })
            .collect();

        for i in 1..levels.len() {
            if self.config.trend_filter {
                let slope = slow[i] - slow[i - 1];
                if (levels[i] == 1 && slope <= 0.0) || (levels[i] == -1 && slope >= 0.0) {
                    levels[i] = 0;
                }
            }
            if let Some(pct) = self.config.min_distance_pct {
                if (fast[i] - slow[i]).abs() < bars[i].close * pct {
                    levels[i] = 0;
                }
            }
        }

        Ok(levels)
    }
}

impl SignalGenerator for MaCrossover {
    fn generate(&self, bars: &[Bar]) -> Result<SignalSeries, StrategyError> {
        Ok(self
            .levels(bars)?
            .into_iter()
            .map(Signal::from_level)
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
