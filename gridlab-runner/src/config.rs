//! TOML configuration for backtests and optimization sweeps.
//!
//! ```toml
//! [backtest]
//! initial_balance = 1000.0
//! fee_rate = 0.0004
//!
//! [sizing]
//! type = "percent_of_balance"
//! fraction = 2.0
//! basis = "initial"
//!
//! [strategy]
//! short_window = 9
//! long_window = 21
//! ma_kind = "ema"
//!
//! [[grid.axes]]
//! name = "short_window"
//! start = 5
//! end = 30
//! step = 5
//!
//! [[grid.axes]]
//! name = "long_window"
//! values = [20, 30, 40]
//!
//! [optimize]
//! criterion = "final_balance"
//! parallel = true
//! ```
//!
//! Every section is optional; missing sections take the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gridlab_core::engine::{EngineConfig, EngineError};
use gridlab_core::signals::{MaCrossoverFactory, StrategyConfig, StrategyError};
use gridlab_core::sizers::{FixedSizer, PercentSizer, Sizer, SizingBasis};

use crate::criterion::SelectionCriterion;
use crate::grid::{GridAxis, GridError, ParamGrid, LONG_WINDOW, SHORT_WINDOW};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid [backtest] section: {0}")]
    Engine(#[from] EngineError),

    #[error("invalid [strategy] section: {0}")]
    Strategy(#[from] StrategyError),

    #[error("invalid [grid] section: {0}")]
    Grid(#[from] GridError),

    #[error("invalid [sizing] section: {0}")]
    Sizing(String),
}

/// Full configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridlabConfig {
    pub backtest: EngineConfig,
    pub sizing: SizingConfig,
    pub strategy: StrategyConfig,
    pub grid: GridConfig,
    pub optimize: OptimizeSettings,
}

/// Position sizing policy (serializable enum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizingConfig {
    /// Fixed quote amount per entry.
    FixedNotional {
        amount: f64,
        #[serde(default)]
        decimals: Option<u32>,
    },

    /// Fixed number of units per entry.
    FixedUnits { quantity: f64 },

    /// Fraction of the initial or current balance per entry.
    PercentOfBalance {
        fraction: f64,
        #[serde(default)]
        basis: SizingBasis,
        #[serde(default)]
        decimals: Option<u32>,
    },
}

impl Default for SizingConfig {
    fn default() -> Self {
        SizingConfig::PercentOfBalance {
            fraction: 2.0,
            basis: SizingBasis::Initial,
            decimals: None,
        }
    }
}

impl SizingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (label, value) = match self {
            SizingConfig::FixedNotional { amount, .. } => ("amount", *amount),
            SizingConfig::FixedUnits { quantity } => ("quantity", *quantity),
            SizingConfig::PercentOfBalance { fraction, .. } => ("fraction", *fraction),
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::Sizing(format!(
                "{label} must be finite and > 0, got {value}"
            )));
        }
        Ok(())
    }

    pub fn build(&self) -> Box<dyn Sizer> {
        match *self {
            SizingConfig::FixedNotional { amount, decimals } => {
                let sizer = FixedSizer::notional(amount);
                Box::new(match decimals {
                    Some(d) => sizer.with_precision(d),
                    None => sizer,
                })
            }
            SizingConfig::FixedUnits { quantity } => Box::new(FixedSizer::units(quantity)),
            SizingConfig::PercentOfBalance {
                fraction,
                basis,
                decimals,
            } => {
                let sizer = PercentSizer::new(fraction, basis);
                Box::new(match decimals {
                    Some(d) => sizer.with_precision(d),
                    None => sizer,
                })
            }
        }
    }
}

/// One grid axis: explicit `values`, or a `start`/`end`/`step` range
/// (end exclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl AxisConfig {
    pub fn values(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: Some(values),
            start: None,
            end: None,
            step: None,
        }
    }

    pub fn range(name: impl Into<String>, start: f64, end: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            values: None,
            start: Some(start),
            end: Some(end),
            step: Some(step),
        }
    }

    pub fn to_axis(&self) -> Result<GridAxis, GridError> {
        match (&self.values, self.start, self.end, self.step) {
            (Some(values), None, None, None) => Ok(GridAxis::new(&self.name, values.clone())),
            (None, Some(start), Some(end), step) => {
                GridAxis::range(&self.name, start, end, step.unwrap_or(1.0))
            }
            _ => Err(GridError::InvalidRange {
                axis: self.name.clone(),
                start: self.start.unwrap_or(f64::NAN),
                end: self.end.unwrap_or(f64::NAN),
                step: self.step.unwrap_or(f64::NAN),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default)]
    pub axes: Vec<AxisConfig>,
}

impl Default for GridConfig {
    /// short 5..30 step 5, long 20..100 step 10.
    fn default() -> Self {
        Self {
            axes: vec![
                AxisConfig::range(SHORT_WINDOW, 5.0, 30.0, 5.0),
                AxisConfig::range(LONG_WINDOW, 20.0, 100.0, 10.0),
            ],
        }
    }
}

impl GridConfig {
    pub fn build(&self) -> Result<ParamGrid, GridError> {
        let axes = self
            .axes
            .iter()
            .map(AxisConfig::to_axis)
            .collect::<Result<Vec<_>, _>>()?;
        let grid = ParamGrid { axes };
        grid.validate()?;
        Ok(grid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeSettings {
    pub criterion: SelectionCriterion,
    pub parallel: bool,
    /// Rows shown by presentation code.
    pub top: usize,
}

impl Default for OptimizeSettings {
    fn default() -> Self {
        Self {
            criterion: SelectionCriterion::FinalBalance,
            parallel: true,
            top: 20,
        }
    }
}

impl GridlabConfig {
    /// Load a config from a TOML file and validate it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backtest.validate()?;
        self.sizing.validate()?;
        self.strategy.validate()?;
        self.grid.build()?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        self.backtest
    }

    pub fn build_sizer(&self) -> Box<dyn Sizer> {
        self.sizing.build()
    }

    pub fn factory(&self) -> MaCrossoverFactory {
        MaCrossoverFactory::new(self.strategy.clone())
    }

    pub fn param_grid(&self) -> Result<ParamGrid, GridError> {
        self.grid.build()
    }

    /// Deterministic content hash of the whole config (hex, 16 chars).
    ///
    /// Two configs that serialize identically share a fingerprint, so it
    /// can name artifacts.
    pub fn fingerprint(&self) -> String {
        // Plain data with no maps or custom serializers; serialization cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        let hash = blake3::hash(json.as_bytes());
        hash.to_hex()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlab_core::signals::MaKind;

    const FULL: &str = r#"
[backtest]
initial_balance = 5000.0
fee_rate = 0.001

[sizing]
type = "fixed_notional"
amount = 100.0
decimals = 3

[strategy]
short_window = 5
long_window = 20
ma_kind = "sma"
trend_filter = true
min_distance_pct = 0.002

[[grid.axes]]
name = "short_window"
start = 5
end = 15
step = 5

[[grid.axes]]
name = "long_window"
values = [20, 30]

[optimize]
criterion = "profit_factor"
parallel = false
top = 5
"#;

    #[test]
    fn parses_full_config() {
        let config = GridlabConfig::from_toml(FULL).unwrap();
        assert_eq!(config.backtest.initial_balance, 5000.0);
        assert_eq!(config.strategy.ma_kind, MaKind::Sma);
        assert!(config.strategy.trend_filter);
        assert_eq!(config.optimize.criterion, SelectionCriterion::ProfitFactor);
        assert!(!config.optimize.parallel);

        let grid = config.param_grid().unwrap();
        assert_eq!(grid.axis_names(), vec!["short_window", "long_window"]);
        assert_eq!(grid.axes[0].values, vec![5.0, 10.0]);
        assert_eq!(grid.size(), 4);

        assert_eq!(config.build_sizer().name(), "fixed_notional");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = GridlabConfig::from_toml("").unwrap();
        assert_eq!(config, GridlabConfig::default());
        assert_eq!(config.backtest.fee_rate, 0.0004);
        assert_eq!(config.build_sizer().name(), "percent_of_initial");
        assert_eq!(config.param_grid().unwrap().size(), 5 * 8);
    }

    #[test]
    fn partial_backtest_section_keeps_defaults() {
        let config = GridlabConfig::from_toml("[backtest]\nfee_rate = 0.0").unwrap();
        assert_eq!(config.backtest.initial_balance, 1000.0);
        assert_eq!(config.backtest.fee_rate, 0.0);
    }

    #[test]
    fn unknown_criterion_falls_back() {
        let config = GridlabConfig::from_toml("[optimize]\ncriterion = \"sortino\"").unwrap();
        assert_eq!(config.optimize.criterion, SelectionCriterion::FinalBalance);
    }

    #[test]
    fn rejects_negative_fee() {
        let err = GridlabConfig::from_toml("[backtest]\nfee_rate = -0.1").unwrap_err();
        assert!(matches!(err, ConfigError::Engine(_)));
    }

    #[test]
    fn rejects_zero_notional() {
        let err = GridlabConfig::from_toml("[sizing]\ntype = \"fixed_notional\"\namount = 0.0")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Sizing(_)));
    }

    #[test]
    fn rejects_axis_with_values_and_range() {
        let toml = "[[grid.axes]]\nname = \"short_window\"\nvalues = [1]\nstart = 1\nend = 3";
        let err = GridlabConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Grid(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            GridlabConfig::from_toml("[backtest"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn fingerprint_is_deterministic_and_sensitive() {
        let a = GridlabConfig::default();
        let mut b = GridlabConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);

        b.backtest.fee_rate = 0.001;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
