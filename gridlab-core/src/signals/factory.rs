//! Strategy factory — builds a fresh generator per parameter combination.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ma_crossover::{MaCrossover, StrategyConfig};
use super::{SignalGenerator, StrategyError};

/// One grid point: named parameter values in axis order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet(pub Vec<(String, f64)>);

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.0.push((name.into(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    /// Integer parameter. Rejects negative, fractional or non-finite values.
    pub fn get_usize(&self, name: &str) -> Result<Option<usize>, StrategyError> {
        match self.get(name) {
            None => Ok(None),
            Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as usize)),
            Some(v) => Err(StrategyError::InvalidParams(format!(
                "'{name}' must be a non-negative integer, got {v}"
            ))),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Builds an independent generator for each grid point.
pub trait StrategyFactory: Send + Sync {
    fn build(&self, params: &ParamSet) -> Result<Box<dyn SignalGenerator>, StrategyError>;
}

/// Factory for `MaCrossover` over a base config.
///
/// Recognized parameters: `short_window`, `long_window`, `min_distance_pct`.
/// Anything else is ignored; absent parameters keep the base value.
#[derive(Debug, Clone, Default)]
pub struct MaCrossoverFactory {
    base: StrategyConfig,
}

impl MaCrossoverFactory {
    pub fn new(base: StrategyConfig) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &StrategyConfig {
        &self.base
    }

    pub fn config_for(&self, params: &ParamSet) -> Result<StrategyConfig, StrategyError> {
        let mut config = self.base.clone();
        if let Some(short) = params.get_usize("short_window")? {
            config.short_window = short;
        }
        if let Some(long) = params.get_usize("long_window")? {
            config.long_window = long;
        }
        if let Some(pct) = params.get("min_distance_pct") {
            config.min_distance_pct = Some(pct);
        }
        Ok(config)
    }
}

impl StrategyFactory for MaCrossoverFactory {
    fn build(&self, params: &ParamSet) -> Result<Box<dyn SignalGenerator>, StrategyError> {
        let config = self.config_for(params)?;
        Ok(Box::new(MaCrossover::new(config)?))
    }
}
