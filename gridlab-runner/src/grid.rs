//! Parameter grid — ordered axes and their Cartesian enumeration.
//!
//! Enumeration follows nested-loop order over the declared axes: the first
//! axis is the outermost loop, the last axis varies fastest. This order
//! decides ties in the optimizer, so it is part of the contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gridlab_core::signals::ParamSet;

pub const SHORT_WINDOW: &str = "short_window";
pub const LONG_WINDOW: &str = "long_window";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("axis '{0}' has no values")]
    EmptyAxis(String),

    #[error("axis '{0}' is declared more than once")]
    DuplicateAxis(String),

    #[error("axis '{axis}' has a non-finite value")]
    NonFiniteValue { axis: String },

    #[error("axis '{axis}': invalid range start={start} end={end} step={step}")]
    InvalidRange {
        axis: String,
        start: f64,
        end: f64,
        step: f64,
    },
}

/// One named axis with its candidate values in declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    pub name: String,
    pub values: Vec<f64>,
}

impl GridAxis {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// `start, start+step, ...` up to but excluding `end`.
    pub fn range(name: impl Into<String>, start: f64, end: f64, step: f64) -> Result<Self, GridError> {
        let name = name.into();
        if !(start.is_finite() && end.is_finite() && step.is_finite()) || step <= 0.0 || end <= start {
            return Err(GridError::InvalidRange {
                axis: name,
                start,
                end,
                step,
            });
        }
        // Index-based stepping avoids accumulating float error.
        let values = (0u64..)
            .map(|i| start + step * i as f64)
            .take_while(|v| *v < end - step * 1e-9)
            .collect();
        Ok(Self { name, values })
    }
}

/// Ordered set of axes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub axes: Vec<GridAxis>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.axes.push(GridAxis::new(name, values));
        self
    }

    /// Two-axis window grid, `short_window` outermost.
    pub fn windows(short: &[usize], long: &[usize]) -> Self {
        Self::new()
            .axis(SHORT_WINDOW, short.iter().map(|&v| v as f64).collect())
            .axis(LONG_WINDOW, long.iter().map(|&v| v as f64).collect())
    }

    pub fn axis_names(&self) -> Vec<&str> {
        self.axes.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn validate(&self) -> Result<(), GridError> {
        for (i, axis) in self.axes.iter().enumerate() {
            if axis.values.is_empty() {
                return Err(GridError::EmptyAxis(axis.name.clone()));
            }
            if axis.values.iter().any(|v| !v.is_finite()) {
                return Err(GridError::NonFiniteValue {
                    axis: axis.name.clone(),
                });
            }
            if self.axes[..i].iter().any(|a| a.name == axis.name) {
                return Err(GridError::DuplicateAxis(axis.name.clone()));
            }
        }
        Ok(())
    }

    /// Size of the full Cartesian product (before the skip rule).
    pub fn size(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.iter().map(|a| a.values.len()).product()
    }

    /// Every combination, in nested-loop order.
    pub fn combinations(&self) -> Vec<ParamSet> {
        let total = self.size();
        let mut out = Vec::with_capacity(total);
        if total == 0 {
            return out;
        }

        let mut cursor = vec![0usize; self.axes.len()];
        loop {
            out.push(ParamSet(
                self.axes
                    .iter()
                    .zip(&cursor)
                    .map(|(axis, &i)| (axis.name.clone(), axis.values[i]))
                    .collect(),
            ));

            // Odometer increment from the last axis.
            let mut k = self.axes.len();
            loop {
                if k == 0 {
                    return out;
                }
                k -= 1;
                cursor[k] += 1;
                if cursor[k] < self.axes[k].values.len() {
                    break;
                }
                cursor[k] = 0;
            }
        }
    }

    /// Combinations that survive the window rule, in enumeration order.
    pub fn valid_combinations(&self) -> Vec<ParamSet> {
        self.combinations()
            .into_iter()
            .filter(|p| !is_skipped(p))
            .collect()
    }
}

/// A combination is skipped when both windows are present and
/// `short_window >= long_window`.
pub fn is_skipped(params: &ParamSet) -> bool {
    match (params.get(SHORT_WINDOW), params.get(LONG_WINDOW)) {
        (Some(short), Some(long)) => short >= long,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_loop_order() {
        let grid = ParamGrid::windows(&[2, 3], &[5, 6, 7]);
        let combos = grid.combinations();
        let pairs: Vec<(f64, f64)> = combos
            .iter()
            .map(|p| (p.get(SHORT_WINDOW).unwrap(), p.get(LONG_WINDOW).unwrap()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (2.0, 5.0),
                (2.0, 6.0),
                (2.0, 7.0),
                (3.0, 5.0),
                (3.0, 6.0),
                (3.0, 7.0)
            ]
        );
        assert_eq!(grid.size(), 6);
    }

    #[test]
    fn three_axes_last_fastest() {
        let grid = ParamGrid::windows(&[2], &[5, 6]).axis("min_distance_pct", vec![0.0, 0.01]);
        let combos = grid.combinations();
        assert_eq!(combos.len(), 4);
        assert_eq!(combos[1].get("min_distance_pct"), Some(0.01));
        assert_eq!(combos[2].get(LONG_WINDOW), Some(6.0));
    }

    #[test]
    fn skip_rule_drops_short_not_below_long() {
        let grid = ParamGrid::windows(&[5, 10, 20], &[10, 20]);
        let valid = grid.valid_combinations();
        assert_eq!(valid.len(), 3);
        assert!(valid.iter().all(|p| !is_skipped(p)));
    }

    #[test]
    fn equal_windows_leave_nothing() {
        let grid = ParamGrid::windows(&[5], &[5]);
        assert!(grid.valid_combinations().is_empty());
    }

    #[test]
    fn skip_rule_needs_both_windows() {
        let params = ParamSet::new().with(SHORT_WINDOW, 50.0);
        assert!(!is_skipped(&params));
    }

    #[test]
    fn empty_grid_has_no_combinations() {
        assert!(ParamGrid::new().combinations().is_empty());
        assert_eq!(ParamGrid::new().size(), 0);
    }

    #[test]
    fn range_excludes_end() {
        let axis = GridAxis::range(SHORT_WINDOW, 5.0, 20.0, 5.0).unwrap();
        assert_eq!(axis.values, vec![5.0, 10.0, 15.0]);
        let axis = GridAxis::range("pct", 0.0, 0.003, 0.001).unwrap();
        assert_eq!(axis.values.len(), 3);
    }

    #[test]
    fn range_rejects_bad_step() {
        assert!(GridAxis::range("x", 1.0, 5.0, 0.0).is_err());
        assert!(GridAxis::range("x", 5.0, 1.0, 1.0).is_err());
        assert!(GridAxis::range("x", 1.0, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn validate_catches_empty_and_duplicate_axes() {
        let grid = ParamGrid::new().axis("a", vec![]);
        assert_eq!(grid.validate(), Err(GridError::EmptyAxis("a".into())));
        let grid = ParamGrid::new().axis("a", vec![1.0]).axis("a", vec![2.0]);
        assert_eq!(grid.validate(), Err(GridError::DuplicateAxis("a".into())));
        let grid = ParamGrid::new().axis("a", vec![f64::NAN]);
        assert!(grid.validate().is_err());
    }
}
