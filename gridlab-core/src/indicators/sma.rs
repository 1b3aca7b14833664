//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a window.
//! The first `period - 1` values are NaN.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    /// Callers guarantee `period >= 1`; the strategy validates windows first.
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        let mut sum: f64 = bars.iter().take(self.period).map(|b| b.close).sum();
        result[self.period - 1] = sum / self.period as f64;

        for i in self.period..n {
            let leaving = bars[i - self.period].close;
            let entering = bars[i].close;

            if leaving.is_nan() || !sum.is_finite() {
                // A NaN poisons the running sum; rescan the window instead.
                sum = bars[(i + 1 - self.period)..=i].iter().map(|b| b.close).sum();
            } else {
                sum = sum - leaving + entering;
            }
            result[i] = sum / self.period as f64;
        }

        result
    }
}
