//! Exponential Moving Average (EMA), recursive form without bias adjustment.
//!
//! alpha = 2 / (span + 1)
//! EMA[0] = close[0]
//! EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1]
//!
//! Defined from the first bar, so there is no warm-up gap. A NaN close taints
//! every value from that bar on.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    /// Callers guarantee `span >= 1`; the strategy validates windows first.
    pub fn new(span: usize) -> Self {
        Self {
            span: span.max(1),
            name: format!("ema_{span}"),
        }
    }

    pub fn span(&self) -> usize {
        self.span
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.span)
    }
}

/// EMA over an arbitrary series, seeded with its first value.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let mut result = Vec::with_capacity(values.len());
    let Some(&first) = values.first() else {
        return result;
    };

    let alpha = 2.0 / (span.max(1) as f64 + 1.0);
    let mut prev = first;
    result.push(first);

    for &v in &values[1..] {
        // NaN arithmetic propagates on its own once it enters `prev`.
        prev = alpha * v + (1.0 - alpha) * prev;
        result.push(prev);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ema_span_1_equals_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Ema::new(1).compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 2/(3+1) = 0.5, seeded with the first close
        // EMA = 10, 10.5, 11.25, 12.125
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        let result = Ema::new(3).compute(&bars);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
        assert_approx(result[3], 12.125, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_nan_propagates_forward() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        bars[2].close = f64::NAN;
        let result = Ema::new(3).compute(&bars);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
    }

    #[test]
    fn ema_empty_series() {
        assert!(ema_of_series(&[], 5).is_empty());
    }

    #[test]
    fn ema_does_not_look_ahead() {
        let closes = [10.0, 12.0, 9.0, 15.0, 14.0, 20.0];
        let full = ema_of_series(&closes, 4);
        let truncated = ema_of_series(&closes[..3], 4);
        for i in 0..3 {
            assert_approx(full[i], truncated[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn ema_name() {
        assert_eq!(Ema::new(12).name(), "ema_12");
    }
}
