//! Moving-average indicators used by the crossover strategy.
//!
//! Indicators are pure functions: bar history in, one value per bar out.
//! They are computed once per strategy instance before signals are derived.

pub mod ema;
pub mod sma;

pub use ema::Ema;
pub use sma::Sma;

use crate::domain::Bar;

/// Trait for indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as `bars`. Bars without
/// enough history yield `f64::NAN`.
///
/// No value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_12", "sma_50").
    fn name(&self) -> &str;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create bars from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::TimeZone;
    let start = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                start + chrono::Duration::hours(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
