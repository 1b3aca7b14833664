//! Bar-by-bar replay — drives a `PositionLedger` through a signal series.
//!
//! Per run:
//! 1. Validate shape, prices and config (nothing is touched on failure)
//! 2. Replay bars `1..n` at their close (bar 0 only seeds indicators)
//! 3. Force-close any open position at the last close

use tracing::debug;

use crate::domain::{Bar, SignalSeries};
use crate::sizers::Sizer;

use super::error::EngineError;
use super::ledger::PositionLedger;
use super::state::{EngineConfig, RunResult};

/// Run one backtest.
///
/// `bars` and `signals` must be index-aligned. Every close must be finite and
/// positive. The returned result is fully realized: no position is left open.
pub fn run_backtest(
    bars: &[Bar],
    signals: &SignalSeries,
    config: &EngineConfig,
    sizer: &dyn Sizer,
) -> Result<RunResult, EngineError> {
    validate_inputs(bars, signals, config)?;

    let mut ledger = PositionLedger::new(config);
    let mut signal_count = 0;

    for (i, (bar, signal)) in bars.iter().zip(signals.iter()).enumerate().skip(1) {
        if signal.is_directional() {
            signal_count += 1;
        }
        ledger.apply(signal, i, bar, sizer)?;
    }

    let last = bars.len() - 1;
    ledger.close_out(last, &bars[last])?;

    let (final_balance, fees_paid, trades) = ledger.finish();
    debug!(
        bars = bars.len(),
        trades = trades.len(),
        final_balance,
        "backtest complete"
    );

    Ok(RunResult {
        initial_balance: config.initial_balance,
        final_balance,
        trades,
        fees_paid,
        bar_count: bars.len(),
        signal_count,
    })
}

/// Checks performed before any state is created.
///
/// Shape is checked first so that a misaligned pair is always reported as
/// such, even when it is also empty or carries bad prices.
pub fn validate_inputs(
    bars: &[Bar],
    signals: &SignalSeries,
    config: &EngineConfig,
) -> Result<(), EngineError> {
    if bars.len() != signals.len() {
        return Err(EngineError::ShapeMismatch {
            bars: bars.len(),
            signals: signals.len(),
        });
    }
    validate_bars(bars, config)
}

/// Signal-independent checks: at least one bar, tradable closes, sane config.
pub fn validate_bars(bars: &[Bar], config: &EngineConfig) -> Result<(), EngineError> {
    if bars.is_empty() {
        return Err(EngineError::invalid("at least one bar is required"));
    }
    if let Some((i, bar)) = bars
        .iter()
        .enumerate()
        .find(|(_, b)| !b.has_tradable_close())
    {
        return Err(EngineError::invalid(format!(
            "bar {i} has non-tradable close {}",
            bar.close
        )));
    }
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Signal, TradeKind};
    use crate::sizers::FixedSizer;
    use chrono::{Duration, TimeZone, Utc};

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::from_close(start + Duration::hours(i as i64), c))
            .collect()
    }

    fn series(signals: &[Signal]) -> SignalSeries {
        SignalSeries::new(signals.to_vec())
    }

    #[test]
    fn bar_zero_never_trades() {
        use Signal::*;
        let b = bars(&[10.0, 11.0]);
        let s = series(&[EnterLong, NoChange]);
        let result =
            run_backtest(&b, &s, &EngineConfig::frictionless(1000.0), &FixedSizer::units(1.0))
                .unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.final_balance, 1000.0);
        assert_eq!(result.signal_count, 0);
    }

    #[test]
    fn open_position_is_closed_at_last_bar() {
        use Signal::*;
        let b = bars(&[10.0, 11.0, 12.0, 15.0]);
        let s = series(&[NoChange, EnterLong, NoChange, NoChange]);
        let result =
            run_backtest(&b, &s, &EngineConfig::frictionless(1000.0), &FixedSizer::units(1.0))
                .unwrap();

        let kinds: Vec<TradeKind> = result.trades.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TradeKind::Buy, TradeKind::Close]);
        assert_eq!(result.trades[1].bar_index, 3);
        assert_eq!(result.final_balance, 1004.0);
    }

    #[test]
    fn single_bar_run_is_flat() {
        let b = bars(&[10.0]);
        let s = series(&[Signal::EnterLong]);
        let result =
            run_backtest(&b, &s, &EngineConfig::default(), &FixedSizer::units(1.0)).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.final_balance, result.initial_balance);
    }

    #[test]
    fn length_mismatch_reported_before_prices() {
        let mut b = bars(&[10.0, f64::NAN, 12.0]);
        b[0].close = -1.0;
        let s = series(&[Signal::NoChange; 2]);
        let err = run_backtest(&b, &s, &EngineConfig::default(), &FixedSizer::units(1.0))
            .unwrap_err();
        assert_eq!(err, EngineError::ShapeMismatch { bars: 3, signals: 2 });
    }

    #[test]
    fn empty_input_is_invalid() {
        let err = run_backtest(
            &[],
            &SignalSeries::default(),
            &EngineConfig::default(),
            &FixedSizer::units(1.0),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn bad_config_is_invalid() {
        let b = bars(&[10.0, 11.0]);
        let s = series(&[Signal::NoChange; 2]);
        let err = run_backtest(&b, &s, &EngineConfig::new(0.0, 0.0), &FixedSizer::units(1.0))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}
