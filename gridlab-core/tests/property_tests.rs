//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Balance conservation: flat prices and no fee leave the balance untouched
//! 2. Fee monotonicity: a higher fee never raises the final balance
//! 3. No dangling position: every run ends flat
//! 4. Position invariant: flat ⇔ zero size, checked on every trade

use chrono::{Duration, TimeZone, Utc};
use gridlab_core::domain::{Bar, PositionSide, Signal, SignalSeries};
use gridlab_core::engine::{run_backtest, EngineConfig};
use gridlab_core::sizers::{FixedSizer, PercentSizer, SizingBasis};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_signal() -> impl Strategy<Value = Signal> {
    prop_oneof![
        Just(Signal::EnterLong),
        Just(Signal::EnterShort),
        Just(Signal::NoChange),
    ]
}

fn arb_closes(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0), len)
}

fn arb_run() -> impl Strategy<Value = (Vec<f64>, Vec<Signal>)> {
    arb_closes(2..60).prop_flat_map(|closes| {
        let n = closes.len();
        (Just(closes), prop::collection::vec(arb_signal(), n))
    })
}

fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::from_close(start + Duration::minutes(15 * i as i64), c))
        .collect()
}

// ── 1. Balance conservation ──────────────────────────────────────────

proptest! {
    /// With a constant price and zero fee, no close can realize PnL.
    #[test]
    fn flat_prices_conserve_balance(
        price in 1.0..1000.0_f64,
        signals in prop::collection::vec(arb_signal(), 2..80),
    ) {
        let bars = make_bars(&vec![price; signals.len()]);
        let series = SignalSeries::new(signals);
        let sizer = PercentSizer::new(1.0, SizingBasis::Current);
        let result = run_backtest(&bars, &series, &EngineConfig::frictionless(1000.0), &sizer)
            .unwrap();
        prop_assert_eq!(result.final_balance, 1000.0);
    }
}

// ── 2. Fee monotonicity ──────────────────────────────────────────────

proptest! {
    /// Raising the fee rate never increases the final balance.
    ///
    /// Sizing does not depend on the realized balance here, so both runs take
    /// identical positions and differ only in fees.
    #[test]
    fn higher_fee_never_helps(
        (closes, signals) in arb_run(),
        low_fee in 0.0..0.01_f64,
        bump in 0.0001..0.01_f64,
    ) {
        let bars = make_bars(&closes);
        let series = SignalSeries::new(signals);
        let sizer = FixedSizer::notional(250.0);

        let cheap = run_backtest(&bars, &series, &EngineConfig::new(1000.0, low_fee), &sizer).unwrap();
        let dear = run_backtest(&bars, &series, &EngineConfig::new(1000.0, low_fee + bump), &sizer).unwrap();

        prop_assert_eq!(cheap.trades.len(), dear.trades.len());
        prop_assert!(dear.final_balance <= cheap.final_balance + 1e-9);
        if cheap.round_trips() > 0 {
            prop_assert!(dear.final_balance < cheap.final_balance);
        }
    }
}

// ── 3. No dangling position ──────────────────────────────────────────

proptest! {
    /// The last record, if any, always leaves the ledger flat, and the
    /// final balance equals that record's balance.
    #[test]
    fn every_run_ends_flat((closes, signals) in arb_run()) {
        let bars = make_bars(&closes);
        let series = SignalSeries::new(signals);
        let sizer = PercentSizer::new(0.5, SizingBasis::Current);
        let result = run_backtest(&bars, &series, &EngineConfig::default(), &sizer).unwrap();

        match result.trades.last() {
            Some(last) => {
                prop_assert_eq!(last.kind.side_after(), PositionSide::Flat);
                prop_assert_eq!(last.balance, result.final_balance);
            }
            None => prop_assert_eq!(result.final_balance, 1000.0),
        }
    }

    /// Entries and exits alternate, and every record carries a positive size.
    #[test]
    fn entries_and_exits_alternate((closes, signals) in arb_run()) {
        let bars = make_bars(&closes);
        let series = SignalSeries::new(signals);
        let result = run_backtest(
            &bars,
            &series,
            &EngineConfig::default(),
            &FixedSizer::units(2.0),
        )
        .unwrap();

        let mut side = PositionSide::Flat;
        for trade in &result.trades {
            prop_assert!(trade.size > 0.0);
            prop_assert_eq!(trade.kind.is_entry(), side.is_flat());
            side = trade.kind.side_after();
        }
        prop_assert!(side.is_flat());
    }
}
