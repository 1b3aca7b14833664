//! Position ledger — the single-position state machine of one run.
//!
//! The ledger owns the open position, the realized balance and the trade log.
//! Balance moves only when a position closes; opening records the balance as is.

use tracing::debug;

use crate::domain::{Bar, Position, PositionSide, Signal, TradeKind, TradeRecord};
use crate::engine::error::EngineError;
use crate::engine::state::EngineConfig;
use crate::sizers::{Sizer, SizingBudget};

#[derive(Debug, Clone)]
pub struct PositionLedger {
    position: Position,
    balance: f64,
    initial_balance: f64,
    fee_rate: f64,
    fees_paid: f64,
    trades: Vec<TradeRecord>,
}

impl PositionLedger {
    /// A fresh, flat ledger. Callers validate `config` first.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            position: Position::flat(),
            balance: config.initial_balance,
            initial_balance: config.initial_balance,
            fee_rate: config.fee_rate,
            fees_paid: 0.0,
            trades: Vec::new(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn side(&self) -> PositionSide {
        self.position.side
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn fees_paid(&self) -> f64 {
        self.fees_paid
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// React to one bar's signal at that bar's close.
    ///
    /// - Flat + directional signal → open.
    /// - Opposite side → close, then open the other way at the same price.
    /// - Aligned or `NoChange` → nothing.
    pub fn apply(
        &mut self,
        signal: Signal,
        bar_index: usize,
        bar: &Bar,
        sizer: &dyn Sizer,
    ) -> Result<(), EngineError> {
        let Some(target) = signal.target_side() else {
            return Ok(());
        };
        if self.position.side == target {
            return Ok(());
        }

        if !self.position.is_flat() {
            let exit_kind = match self.position.side {
                PositionSide::Long => TradeKind::Sell,
                _ => TradeKind::Cover,
            };
            self.close(exit_kind, bar_index, bar)?;
        }

        self.open(target, bar_index, bar, sizer)
    }

    /// Force-close any open position with a `CLOSE` record.
    pub fn close_out(&mut self, bar_index: usize, bar: &Bar) -> Result<(), EngineError> {
        if self.position.is_flat() {
            return Ok(());
        }
        self.close(TradeKind::Close, bar_index, bar)
    }

    /// Consume the ledger, returning `(final_balance, fees_paid, trades)`.
    pub fn finish(self) -> (f64, f64, Vec<TradeRecord>) {
        (self.balance, self.fees_paid, self.trades)
    }

    fn open(
        &mut self,
        side: PositionSide,
        bar_index: usize,
        bar: &Bar,
        sizer: &dyn Sizer,
    ) -> Result<(), EngineError> {
        let price = bar.close;
        let budget = SizingBudget {
            balance: self.balance,
            initial_balance: self.initial_balance,
        };
        let size = sizer.size(&budget, price);

        if !size.is_finite() || size < 0.0 {
            return Err(EngineError::invalid(format!(
                "sizer '{}' returned invalid size {size} at bar {bar_index}",
                sizer.name()
            )));
        }
        if size == 0.0 {
            // Sizer declined (depleted budget or rounding to zero): stay flat.
            debug!(bar_index, price, sizer = sizer.name(), "entry skipped, zero size");
            return Ok(());
        }

        self.position = Position {
            side,
            entry_price: price,
            size,
        };
        let kind = match side {
            PositionSide::Long => TradeKind::Buy,
            _ => TradeKind::Short,
        };
        self.record(kind, bar_index, bar, size);
        Ok(())
    }

    /// Realize the open position. State is untouched when the PnL overflows.
    fn close(&mut self, kind: TradeKind, bar_index: usize, bar: &Bar) -> Result<(), EngineError> {
        let price = bar.close;
        let size = self.position.size;
        let fee = self.position.round_trip_fee(price, self.fee_rate);
        let pnl = self.position.gross_pnl(price) - fee;
        let balance = self.balance + pnl;

        if !pnl.is_finite() || !balance.is_finite() {
            return Err(EngineError::invalid(format!(
                "non-finite pnl {pnl} closing at bar {bar_index} (entry {}, exit {price}, size {size})",
                self.position.entry_price
            )));
        }

        self.balance = balance;
        self.fees_paid += fee;
        self.position = Position::flat();
        self.record(kind, bar_index, bar, size);
        Ok(())
    }

    fn record(&mut self, kind: TradeKind, bar_index: usize, bar: &Bar, size: f64) {
        debug_assert!(
            self.position.holds_invariant(),
            "position out of sync with its size: {:?}",
            self.position
        );
        debug!(%kind, bar_index, price = bar.close, size, balance = self.balance, "trade");
        self.trades.push(TradeRecord {
            kind,
            bar_index,
            timestamp: bar.timestamp,
            price: bar.close,
            size,
            balance: self.balance,
        });
    }
}
