use serde::{Deserialize, Serialize};

/// Direction of the open exposure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    #[default]
    Flat,
    Long,
    Short,
}

impl PositionSide {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionSide::Flat)
    }

    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(&self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
            PositionSide::Flat => 0.0,
        }
    }
}

/// The single open position of a run.
///
/// Invariant: `side == Flat` exactly when `size == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub entry_price: f64,
    pub size: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.side.is_flat()
    }

    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    /// Price PnL of closing at `exit_price`, before fees.
    pub fn gross_pnl(&self, exit_price: f64) -> f64 {
        self.side.sign() * (exit_price - self.entry_price) * self.size
    }

    /// Fee owed on the round trip: `fee_rate` applied to entry and exit notional.
    pub fn round_trip_fee(&self, exit_price: f64, fee_rate: f64) -> f64 {
        fee_rate * self.size * (self.entry_price + exit_price)
    }

    /// Realized PnL of closing at `exit_price` net of the round-trip fee.
    pub fn net_pnl(&self, exit_price: f64, fee_rate: f64) -> f64 {
        self.gross_pnl(exit_price) - self.round_trip_fee(exit_price, fee_rate)
    }

    pub fn holds_invariant(&self) -> bool {
        match self.side {
            PositionSide::Flat => self.size == 0.0,
            _ => self.size > 0.0,
        }
    }
}
