//! Position Sizers — determine trade quantity
//!
//! Sizers translate a cash budget into a quantity of the traded asset.
//! They are pure: the engine hands them the balances and the fill price,
//! they never see signals or the ledger itself.

pub mod fixed;
pub mod percent;

pub use fixed::FixedSizer;
pub use percent::{PercentSizer, SizingBasis};

use serde::{Deserialize, Serialize};

/// Balances available to a sizer when a position is opened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingBudget {
    /// Realized balance at the moment of entry.
    pub balance: f64,
    /// Balance the run started with.
    pub initial_balance: f64,
}

/// Position sizing policy
///
/// # Responsibilities
/// - Convert budget + fill price → quantity
///
/// # Non-Responsibilities
/// - Sizers do NOT decide entry/exit (that's the signal's job)
/// - Sizers do NOT validate the result; the engine rejects non-positive sizes
pub trait Sizer: Send + Sync {
    /// Quantity to open at `price`.
    fn size(&self, budget: &SizingBudget, price: f64) -> f64;

    /// Sizer name for reports/logging
    fn name(&self) -> &str;
}

/// Round `value` to `decimals` places. `None` leaves it untouched.
pub(crate) fn round_to(value: f64, decimals: Option<u32>) -> f64 {
    match decimals {
        Some(d) => {
            let factor = 10f64.powi(d as i32);
            (value * factor).round() / factor
        }
        None => value,
    }
}
