//! Fixed Position Sizer
//!
//! Trade a fixed quantity or a fixed notional amount of quote currency.

use crate::sizers::{round_to, Sizer, SizingBudget};

/// Fixed position sizer
///
/// Two modes:
/// 1. **Fixed Units**: always trade N units of the asset
/// 2. **Fixed Notional**: always trade $X worth (e.g., 100 USDT per trade)
#[derive(Debug, Clone, PartialEq)]
pub enum FixedSizer {
    /// Fixed number of units per trade
    Units { quantity: f64 },

    /// Fixed quote amount per trade, optionally rounded to `decimals`
    Notional { amount: f64, decimals: Option<u32> },
}

impl FixedSizer {
    pub fn units(quantity: f64) -> Self {
        Self::Units { quantity }
    }

    pub fn notional(amount: f64) -> Self {
        Self::Notional {
            amount,
            decimals: None,
        }
    }

    /// Round notional-derived sizes to `decimals` places (exchange lot precision).
    pub fn with_precision(self, decimals: u32) -> Self {
        match self {
            Self::Notional { amount, .. } => Self::Notional {
                amount,
                decimals: Some(decimals),
            },
            units => units,
        }
    }
}

impl Sizer for FixedSizer {
    fn size(&self, _budget: &SizingBudget, price: f64) -> f64 {
        match self {
            Self::Units { quantity } => *quantity,
            Self::Notional { amount, decimals } => {
                if price <= 0.0 {
                    return 0.0;
                }
                round_to(amount / price, *decimals)
            }
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Units { .. } => "fixed_units",
            Self::Notional { .. } => "fixed_notional",
        }
    }
}
