//! Percent-of-balance Position Sizer
//!
//! Allocates `fraction` of a balance to each entry. Fractions above 1.0 are
//! allowed and express leverage (2.0 = twice the balance in notional).

use serde::{Deserialize, Serialize};

use crate::sizers::{round_to, Sizer, SizingBudget};

/// Which balance the fraction applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingBasis {
    /// The run's starting balance; size does not compound.
    #[default]
    Initial,
    /// The realized balance at entry; size compounds with results.
    Current,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PercentSizer {
    fraction: f64,
    basis: SizingBasis,
    decimals: Option<u32>,
}

impl PercentSizer {
    pub fn new(fraction: f64, basis: SizingBasis) -> Self {
        Self {
            fraction,
            basis,
            decimals: None,
        }
    }

    pub fn with_precision(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn basis(&self) -> SizingBasis {
        self.basis
    }
}

impl Sizer for PercentSizer {
    fn size(&self, budget: &SizingBudget, price: f64) -> f64 {
        if price <= 0.0 {
            return 0.0;
        }
        let base = match self.basis {
            SizingBasis::Initial => budget.initial_balance,
            SizingBasis::Current => budget.balance,
        };
        if base <= 0.0 {
            return 0.0;
        }
        round_to(base * self.fraction / price, self.decimals)
    }

    fn name(&self) -> &str {
        match self.basis {
            SizingBasis::Initial => "percent_of_initial",
            SizingBasis::Current => "percent_of_balance",
        }
    }
}
