//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for the traded instrument over one interval.
///
/// Only `close` drives the engine. The other fields are carried through for
/// downstream reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A bar whose OHLC all equal `close`. Handy when only closes are known.
    pub fn from_close(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self::new(timestamp, close, close, close, close, 0.0)
    }

    /// True if the close is usable as a fill price (finite and > 0).
    pub fn has_tradable_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }

    /// Basic OHLC sanity check: high >= low and the body sits inside the range.
    pub fn is_sane(&self) -> bool {
        if !self.has_tradable_close() || !self.open.is_finite() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}
