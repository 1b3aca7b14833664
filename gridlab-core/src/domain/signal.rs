//! Directional signals and the immutable per-bar signal series.

use serde::{Deserialize, Serialize};

use super::position::PositionSide;

/// Directional instruction attached to one bar.
///
/// Signals say what the strategy wants, not what the ledger holds. The engine
/// ignores a signal that matches the side it is already on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    EnterLong,
    EnterShort,
    NoChange,
}

impl Signal {
    /// Map a crossover level (+1 / -1 / 0) to a signal.
    pub fn from_level(level: i8) -> Self {
        match level.signum() {
            1 => Signal::EnterLong,
            -1 => Signal::EnterShort,
            _ => Signal::NoChange,
        }
    }

    pub fn is_directional(&self) -> bool {
        !matches!(self, Signal::NoChange)
    }

    /// Side the signal asks for, or `None` for `NoChange`.
    pub fn target_side(&self) -> Option<PositionSide> {
        match self {
            Signal::EnterLong => Some(PositionSide::Long),
            Signal::EnterShort => Some(PositionSide::Short),
            Signal::NoChange => None,
        }
    }
}

/// Ordered signals aligned 1:1 with a bar sequence.
///
/// Produced once by a strategy and handed to the engine read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSeries {
    signals: Vec<Signal>,
}

impl SignalSeries {
    pub fn new(signals: Vec<Signal>) -> Self {
        Self { signals }
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Signal> {
        self.signals.get(index).copied()
    }

    pub fn as_slice(&self) -> &[Signal] {
        &self.signals
    }

    pub fn iter(&self) -> impl Iterator<Item = Signal> + '_ {
        self.signals.iter().copied()
    }

    /// Number of bars carrying a directional signal.
    pub fn directional_count(&self) -> usize {
        self.signals.iter().filter(|s| s.is_directional()).count()
    }
}

impl From<Vec<Signal>> for SignalSeries {
    fn from(signals: Vec<Signal>) -> Self {
        Self::new(signals)
    }
}

impl FromIterator<Signal> for SignalSeries {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
