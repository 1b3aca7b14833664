//! Domain types for GridLab

pub mod bar;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use position::{Position, PositionSide};
pub use signal::{Signal, SignalSeries};
pub use trade::{TradeKind, TradeRecord};
