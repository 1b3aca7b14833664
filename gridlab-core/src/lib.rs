//! GridLab Core — domain types, position ledger, backtest engine, crossover strategy.
//!
//! This crate contains the single-instrument backtester:
//! - Domain types (bars, signals, positions, trade records)
//! - Position ledger state machine (flat / long / short, close-fill only)
//! - Bar replay engine with end-of-run closeout
//! - Moving-average indicators and the crossover signal generator
//! - Position sizers (fixed and percent-of-balance)

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod signals;
pub mod sizers;
