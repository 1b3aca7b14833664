//! GridLab Runner — optimization, metrics, configuration and exports.
//!
//! This crate builds on `gridlab-core` to provide:
//! - Risk metrics over a run's balance trajectory
//! - Selection criteria and the grid-search optimizer
//! - TOML configuration with a deterministic fingerprint
//! - CSV bar loading and a seeded synthetic generator
//! - Single-run reports and JSON / CSV / JSONL exports

pub mod config;
pub mod criterion;
pub mod data_loader;
pub mod export;
pub mod grid;
pub mod metrics;
pub mod optimizer;
pub mod runner;

pub use config::{
    AxisConfig, ConfigError, GridConfig, GridlabConfig, OptimizeSettings, SizingConfig,
};
pub use criterion::SelectionCriterion;
pub use data_loader::{load_csv, read_csv, synthetic_bars, LoadError, LoadedBars};
pub use grid::{is_skipped, GridAxis, GridError, ParamGrid, LONG_WINDOW, SHORT_WINDOW};
pub use metrics::RiskMetrics;
pub use optimizer::{BestResult, OptimizationReport, OptimizeError, Optimizer, RunRow};
pub use runner::{run_from_config, run_strategy, BacktestReport, RunError, SCHEMA_VERSION};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn risk_metrics_is_send_sync() {
        assert_send::<RiskMetrics>();
        assert_sync::<RiskMetrics>();
    }

    #[test]
    fn optimizer_is_send_sync() {
        assert_send::<Optimizer>();
        assert_sync::<Optimizer>();
    }

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<OptimizationReport>();
        assert_sync::<OptimizationReport>();
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<GridlabConfig>();
        assert_sync::<GridlabConfig>();
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
    }
}
