//! GridLab CLI — single backtests and grid-search optimization.
//!
//! Commands:
//! - `backtest` — run the crossover once and print balance, drawdown and profit factor
//! - `optimize` — sweep the parameter grid and print the best point and a top-N table
//!
//! Bars come from a CSV file (`--data`) or a seeded random walk (`--synthetic N`).
//! Logging goes through `tracing`; set `RUST_LOG` or pass `--verbose`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use gridlab_core::domain::Bar;
use gridlab_runner::export::{
    append_trades_jsonl, format_ratio, optimization_to_json, report_to_json, results_to_csv,
    trades_to_csv, write_file,
};
use gridlab_runner::{
    load_csv, run_from_config, synthetic_bars, BacktestReport, GridlabConfig,
    OptimizationReport, Optimizer, SelectionCriterion,
};

#[derive(Parser)]
#[command(
    name = "gridlab",
    about = "GridLab CLI — moving-average crossover backtests and grid search"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct DataSource {
    /// CSV file with timestamp,open,high,low,close,volume columns.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Generate this many synthetic hourly bars instead of loading a file.
    #[arg(long)]
    synthetic: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backtest.
    Backtest {
        #[command(flatten)]
        source: DataSource,

        /// Label seeding the synthetic generator.
        #[arg(long, default_value = "BTCUSDT")]
        label: String,

        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Short window (requires --long).
        #[arg(long, requires = "long")]
        short: Option<usize>,

        /// Long window (requires --short).
        #[arg(long, requires = "short")]
        long: Option<usize>,

        /// Write the trade log as CSV.
        #[arg(long)]
        trades_out: Option<PathBuf>,

        /// Append the trade log to a JSON-lines file.
        #[arg(long)]
        trades_jsonl: Option<PathBuf>,

        /// Write the full report as JSON.
        #[arg(long)]
        report_out: Option<PathBuf>,
    },
    /// Sweep the parameter grid and select the best point.
    Optimize {
        #[command(flatten)]
        source: DataSource,

        /// Label seeding the synthetic generator.
        #[arg(long, default_value = "BTCUSDT")]
        label: String,

        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// final_balance, max_drawdown or profit_factor.
        #[arg(long)]
        criterion: Option<String>,

        /// Evaluate grid points on a single thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Write the results table as CSV, ranked by the criterion.
        #[arg(long)]
        results_out: Option<PathBuf>,

        /// Write the full optimization report as JSON.
        #[arg(long)]
        report_out: Option<PathBuf>,

        /// Rows to print. Defaults to the config's `optimize.top`.
        #[arg(long)]
        top: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Backtest {
            source,
            label,
            config,
            short,
            long,
            trades_out,
            trades_jsonl,
            report_out,
        } => {
            let config = load_config(config.as_deref())?;
            let bars = load_bars(&source, &label)?;
            let windows = short.zip(long);
            let report = run_from_config(&bars, &config, windows)
                .context("backtest failed")?;

            print_summary(&report);

            if let Some(path) = trades_out {
                write_file(&path, &trades_to_csv(&report.trades)?)?;
                println!("Trades written to: {}", path.display());
            }
            if let Some(path) = trades_jsonl {
                let n = append_trades_jsonl(&path, &report.trades)?;
                println!("Appended {n} trades to: {}", path.display());
            }
            if let Some(path) = report_out {
                write_file(&path, &report_to_json(&report)?)?;
                println!("Report written to: {}", path.display());
            }
            Ok(())
        }
        Commands::Optimize {
            source,
            label,
            config,
            criterion,
            sequential,
            results_out,
            report_out,
            top,
        } => {
            let config = load_config(config.as_deref())?;
            let bars = load_bars(&source, &label)?;
            let criterion = criterion
                .as_deref()
                .map(SelectionCriterion::from_name)
                .unwrap_or(config.optimize.criterion);
            let parallel = config.optimize.parallel && !sequential;
            let grid = config.param_grid()?;

            info!(
                fingerprint = %config.fingerprint(),
                grid_size = grid.size(),
                "optimizing"
            );
            let report = Optimizer::new(config.engine_config(), config.build_sizer())
                .with_criterion(criterion)
                .with_parallelism(parallel)
                .optimize(&bars, &config.factory(), &grid)
                .context("optimization failed")?;

            print_optimization(&report, top.unwrap_or(config.optimize.top));

            if let Some(path) = results_out {
                write_file(&path, &results_to_csv(&report, Some(criterion))?)?;
                println!("Results written to: {}", path.display());
            }
            if let Some(path) = report_out {
                write_file(&path, &optimization_to_json(&report)?)?;
                println!("Report written to: {}", path.display());
            }
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "gridlab=debug" } else { "gridlab=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<GridlabConfig> {
    match path {
        Some(path) => GridlabConfig::from_file(path)
            .with_context(|| format!("invalid config {}", path.display())),
        None => Ok(GridlabConfig::default()),
    }
}

fn load_bars(source: &DataSource, label: &str) -> Result<Vec<Bar>> {
    match (&source.data, source.synthetic) {
        (Some(path), _) => {
            let loaded = load_csv(path)?;
            info!(
                bars = loaded.bars.len(),
                skipped = loaded.skipped,
                hash = %&loaded.dataset_hash[..16],
                "loaded {}",
                path.display()
            );
            Ok(loaded.bars)
        }
        (None, Some(0)) => bail!("--synthetic needs at least one bar"),
        (None, Some(n)) => {
            info!(bars = n, label, "generating synthetic bars");
            Ok(synthetic_bars(label, n))
        }
        (None, None) => bail!("one of --data or --synthetic is required"),
    }
}

fn print_summary(report: &BacktestReport) {
    let m = &report.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Strategy:       {}", report.strategy);
    println!("Sizer:          {}", report.sizer);
    if let (Some(start), Some(end)) = (&report.start, &report.end) {
        println!("Period:         {start} to {end}");
    }
    println!("Bars:           {}", report.bar_count);
    println!("Signals:        {}", report.signal_count);
    println!("Trades:         {}", m.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Initial:        {:.2}", report.initial_balance);
    println!("Final Balance:  {:.2}", m.final_balance);
    println!("Total Return:   {:.2}%", m.total_return * 100.0);
    println!("Max Drawdown:   {:.2}", m.max_drawdown);
    println!("Profit Factor:  {}", format_ratio(m.profit_factor));
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Fees Paid:      {:.4}", report.fees_paid);
    println!();
}

fn print_optimization(report: &OptimizationReport, top: usize) {
    println!();
    println!("=== Optimization Result ===");
    println!("Criterion:      {}", report.criterion);
    println!(
        "Grid points:    {} evaluated, {} skipped, {} failed",
        report.rows.len(),
        report.skipped,
        report.failed
    );
    println!("Best params:    {}", report.best_params());
    println!("Best score:     {}", format_ratio(report.best_score()));
    println!();

    let rows = report.top_n(top);
    if rows.is_empty() {
        return;
    }
    println!("--- Top {} ---", rows.len());
    let mut header = String::from(" #  ");
    for axis in &report.axes {
        header.push_str(&format!("{axis:>14}"));
    }
    header.push_str(&format!(
        "{:>14}{:>14}{:>14}{:>14}",
        "final_balance", "max_drawdown", "profit_factor", "score"
    ));
    println!("{header}");

    for (rank, row) in rows.iter().enumerate() {
        let mut line = format!("{:>2}  ", rank + 1);
        for axis in &report.axes {
            let value = row.params.get(axis).map(|v| v.to_string()).unwrap_or_default();
            line.push_str(&format!("{value:>14}"));
        }
        if let Some(m) = &row.metrics {
            line.push_str(&format!(
                "{:>14.2}{:>14.2}{:>14}",
                m.final_balance,
                m.max_drawdown,
                trim_ratio(m.profit_factor)
            ));
        }
        let score = row.score.map(trim_ratio).unwrap_or_default();
        line.push_str(&format!("{score:>14}"));
        println!("{line}");
    }
    println!();
}

/// Two decimals for finite values, `inf` otherwise.
fn trim_ratio(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}")
    } else {
        format_ratio(value)
    }
}
