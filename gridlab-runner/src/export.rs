//! Export — JSON, CSV and JSON-lines artifacts.
//!
//! - **JSON**: a single-run `BacktestReport` (schema versioned) and the full
//!   `OptimizationReport`
//! - **CSV**: the trade log and the optimization results table
//! - **JSONL**: append-only trade log, one record per line
//!
//! Non-finite ratios are written as `inf` / `-inf` / `nan` in CSV, matching
//! the JSON encoding.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use gridlab_core::domain::TradeRecord;

use crate::criterion::SelectionCriterion;
use crate::optimizer::{OptimizationReport, RunRow};
use crate::runner::{BacktestReport, SCHEMA_VERSION};

// ─── JSON ───────────────────────────────────────────────────────────

pub fn report_to_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a `BacktestReport`, rejecting newer schema versions.
pub fn report_from_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

pub fn optimization_to_json(report: &OptimizationReport) -> Result<String> {
    serde_json::to_string_pretty(report)
        .context("failed to serialize OptimizationReport to JSON")
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Trade log as CSV: `type,bar_index,timestamp,price,size,balance`.
pub fn trades_to_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["type", "bar_index", "timestamp", "price", "size", "balance"])?;
    for t in trades {
        wtr.write_record([
            t.kind.as_str(),
            &t.bar_index.to_string(),
            &t.timestamp.to_rfc3339(),
            &t.price.to_string(),
            &t.size.to_string(),
            &format!("{:.6}", t.balance),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Results table as CSV.
///
/// One column per grid axis, then `final_balance, max_drawdown,
/// profit_factor, score, error`. With `sort_by` the successful rows come
/// first, ranked descending by that criterion, followed by failed rows in
/// grid order. Without it, rows stay in grid order.
pub fn results_to_csv(
    report: &OptimizationReport,
    sort_by: Option<SelectionCriterion>,
) -> Result<String> {
    let rows: Vec<&RunRow> = match sort_by {
        Some(criterion) => {
            let mut rows = report.ranked_by(criterion);
            rows.extend(report.rows.iter().filter(|r| !r.is_success()));
            rows
        }
        None => report.rows.iter().collect(),
    };

    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header: Vec<&str> = report.axes.iter().map(String::as_str).collect();
    header.extend(["final_balance", "max_drawdown", "profit_factor", "score", "error"]);
    wtr.write_record(&header)?;

    for row in rows {
        let mut record: Vec<String> = report
            .axes
            .iter()
            .map(|axis| row.params.get(axis).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        match &row.metrics {
            Some(m) => {
                record.push(format!("{:.6}", m.final_balance));
                record.push(format!("{:.6}", m.max_drawdown));
                record.push(format_ratio(m.profit_factor));
            }
            None => record.extend([String::new(), String::new(), String::new()]),
        }
        record.push(row.score.map(format_ratio).unwrap_or_default());
        record.push(row.error.clone().unwrap_or_default());
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Finite values print as-is; the rest as `inf`, `-inf` or `nan`.
pub fn format_ratio(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:.6}")
    }
}

// ─── JSONL trade log ────────────────────────────────────────────────

/// Append trades to a JSONL file, creating it if needed. Returns the
/// number of lines written.
pub fn append_trades_jsonl(path: &Path, trades: &[TradeRecord]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    for trade in trades {
        let line = serde_json::to_string(trade).context("failed to serialize trade record")?;
        writeln!(file, "{line}")?;
    }
    Ok(trades.len())
}

/// Read every trade from a JSONL file. Blank lines are ignored.
pub fn read_trades_jsonl(path: &Path) -> Result<Vec<TradeRecord>> {
    let file = fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut trades = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let trade = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed trade record", path.display(), i + 1))?;
        trades.push(trade);
    }
    Ok(trades)
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gridlab_core::domain::TradeKind;

    fn trade(kind: TradeKind, bar_index: usize, balance: f64) -> TradeRecord {
        TradeRecord {
            kind,
            bar_index,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, bar_index as u32, 0, 0).unwrap(),
            price: 11.0,
            size: 0.5,
            balance,
        }
    }

    #[test]
    fn trades_csv_has_header_and_rows() {
        let csv = trades_to_csv(&[
            trade(TradeKind::Buy, 1, 1000.0),
            trade(TradeKind::Close, 5, 1012.5),
        ])
        .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "type,bar_index,timestamp,price,size,balance");
        assert!(lines[1].starts_with("BUY,1,"));
        assert!(lines[2].ends_with(",1012.500000"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn ratio_formatting() {
        assert_eq!(format_ratio(f64::INFINITY), "inf");
        assert_eq!(format_ratio(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_ratio(f64::NAN), "nan");
        assert_eq!(format_ratio(1.5), "1.500000");
    }

    #[test]
    fn jsonl_appends_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("trades.jsonl");

        append_trades_jsonl(&path, &[trade(TradeKind::Buy, 1, 1000.0)]).unwrap();
        append_trades_jsonl(
            &path,
            &[
                trade(TradeKind::Sell, 2, 1010.0),
                trade(TradeKind::Short, 2, 1010.0),
            ],
        )
        .unwrap();

        let back = read_trades_jsonl(&path).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back[1].kind, TradeKind::Sell);
        assert_eq!(back[2].balance, 1010.0);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.lines().next().unwrap().contains(r#""type":"BUY""#));
    }

    #[test]
    fn rejects_future_schema() {
        let json = r#"{"schema_version": 99, "strategy": "x", "sizer": "y",
            "metrics": {"final_balance": 1.0, "total_return": 0.0, "max_drawdown": 0.0,
                        "max_drawdown_pct": 0.0, "profit_factor": "inf", "win_rate": 0.0,
                        "trade_count": 0, "round_trips": 0},
            "trades": [], "initial_balance": 1.0, "fees_paid": 0.0,
            "bar_count": 1, "signal_count": 0, "start": null, "end": null}"#;
        let err = report_from_json(json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b.csv");
        write_file(&path, "x\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "x\n");
    }
}
