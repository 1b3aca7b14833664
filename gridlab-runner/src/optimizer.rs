//! Grid-search optimizer.
//!
//! For every valid grid point:
//! 1. Build a fresh strategy from the factory
//! 2. Generate signals and replay them on a fresh ledger
//! 3. Compute risk metrics and score them with the selection criterion
//!
//! Grid points are independent and may run on the rayon pool. Rows are
//! collected in enumeration order and the best is picked by a sequential
//! fold afterwards, so parallel and sequential sweeps agree exactly.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use gridlab_core::domain::Bar;
use gridlab_core::engine::{validate_bars, EngineConfig, EngineError};
use gridlab_core::signals::{ParamSet, StrategyFactory};
use gridlab_core::sizers::Sizer;

use crate::criterion::SelectionCriterion;
use crate::grid::{GridError, ParamGrid};
use crate::metrics::{self, RiskMetrics};
use crate::runner::{run_strategy, RunError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    #[error("no valid parameter combination (short_window must be < long_window)")]
    EmptyGrid,

    #[error("invalid grid: {0}")]
    InvalidGrid(#[from] GridError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("all {attempted} grid points failed")]
    NoSuccessfulRuns { attempted: usize },
}

impl From<EngineError> for OptimizeError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(msg) => OptimizeError::InvalidInput(msg),
            other => OptimizeError::InvalidInput(other.to_string()),
        }
    }
}

/// One evaluated grid point.
///
/// Exactly one of `metrics` / `error` is set. Failed rows carry no score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRow {
    /// Position among the evaluated (non-skipped) grid points.
    pub index: usize,
    pub params: ParamSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RiskMetrics>,
    #[serde(
        default,
        with = "optional_unbounded",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRow {
    fn success(index: usize, params: ParamSet, metrics: RiskMetrics, score: f64) -> Self {
        Self {
            index,
            params,
            metrics: Some(metrics),
            score: Some(score),
            error: None,
        }
    }

    fn failure(index: usize, params: ParamSet, err: &RunError) -> Self {
        Self {
            index,
            params,
            metrics: None,
            score: None,
            error: Some(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.score.is_some()
    }
}

/// The winning grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestResult {
    pub index: usize,
    pub params: ParamSet,
    #[serde(with = "metrics::unbounded")]
    pub score: f64,
    pub metrics: RiskMetrics,
}

/// Outcome of a full sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub criterion: SelectionCriterion,
    pub axes: Vec<String>,
    /// Every evaluated row in grid order.
    pub rows: Vec<RunRow>,
    pub best: BestResult,
    /// Grid points dropped by the window rule.
    pub skipped: usize,
    pub failed: usize,
}

impl OptimizationReport {
    pub fn best_params(&self) -> &ParamSet {
        &self.best.params
    }

    pub fn best_score(&self) -> f64 {
        self.best.score
    }

    /// Successful rows, best first. Ties keep grid order.
    pub fn top_n(&self, n: usize) -> Vec<&RunRow> {
        self.ranked_by(self.criterion).into_iter().take(n).collect()
    }

    /// Successful rows ordered by another criterion, descending.
    pub fn ranked_by(&self, criterion: SelectionCriterion) -> Vec<&RunRow> {
        let mut ranked: Vec<(f64, &RunRow)> = self
            .rows
            .iter()
            .filter_map(|row| row.metrics.as_ref().map(|m| (criterion.score(m), row)))
            .collect();
        // Stable sort; NaN sinks to the end.
        ranked.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or_else(|| a.0.is_nan().cmp(&b.0.is_nan()))
        });
        ranked.into_iter().map(|(_, row)| row).collect()
    }
}

/// Grid-search optimizer over a shared bar series.
pub struct Optimizer {
    engine: EngineConfig,
    sizer: Box<dyn Sizer>,
    criterion: SelectionCriterion,
    parallel: bool,
}

impl Optimizer {
    pub fn new(engine: EngineConfig, sizer: Box<dyn Sizer>) -> Self {
        Self {
            engine,
            sizer,
            criterion: SelectionCriterion::default(),
            parallel: true,
        }
    }

    pub fn with_criterion(mut self, criterion: SelectionCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn criterion(&self) -> SelectionCriterion {
        self.criterion
    }

    /// Evaluate every valid grid point and pick the best.
    pub fn optimize(
        &self,
        bars: &[Bar],
        factory: &dyn StrategyFactory,
        grid: &ParamGrid,
    ) -> Result<OptimizationReport, OptimizeError> {
        self.optimize_with_progress(bars, factory, grid, |_, _, _| {})
    }

    /// Like [`optimize`](Self::optimize), invoking `progress(done_index,
    /// total, row)` as each grid point finishes. Under the parallel pool the
    /// callback fires in completion order.
    pub fn optimize_with_progress<F>(
        &self,
        bars: &[Bar],
        factory: &dyn StrategyFactory,
        grid: &ParamGrid,
        progress: F,
    ) -> Result<OptimizationReport, OptimizeError>
    where
        F: Fn(usize, usize, &RunRow) + Send + Sync,
    {
        // ── 1. Shared inputs, once ──
        validate_bars(bars, &self.engine)?;
        grid.validate()?;

        // ── 2. Enumerate and apply the window rule ──
        let all = grid.combinations();
        let combos = grid.valid_combinations();
        let skipped = all.len() - combos.len();
        if combos.is_empty() {
            return Err(OptimizeError::EmptyGrid);
        }
        let total = combos.len();
        info!(
            criterion = %self.criterion,
            points = total,
            skipped,
            parallel = self.parallel,
            "starting grid search"
        );

        // ── 3. Evaluate ──
        let evaluate = |(index, params): (usize, &ParamSet)| {
            let row = self.evaluate(index, params, bars, factory);
            progress(index, total, &row);
            row
        };
        let rows: Vec<RunRow> = if self.parallel {
            combos.par_iter().enumerate().map(evaluate).collect()
        } else {
            combos.iter().enumerate().map(evaluate).collect()
        };

        // ── 4. Sequential reduce in grid order ──
        let failed = rows.iter().filter(|r| !r.is_success()).count();
        let best = select_best(&rows).ok_or(OptimizeError::NoSuccessfulRuns { attempted: total })?;

        info!(
            best = %best.params,
            score = best.score,
            failed,
            "grid search finished"
        );

        Ok(OptimizationReport {
            criterion: self.criterion,
            axes: grid.axis_names().into_iter().map(String::from).collect(),
            rows,
            best,
            skipped,
            failed,
        })
    }

    fn evaluate(
        &self,
        index: usize,
        params: &ParamSet,
        bars: &[Bar],
        factory: &dyn StrategyFactory,
    ) -> RunRow {
        let outcome = factory
            .build(params)
            .map_err(RunError::from)
            .and_then(|strategy| {
                run_strategy(bars, strategy.as_ref(), &self.engine, self.sizer.as_ref())
            });

        match outcome {
            Ok(report) => {
                let score = self.criterion.score(&report.metrics);
                debug!(
                    index,
                    params = %params,
                    score,
                    trades = report.metrics.trade_count,
                    "grid point evaluated"
                );
                RunRow::success(index, params.clone(), report.metrics, score)
            }
            Err(err) => {
                warn!(index, params = %params, error = %err, "grid point failed");
                RunRow::failure(index, params.clone(), &err)
            }
        }
    }
}

/// Running best over rows in grid order, starting from `-inf`. A row replaces
/// it only on a strictly greater score, so ties keep the earlier point and a
/// NaN score never wins.
fn select_best(rows: &[RunRow]) -> Option<BestResult> {
    let mut best: Option<BestResult> = None;
    let mut best_score = f64::NEG_INFINITY;
    for row in rows {
        let (Some(score), Some(metrics)) = (row.score, row.metrics.as_ref()) else {
            continue;
        };
        if SelectionCriterion::is_better(score, best_score) {
            best_score = score;
            best = Some(BestResult {
                index: row.index,
                params: row.params.clone(),
                score,
                metrics: metrics.clone(),
            });
        }
    }
    best
}

/// `Option<f64>` through [`metrics::unbounded`].
mod optional_unbounded {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Wrapped(#[serde(with = "crate::metrics::unbounded")] f64);

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(Wrapped).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|w| w.0))
    }
}
