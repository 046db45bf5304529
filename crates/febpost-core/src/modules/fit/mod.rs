//! Peak-period estimation: fit cycle work against log-period and report the
//! period at which the fitted curve is maximal, independently per cycle.

use crate::domain::{PostError, PostResult};
use crate::io::resolve_input;
use crate::numerics::{
    CauchyPeak, PeakFitError, PeakFitInput, fit_cauchy_peak, lin_to_log, log_to_lin,
};
use crate::table::{Table, render_numeric, write_text_artifact};
use serde::Serialize;
use std::path::PathBuf;

pub const FIT_TABLE_FILE: &str = "fit.out.csv";
pub const FIT_REPORT_FILE: &str = "fit.report.json";
pub const DEFAULT_SAMPLE_COUNT: usize = 100;
const PERIOD_COLUMN: &str = "period";

#[derive(Debug, Clone, PartialEq)]
pub struct PeakPeriodConfig {
    pub directory: Option<PathBuf>,
    pub file: Option<String>,
    /// Base of the log-period scale.
    pub log_base: f64,
    /// Number of points at which the fitted curve is sampled.
    pub sample_count: usize,
    pub table_output: Option<PathBuf>,
    pub report_output: Option<PathBuf>,
}

impl PeakPeriodConfig {
    pub fn new(directory: Option<PathBuf>, file: Option<String>) -> Self {
        Self {
            directory,
            file,
            log_base: crate::numerics::DEFAULT_LOG_BASE,
            sample_count: DEFAULT_SAMPLE_COUNT,
            table_output: None,
            report_output: None,
        }
    }
}

/// Fit result for one cycle column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleFit {
    pub cycle: usize,
    /// Fitted peak location on the log-period scale.
    pub location: f64,
    /// Fitted peak half-width on the log-period scale.
    pub width: f64,
    pub iterations: usize,
    pub residual_norm: f64,
    /// Argument of the sampled maximum on the log-period scale.
    pub peak_log_period: f64,
    /// The same argument mapped back to seconds.
    pub peak_period: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakPeriodReport {
    pub log_base: f64,
    pub sample_count: usize,
    pub cycles: Vec<CycleFit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeakPeriodOutcome {
    pub report: PeakPeriodReport,
    pub table_path: PathBuf,
    pub report_path: PathBuf,
}

/// Fit every cycle column of a `period,c0,...` collection and persist both
/// the `c,period_opt` table and the JSON report.
pub fn run_peak_period(config: &PeakPeriodConfig) -> PostResult<PeakPeriodOutcome> {
    if !config.log_base.is_finite() || config.log_base <= 0.0 || config.log_base == 1.0 {
        return Err(PostError::configuration(
            "INPUT.LOG_BASE",
            format!("log base must be positive and not 1, got {}", config.log_base),
        ));
    }
    if config.sample_count < 2 {
        return Err(PostError::configuration(
            "INPUT.SAMPLE_COUNT",
            format!("sample count must be at least 2, got {}", config.sample_count),
        ));
    }

    let resolved = resolve_input(config.directory.as_deref(), config.file.as_deref())?;
    let table = Table::read_delimited(&resolved.input_path())?;

    if !table.has_column(PERIOD_COLUMN) {
        return Err(PostError::insufficient_input(
            "INPUT.PERIOD_COLUMN",
            "unable to find the column containing the cycle period (assumed 'period')",
        ));
    }

    let periods = table.numeric_column(PERIOD_COLUMN)?;
    for &period in &periods {
        if !period.is_finite() || period <= 0.0 {
            return Err(PostError::insufficient_input(
                "INPUT.PERIOD_POSITIVE",
                format!("period values must be positive to be log-scaled, got {period}"),
            ));
        }
    }

    let cycle_count = probe_cycle_columns(&table);
    if cycle_count == 0 {
        return Err(PostError::insufficient_input(
            "INPUT.CYCLE_COLUMNS",
            "table has no contiguous cycle columns starting at 'c0'",
        ));
    }

    let log_periods: Vec<f64> = periods
        .iter()
        .map(|&period| lin_to_log(period, config.log_base))
        .collect();

    let mut cycles = Vec::with_capacity(cycle_count);
    for cycle in 0..cycle_count {
        let works = table.numeric_column(&format!("c{cycle}"))?;
        cycles.push(fit_cycle(cycle, &log_periods, &works, config)?);
    }

    let report = PeakPeriodReport {
        log_base: config.log_base,
        sample_count: config.sample_count,
        cycles,
    };

    let table_path = config
        .table_output
        .clone()
        .unwrap_or_else(|| resolved.directory().join(FIT_TABLE_FILE));
    write_fit_table(&table_path, &report)?;

    let report_path = config
        .report_output
        .clone()
        .unwrap_or_else(|| resolved.directory().join(FIT_REPORT_FILE));
    write_fit_report(&report_path, &report)?;

    Ok(PeakPeriodOutcome {
        report,
        table_path,
        report_path,
    })
}

/// Cycle columns are discovered by probing `c{i}` from 0 until one is absent.
fn probe_cycle_columns(table: &Table) -> usize {
    let mut cycle = 0;
    while table.has_column(&format!("c{cycle}")) {
        cycle += 1;
    }
    cycle
}

fn fit_cycle(
    cycle: usize,
    log_periods: &[f64],
    works: &[f64],
    config: &PeakPeriodConfig,
) -> PostResult<CycleFit> {
    let fit = fit_cauchy_peak(PeakFitInput::new(log_periods, works))
        .map_err(|error| map_fit_error(cycle, error))?;

    let (peak_log_period, _) = sampled_maximum(&fit.model, log_periods, config.sample_count);

    Ok(CycleFit {
        cycle,
        location: fit.model.location,
        width: fit.model.width,
        iterations: fit.iterations,
        residual_norm: fit.residual_norm,
        peak_log_period,
        peak_period: log_to_lin(peak_log_period, config.log_base),
    })
}

/// Sample the fitted curve over the observed log-period range and return the
/// argument and value of the maximum.
fn sampled_maximum(model: &CauchyPeak, log_periods: &[f64], sample_count: usize) -> (f64, f64) {
    let mut min_x = log_periods[0];
    let mut max_x = log_periods[0];
    for &x in log_periods {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }

    let step = (max_x - min_x) / (sample_count - 1) as f64;
    let mut best_x = min_x;
    let mut best_y = model.evaluate(min_x);
    for index in 1..sample_count {
        let x = min_x + step * index as f64;
        let y = model.evaluate(x);
        if y > best_y {
            best_x = x;
            best_y = y;
        }
    }
    (best_x, best_y)
}

fn map_fit_error(cycle: usize, error: PeakFitError) -> PostError {
    match error {
        PeakFitError::SingularNormalMatrix { .. } | PeakFitError::DidNotConverge { .. } => {
            PostError::fit_convergence("RUN.PEAK_FIT", format!("cycle {cycle}: {error}"))
        }
        other => PostError::insufficient_input(
            "INPUT.PEAK_FIT",
            format!("cycle {cycle}: {other}"),
        ),
    }
}

fn write_fit_table(path: &std::path::Path, report: &PeakPeriodReport) -> PostResult<()> {
    let mut table = Table::from_rows(vec!["c".into(), "period_opt".into()], Vec::new())?;
    for cycle in &report.cycles {
        table.push_row(vec![
            cycle.cycle.to_string(),
            render_numeric(cycle.peak_period),
        ])?;
    }
    table.write_delimited(path)
}

fn write_fit_report(path: &std::path::Path, report: &PeakPeriodReport) -> PostResult<()> {
    let rendered = serde_json::to_string_pretty(report).map_err(|source| {
        PostError::io_system(
            "IO.FIT_REPORT_RENDER",
            format!("failed to render fit report: {source}"),
        )
    })?;
    write_text_artifact(path, &rendered).map_err(|source| {
        PostError::io_system(
            "IO.FIT_REPORT_WRITE",
            format!("failed to write fit report '{}': {}", path.display(), source),
        )
    })
}
