//! Per-cycle accumulation of work increments over fixed-width time windows.

use crate::domain::{PostError, PostResult};
use crate::io::resolve_input;
use crate::table::{Table, render_numeric, write_text_artifact};
use std::path::{Path, PathBuf};

pub const HYSTERESIS_OUTPUT_FILE: &str = "hys.out.csv";
pub const DEFAULT_TIME_COLUMN: &str = "t";
pub const DEFAULT_WORK_COLUMN: &str = "dw_fvdt";
const PERIOD_COLUMN: &str = "period";

#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisConfig {
    pub directory: Option<PathBuf>,
    pub file: Option<String>,
    /// Cycle width in seconds; must be finite and positive.
    pub period: f64,
    pub time_column: String,
    pub work_column: String,
    /// Per-run artifact; `hys.out.csv` next to the input when absent.
    pub output: Option<PathBuf>,
    /// Optional collection file accumulating one `period,c0,...` row per run.
    pub record: Option<PathBuf>,
}

impl HysteresisConfig {
    pub fn new(directory: Option<PathBuf>, file: Option<String>, period: f64) -> Self {
        Self {
            directory,
            file,
            period,
            time_column: DEFAULT_TIME_COLUMN.to_string(),
            work_column: DEFAULT_WORK_COLUMN.to_string(),
            output: None,
            record: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisSummary {
    pub cycle_count: usize,
    pub totals: Vec<f64>,
    pub output_path: PathBuf,
}

/// Sum the work-increment column into contiguous cycles of width `period`.
///
/// A row at time `t` belongs to cycle `floor(t / period)`; the accumulator
/// list grows with zeros as needed, so the cycle count over a span `[0, T]`
/// is `floor(T / period) + 1` and the accumulated total equals the input
/// total.
pub fn run_hysteresis(config: &HysteresisConfig) -> PostResult<HysteresisSummary> {
    if !config.period.is_finite() || config.period <= 0.0 {
        return Err(PostError::configuration(
            "INPUT.PERIOD_POSITIVE",
            format!("cycle period must be positive, got {}", config.period),
        ));
    }

    let resolved = resolve_input(config.directory.as_deref(), config.file.as_deref())?;
    let table = Table::read_delimited(&resolved.input_path())?;
    if table.is_empty() {
        return Err(PostError::empty_input(
            "INPUT.HYSTERESIS_EMPTY",
            format!(
                "table '{}' has no rows to aggregate",
                resolved.input_path().display()
            ),
        ));
    }

    let times = table.numeric_column(&config.time_column)?;
    let works = table.numeric_column(&config.work_column)?;

    let totals = accumulate_cycles(&times, &works, config.period)?;

    let output_path = config
        .output
        .clone()
        .unwrap_or_else(|| resolved.directory().join(HYSTERESIS_OUTPUT_FILE));
    write_cycle_artifact(&output_path, &totals)?;

    if let Some(record_path) = &config.record {
        append_record_row(record_path, config.period, &totals)?;
    }

    Ok(HysteresisSummary {
        cycle_count: totals.len(),
        totals,
        output_path,
    })
}

fn accumulate_cycles(times: &[f64], works: &[f64], period: f64) -> PostResult<Vec<f64>> {
    let mut totals: Vec<f64> = Vec::new();
    for (&time, &work) in times.iter().zip(works) {
        if !time.is_finite() || time < 0.0 {
            return Err(PostError::insufficient_input(
                "INPUT.HYSTERESIS_TIME",
                format!("time values must be finite and non-negative, got {time}"),
            ));
        }

        let cycle = (time / period).floor() as usize;
        if totals.len() <= cycle {
            totals.resize(cycle + 1, 0.0);
        }
        totals[cycle] += work;
    }
    Ok(totals)
}

fn write_cycle_artifact(path: &Path, totals: &[f64]) -> PostResult<()> {
    let header: Vec<String> = (0..totals.len()).map(|cycle| format!("c{cycle}")).collect();
    let values: Vec<String> = totals.iter().copied().map(render_numeric).collect();
    let rendered = format!("{}\n{}\n", header.join(","), values.join(","));

    write_text_artifact(path, &rendered).map_err(|source| {
        PostError::io_system(
            "IO.HYSTERESIS_WRITE",
            format!(
                "failed to write cycle artifact '{}': {}",
                path.display(),
                source
            ),
        )
    })
}

/// Append one `period,c0,...` row to the collection consumed by the
/// peak-period fit. An existing collection must carry the same cycle count.
fn append_record_row(path: &Path, period: f64, totals: &[f64]) -> PostResult<()> {
    let mut columns = vec![PERIOD_COLUMN.to_string()];
    columns.extend((0..totals.len()).map(|cycle| format!("c{cycle}")));

    let mut collection = if path.exists() {
        let existing = Table::read_delimited(path)?;
        if existing.columns() != columns.as_slice() {
            return Err(PostError::insufficient_input(
                "INPUT.RECORD_HEADER",
                format!(
                    "collection '{}' has columns {:?}, this run produced {:?}",
                    path.display(),
                    existing.columns(),
                    columns
                ),
            ));
        }
        existing
    } else {
        Table::from_rows(columns, Vec::new())?
    };

    let mut row = vec![render_numeric(period)];
    row.extend(totals.iter().copied().map(render_numeric));
    collection.push_row(row)?;
    collection.write_delimited(path)
}
