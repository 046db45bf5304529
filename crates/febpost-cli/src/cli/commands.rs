use super::CliError;
use super::dispatch::{CHAIN_ORDER, command_for_stage};
use super::helpers::{ensure_parent_dir, save_target};
use febpost_core::domain::PostStage;
use febpost_core::io::{DEFAULT_SAVE_FILE, SaveTarget, resolve_input};
use febpost_core::modules::ColumnDerivation;
use febpost_core::modules::derive::{
    AxisSelection, DeriveConfig, ForceMagnitude, RelativeDisplacement, WorkIncrements, WorkRule,
    run_derivation,
};
use febpost_core::modules::extract::{ExtractConfig, run_extract};
use febpost_core::modules::fit::{DEFAULT_SAMPLE_COUNT, PeakPeriodConfig, run_peak_period};
use febpost_core::modules::hysteresis::{
    DEFAULT_TIME_COLUMN, DEFAULT_WORK_COLUMN, HysteresisConfig, run_hysteresis,
};
use febpost_core::numerics::DEFAULT_LOG_BASE;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct InputArgs {
    /// Directory containing the input file
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Input file name; a composite path when --dir is omitted
    #[arg(value_name = "FILE")]
    file: Option<String>,
}

#[derive(clap::Args)]
pub(super) struct SaveArgs {
    /// Save file name next to the input (febio4.out.csv when omitted)
    #[arg(long, value_name = "NAME", conflicts_with = "in_place")]
    save: Option<String>,

    /// Write the output back over the input file
    #[arg(long)]
    in_place: bool,
}

impl SaveArgs {
    fn target(self) -> SaveTarget {
        save_target(self.save, self.in_place)
    }
}

#[derive(clap::Args)]
pub(super) struct ExtractArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    save: SaveArgs,
}

#[derive(clap::Args)]
pub(super) struct ForceArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    save: SaveArgs,

    /// Include the Fx component
    #[arg(long)]
    x: bool,

    /// Include the Fy component
    #[arg(long)]
    y: bool,

    /// Include the Fz component
    #[arg(long)]
    z: bool,
}

#[derive(clap::Args)]
pub(super) struct DisplacementArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    save: SaveArgs,

    /// Track the x position column
    #[arg(long)]
    x: bool,

    /// Track the y position column
    #[arg(long)]
    y: bool,

    /// Track the z position column
    #[arg(long)]
    z: bool,
}

#[derive(clap::Args)]
pub(super) struct WorkArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    save: SaveArgs,

    /// Integrate force magnitude over displacement (dw_fdx)
    #[arg(long)]
    fdx: bool,

    /// Integrate force times velocity over time (dw_fvdt)
    #[arg(long)]
    fvdt: bool,
}

#[derive(clap::Args)]
pub(super) struct HysteresisArgs {
    /// Cycle period in seconds
    #[arg(value_name = "PERIOD")]
    period: f64,

    /// Directory containing the extracted table
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Extracted table file name
    #[arg(long, value_name = "FILE", default_value = DEFAULT_SAVE_FILE)]
    file: String,

    /// Column holding the step time
    #[arg(long, value_name = "NAME", default_value = DEFAULT_TIME_COLUMN)]
    time_column: String,

    /// Column holding per-row work increments
    #[arg(long, value_name = "NAME", default_value = DEFAULT_WORK_COLUMN)]
    work_column: String,

    /// Cycle artifact path (hys.out.csv next to the input when omitted)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Append a period-keyed row to this collection file
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct MaxPeriodArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Log base for the period scale
    #[arg(long, value_name = "BASE", default_value_t = DEFAULT_LOG_BASE)]
    base: f64,

    /// Number of samples across the fitted curve
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_SAMPLE_COUNT)]
    samples: usize,

    /// Summary table path (fit.out.csv next to the input when omitted)
    #[arg(long, value_name = "PATH")]
    table_output: Option<PathBuf>,

    /// JSON report path (fit.report.json next to the input when omitted)
    #[arg(long, value_name = "PATH")]
    report_output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct ChainArgs {
    #[command(flatten)]
    input: InputArgs,
}

pub(super) fn run_extract_command(args: ExtractArgs) -> Result<i32, CliError> {
    let config = ExtractConfig {
        directory: args.input.dir,
        file: args.input.file,
        save: args.save.target(),
    };
    let summary = run_extract(&config).map_err(CliError::Stage)?;

    if summary.record_count == 0 {
        eprintln!(
            "WARNING: [RUN.EXTRACT_EMPTY] no step markers matched; wrote a header-only table."
        );
    }
    tracing::debug!(records = summary.record_count, "extract completed");
    println!(
        "Extracted {} step record(s) into '{}'.",
        summary.record_count,
        summary.save_path.display()
    );
    Ok(0)
}

pub(super) fn run_force_command(args: ForceArgs) -> Result<i32, CliError> {
    let derivation = ForceMagnitude {
        axes: AxisSelection::new(args.x, args.y, args.z),
    };
    run_derive_stage(args.input, args.save.target(), &derivation)
}

pub(super) fn run_displacement_command(args: DisplacementArgs) -> Result<i32, CliError> {
    let derivation = RelativeDisplacement {
        axes: AxisSelection::new(args.x, args.y, args.z),
    };
    run_derive_stage(args.input, args.save.target(), &derivation)
}

pub(super) fn run_work_command(args: WorkArgs) -> Result<i32, CliError> {
    let save = args.save.target();
    for rule in selected_work_rules(args.fdx, args.fvdt) {
        let config = DeriveConfig {
            directory: args.input.dir.clone(),
            file: args.input.file.clone(),
            save: save.clone(),
        };
        let summary =
            run_derivation(&config, &WorkIncrements { rule }).map_err(CliError::Stage)?;
        println!(
            "Derived '{}' for {} row(s) into '{}'.",
            summary.column,
            summary.row_count,
            summary.save_path.display()
        );
    }
    Ok(0)
}

/// Both rules run when neither flag is given, matching the driver sequence
/// that computes the displacement and velocity variants back to back.
fn selected_work_rules(fdx: bool, fvdt: bool) -> Vec<WorkRule> {
    let mut rules = Vec::new();
    if fdx || !fvdt {
        rules.push(WorkRule::ForceOverDisplacement);
    }
    if fvdt || !fdx {
        rules.push(WorkRule::ForceVelocityOverTime);
    }
    rules
}

fn run_derive_stage(
    input: InputArgs,
    save: SaveTarget,
    derivation: &impl ColumnDerivation,
) -> Result<i32, CliError> {
    let config = DeriveConfig {
        directory: input.dir,
        file: input.file,
        save,
    };
    let summary = run_derivation(&config, derivation).map_err(CliError::Stage)?;

    tracing::debug!(column = summary.column, rows = summary.row_count, "derivation completed");
    println!(
        "Derived '{}' for {} row(s) into '{}'.",
        summary.column,
        summary.row_count,
        summary.save_path.display()
    );
    Ok(0)
}

pub(super) fn run_hysteresis_command(args: HysteresisArgs) -> Result<i32, CliError> {
    if let Some(output) = &args.output {
        ensure_parent_dir(output)?;
    }
    if let Some(record) = &args.record {
        ensure_parent_dir(record)?;
    }

    let config = HysteresisConfig {
        directory: args.dir,
        file: Some(args.file),
        period: args.period,
        time_column: args.time_column,
        work_column: args.work_column,
        output: args.output,
        record: args.record.clone(),
    };
    let summary = run_hysteresis(&config).map_err(CliError::Stage)?;

    tracing::debug!(cycles = summary.cycle_count, "hysteresis completed");
    println!(
        "Accumulated {} cycle(s) into '{}'.",
        summary.cycle_count,
        summary.output_path.display()
    );
    if let Some(record) = &args.record {
        println!("Recorded period {} in '{}'.", config.period, record.display());
    }
    Ok(0)
}

pub(super) fn run_max_period_command(args: MaxPeriodArgs) -> Result<i32, CliError> {
    if let Some(table_output) = &args.table_output {
        ensure_parent_dir(table_output)?;
    }
    if let Some(report_output) = &args.report_output {
        ensure_parent_dir(report_output)?;
    }

    let config = PeakPeriodConfig {
        directory: args.input.dir,
        file: args.input.file,
        log_base: args.base,
        sample_count: args.samples,
        table_output: args.table_output,
        report_output: args.report_output,
    };
    let outcome = run_peak_period(&config).map_err(CliError::Stage)?;

    for cycle in &outcome.report.cycles {
        println!(
            "Cycle {}: optimal period {} s (location {}, width {}).",
            cycle.cycle, cycle.peak_period, cycle.location, cycle.width
        );
    }
    println!("Summary table: {}", outcome.table_path.display());
    println!("JSON report: {}", outcome.report_path.display());
    Ok(0)
}

pub(super) fn run_chain_command(args: ChainArgs) -> Result<i32, CliError> {
    let resolved = resolve_input(args.input.dir.as_deref(), args.input.file.as_deref())
        .map_err(CliError::Stage)?;
    let directory = resolved.directory().to_path_buf();

    for stage in CHAIN_ORDER {
        let spec = command_for_stage(stage).expect("chain stages should be registered commands");
        println!("Running {}...", spec.stage);
        tracing::debug!(command = spec.command, "dispatching chain stage");
        match stage {
            PostStage::Extract => {
                let config = ExtractConfig {
                    directory: Some(directory.clone()),
                    file: Some(resolved.file_name().to_string()),
                    save: SaveTarget::Default,
                };
                run_extract(&config).map_err(CliError::Stage)?;
            }
            PostStage::Displacement => {
                chain_derivation(
                    &directory,
                    &RelativeDisplacement {
                        axes: AxisSelection::new(false, false, true),
                    },
                )?;
            }
            PostStage::ForceMagnitude => {
                chain_derivation(
                    &directory,
                    &ForceMagnitude {
                        axes: AxisSelection::new(true, true, true),
                    },
                )?;
            }
            PostStage::Work => {
                chain_derivation(
                    &directory,
                    &WorkIncrements {
                        rule: WorkRule::ForceOverDisplacement,
                    },
                )?;
                chain_derivation(
                    &directory,
                    &WorkIncrements {
                        rule: WorkRule::ForceVelocityOverTime,
                    },
                )?;
            }
            _ => unreachable!("stage is not part of the chain order"),
        }
    }

    println!(
        "Completed bending chain for '{}'.",
        resolved.input_path().display()
    );
    Ok(0)
}

/// Derived chain stages always read and rewrite the default save file left
/// behind by the extract stage.
fn chain_derivation(
    directory: &std::path::Path,
    derivation: &impl ColumnDerivation,
) -> Result<(), CliError> {
    let config = DeriveConfig {
        directory: Some(directory.to_path_buf()),
        file: Some(DEFAULT_SAVE_FILE.to_string()),
        save: SaveTarget::Default,
    };
    run_derivation(&config, derivation).map_err(CliError::Stage)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::selected_work_rules;
    use febpost_core::modules::derive::WorkRule;

    #[test]
    fn no_work_flags_selects_both_rules_in_driver_order() {
        assert_eq!(
            selected_work_rules(false, false),
            vec![
                WorkRule::ForceOverDisplacement,
                WorkRule::ForceVelocityOverTime
            ]
        );
    }

    #[test]
    fn explicit_work_flags_select_single_rules() {
        assert_eq!(
            selected_work_rules(true, false),
            vec![WorkRule::ForceOverDisplacement]
        );
        assert_eq!(
            selected_work_rules(false, true),
            vec![WorkRule::ForceVelocityOverTime]
        );
        assert_eq!(
            selected_work_rules(true, true),
            vec![
                WorkRule::ForceOverDisplacement,
                WorkRule::ForceVelocityOverTime
            ]
        );
    }
}
