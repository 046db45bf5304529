//! End-to-end run over one simulated bending report: extract, derive
//! displacement/force/work columns, and accumulate cycle work, asserting on
//! the persisted artifacts at each step.

use febpost_core::io::SaveTarget;
use febpost_core::modules::derive::{
    AxisSelection, DeriveConfig, ForceMagnitude, RelativeDisplacement, WorkIncrements, WorkRule,
    run_derivation,
};
use febpost_core::modules::extract::{ExtractConfig, run_extract};
use febpost_core::modules::hysteresis::{HysteresisConfig, run_hysteresis};
use febpost_core::table::Table;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const STEP_TIMES: [f64; 8] = [0.0, 0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75];
const STEP_Z: [f64; 8] = [1.0, 0.9, 0.8, 0.7, 0.8, 0.9, 1.0, 0.9];
const STEP_FZ: [f64; 8] = [0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0, 1.0];

fn bending_report() -> String {
    let mut report = String::from("*** cyclical bending run ***\n");
    for step in 0..STEP_TIMES.len() {
        report.push_str(&format!("Step = {step}\n"));
        report.push_str(&format!("Time = {:?}\n", STEP_TIMES[step]));
        report.push_str("Data = x;y;z;Fx;Fy;Fz\n");
        report.push_str(&format!(
            "Data 0.0 0.0 {:?} 0.0 0.0 {:?}\n",
            STEP_Z[step], STEP_FZ[step]
        ));
    }
    report
}

fn derive_config(directory: &Path) -> DeriveConfig {
    DeriveConfig {
        directory: Some(directory.to_path_buf()),
        file: Some("febio4.out.csv".into()),
        save: SaveTarget::Default,
    }
}

fn run_full_pipeline(directory: &Path) {
    fs::write(directory.join("febio4.out"), bending_report()).expect("report should be written");

    let summary = run_extract(&ExtractConfig {
        directory: Some(directory.to_path_buf()),
        file: Some("febio4.out".into()),
        save: SaveTarget::Default,
    })
    .expect("extract should succeed");
    assert_eq!(summary.record_count, STEP_TIMES.len());
    assert_eq!(summary.header.as_deref(), Some("x,y,z,Fx,Fy,Fz"));

    run_derivation(
        &derive_config(directory),
        &RelativeDisplacement {
            axes: AxisSelection::new(false, false, true),
        },
    )
    .expect("displacement should succeed");

    run_derivation(
        &derive_config(directory),
        &ForceMagnitude {
            axes: AxisSelection::new(true, true, true),
        },
    )
    .expect("force magnitude should succeed");

    run_derivation(
        &derive_config(directory),
        &WorkIncrements {
            rule: WorkRule::ForceOverDisplacement,
        },
    )
    .expect("displacement work should succeed");

    run_derivation(
        &derive_config(directory),
        &WorkIncrements {
            rule: WorkRule::ForceVelocityOverTime,
        },
    )
    .expect("velocity work should succeed");
}

#[test]
fn pipeline_grows_the_table_one_column_per_stage() {
    let temp = TempDir::new().expect("tempdir should be created");
    run_full_pipeline(temp.path());

    let table = Table::read_delimited(&temp.path().join("febio4.out.csv"))
        .expect("augmented table should parse");
    assert_eq!(
        table.columns(),
        ["n", "t", "x", "y", "z", "Fx", "Fy", "Fz", "disp", "F_mag", "dw_fdx", "dw_fvdt"]
    );
    assert_eq!(table.row_count(), STEP_TIMES.len());

    let displacement = table.numeric_column("disp").expect("disp should parse");
    assert_eq!(displacement[0], 0.0);
    for step in 1..STEP_TIMES.len() {
        assert!(
            (displacement[step] - (STEP_Z[step] - STEP_Z[0])).abs() < 1.0e-12,
            "row {step} displacement was {}",
            displacement[step]
        );
    }

    // Only Fz is non-zero, so the magnitude collapses to |Fz|.
    let magnitude = table.numeric_column("F_mag").expect("F_mag should parse");
    for step in 0..STEP_TIMES.len() {
        assert!((magnitude[step] - STEP_FZ[step].abs()).abs() < 1.0e-12);
    }

    let work = table.numeric_column("dw_fdx").expect("dw_fdx should parse");
    assert_eq!(work[0], 0.0);
    let expected_first = 0.5 * (STEP_FZ[0] + STEP_FZ[1]) * (STEP_Z[1] - STEP_Z[0]);
    assert!((work[1] - expected_first).abs() < 1.0e-12);
}

#[test]
fn cycle_totals_conserve_the_summed_work_increments() {
    let temp = TempDir::new().expect("tempdir should be created");
    run_full_pipeline(temp.path());

    let table = Table::read_delimited(&temp.path().join("febio4.out.csv"))
        .expect("augmented table should parse");
    let increments = table.numeric_column("dw_fvdt").expect("dw_fvdt should parse");
    let input_total: f64 = increments.iter().sum();

    let summary = run_hysteresis(&HysteresisConfig::new(
        Some(temp.path().to_path_buf()),
        Some("febio4.out.csv".into()),
        1.0,
    ))
    .expect("aggregation should succeed");

    // Times span [0, 1.75] at period 1.0.
    assert_eq!(summary.cycle_count, 2);
    let accumulated: f64 = summary.totals.iter().sum();
    assert!(
        (accumulated - input_total).abs() < 1.0e-12,
        "accumulated {accumulated}, input {input_total}"
    );

    let artifact =
        fs::read_to_string(&summary.output_path).expect("cycle artifact should be readable");
    assert!(artifact.starts_with("c0,c1\n"));
}

#[test]
fn rerunning_a_stage_overwrites_its_column_instead_of_duplicating_it() {
    let temp = TempDir::new().expect("tempdir should be created");
    run_full_pipeline(temp.path());

    run_derivation(
        &derive_config(temp.path()),
        &ForceMagnitude {
            axes: AxisSelection::new(false, false, true),
        },
    )
    .expect("second force run should succeed");

    let table = Table::read_delimited(&temp.path().join("febio4.out.csv"))
        .expect("augmented table should parse");
    let magnitude_columns = table
        .columns()
        .iter()
        .filter(|column| *column == "F_mag")
        .count();
    assert_eq!(magnitude_columns, 1);
}
