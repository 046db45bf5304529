//! Column derivations over a persisted table: force magnitude, relative
//! displacement, and work increments. Each run reads the save file, computes
//! one column, and rewrites the file; a failed derivation writes nothing.

use super::ColumnDerivation;
use crate::domain::{PostError, PostResult};
use crate::io::{SaveTarget, resolve_input};
use crate::numerics::trapezoid_increments;
use crate::table::Table;
use std::path::PathBuf;

pub const FORCE_MAGNITUDE_COLUMN: &str = "F_mag";
pub const DISPLACEMENT_COLUMN: &str = "disp";
pub const WORK_FDX_COLUMN: &str = "dw_fdx";
pub const WORK_FVDT_COLUMN: &str = "dw_fvdt";
pub const TIME_COLUMN: &str = "t";

const FORCE_COMPONENT_COLUMNS: [&str; 3] = ["Fx", "Fy", "Fz"];
const POSITION_COLUMNS: [&str; 3] = ["x", "y", "z"];

/// Which of the three component axes a derivation should consider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisSelection {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisSelection {
    pub fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }

    /// Selected column names that actually exist in the table, in x/y/z order.
    fn retained<'a>(&self, table: &Table, columns: &[&'a str; 3]) -> Vec<&'a str> {
        [self.x, self.y, self.z]
            .into_iter()
            .zip(columns)
            .filter(|(selected, column)| *selected && table.has_column(column))
            .map(|(_, column)| *column)
            .collect()
    }
}

/// Euclidean norm of the selected force components, per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForceMagnitude {
    pub axes: AxisSelection,
}

impl ColumnDerivation for ForceMagnitude {
    fn column_name(&self) -> &'static str {
        FORCE_MAGNITUDE_COLUMN
    }

    fn derive(&self, table: &Table) -> PostResult<Vec<f64>> {
        let retained = self.axes.retained(table, &FORCE_COMPONENT_COLUMNS);
        if retained.is_empty() {
            return Err(PostError::insufficient_input(
                "INPUT.FORCE_COMPONENTS",
                format!(
                    "none of the selected force component columns {FORCE_COMPONENT_COLUMNS:?} are available"
                ),
            ));
        }

        let components: Vec<Vec<f64>> = retained
            .iter()
            .map(|column| table.numeric_column(column))
            .collect::<PostResult<_>>()?;

        let mut magnitudes = Vec::with_capacity(table.row_count());
        for row_index in 0..table.row_count() {
            let sum_of_squares: f64 = components
                .iter()
                .map(|component| component[row_index] * component[row_index])
                .sum();
            magnitudes.push(sum_of_squares.sqrt());
        }
        Ok(magnitudes)
    }
}

/// Displacement of one position axis relative to the first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeDisplacement {
    pub axes: AxisSelection,
}

impl ColumnDerivation for RelativeDisplacement {
    fn column_name(&self) -> &'static str {
        DISPLACEMENT_COLUMN
    }

    fn derive(&self, table: &Table) -> PostResult<Vec<f64>> {
        let retained = self.axes.retained(table, &POSITION_COLUMNS);
        if retained.is_empty() {
            return Err(PostError::insufficient_input(
                "INPUT.DISPLACEMENT_AXES",
                format!(
                    "none of the selected position columns {POSITION_COLUMNS:?} are available"
                ),
            ));
        }
        if retained.len() > 1 {
            return Err(PostError::unsupported(
                "INPUT.DISPLACEMENT_MULTI_AXIS",
                "displacement is not implemented for more than one dimension",
            ));
        }

        let positions = table.numeric_column(retained[0])?;
        let origin = positions.first().copied().unwrap_or(0.0);
        Ok(positions
            .iter()
            .enumerate()
            .map(|(row_index, position)| {
                if row_index == 0 {
                    0.0
                } else {
                    position - origin
                }
            })
            .collect())
    }
}

/// Integration rule for per-row work increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkRule {
    /// Trapezoid of force magnitude over displacement.
    ForceOverDisplacement,
    /// Trapezoid of force magnitude times velocity over time, with velocity
    /// the backward difference of displacement.
    ForceVelocityOverTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkIncrements {
    pub rule: WorkRule,
}

impl ColumnDerivation for WorkIncrements {
    fn column_name(&self) -> &'static str {
        match self.rule {
            WorkRule::ForceOverDisplacement => WORK_FDX_COLUMN,
            WorkRule::ForceVelocityOverTime => WORK_FVDT_COLUMN,
        }
    }

    fn derive(&self, table: &Table) -> PostResult<Vec<f64>> {
        let force = require_column(table, FORCE_MAGNITUDE_COLUMN)?;
        let displacement = require_column(table, DISPLACEMENT_COLUMN)?;

        let increments = match self.rule {
            WorkRule::ForceOverDisplacement => trapezoid_increments(&displacement, &force),
            WorkRule::ForceVelocityOverTime => {
                let time = require_column(table, TIME_COLUMN)?;
                let power = power_series(&force, &displacement, &time);
                trapezoid_increments(&time, &power)
            }
        };

        increments.map_err(|source| {
            PostError::insufficient_input(
                "INPUT.WORK_VALUES",
                format!("work integration rejected its inputs: {source}"),
            )
        })
    }
}

/// Force times backward-difference velocity; a zero time step contributes
/// zero velocity rather than dividing by it.
fn power_series(force: &[f64], displacement: &[f64], time: &[f64]) -> Vec<f64> {
    let mut power = Vec::with_capacity(force.len());
    for index in 0..force.len() {
        let velocity = if index == 0 {
            0.0
        } else {
            let time_step = time[index] - time[index - 1];
            if time_step == 0.0 {
                0.0
            } else {
                (displacement[index] - displacement[index - 1]) / time_step
            }
        };
        power.push(force[index] * velocity);
    }
    power
}

fn require_column(table: &Table, name: &str) -> PostResult<Vec<f64>> {
    if !table.has_column(name) {
        return Err(PostError::insufficient_input(
            "INPUT.WORK_COLUMNS",
            format!("work derivation requires a '{name}' column; derive it first"),
        ));
    }
    table.numeric_column(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeriveConfig {
    pub directory: Option<PathBuf>,
    pub file: Option<String>,
    pub save: SaveTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeriveSummary {
    pub column: &'static str,
    pub row_count: usize,
    pub save_path: PathBuf,
}

/// Read the persisted table, apply one derivation, and rewrite the save file.
/// The derivation runs before anything is written, so a failure leaves no
/// output behind.
pub fn run_derivation(
    config: &DeriveConfig,
    derivation: &impl ColumnDerivation,
) -> PostResult<DeriveSummary> {
    let resolved = resolve_input(config.directory.as_deref(), config.file.as_deref())?;
    let mut table = Table::read_delimited(&resolved.input_path())?;

    let values = derivation.derive(&table)?;
    table.upsert_numeric_column(derivation.column_name(), &values)?;

    let save_path = resolved.save_path(&config.save);
    table.write_delimited(&save_path)?;

    Ok(DeriveSummary {
        column: derivation.column_name(),
        row_count: table.row_count(),
        save_path,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        AxisSelection, DeriveConfig, ForceMagnitude, RelativeDisplacement, WorkIncrements,
        WorkRule, run_derivation,
    };
    use crate::domain::PostErrorCategory;
    use crate::io::SaveTarget;
    use crate::modules::ColumnDerivation;
    use crate::table::Table;
    use std::fs;
    use tempfile::TempDir;

    fn bending_table() -> Table {
        Table::from_rows(
            vec![
                "n".into(),
                "t".into(),
                "z".into(),
                "Fx".into(),
                "Fy".into(),
                "Fz".into(),
            ],
            vec![
                row(&["0", "0.0", "1.0", "3.0", "4.0", "12.0"]),
                row(&["1", "0.5", "0.8", "0.0", "0.0", "5.0"]),
                row(&["2", "1.0", "0.9", "1.0", "2.0", "2.0"]),
            ],
        )
        .expect("table should build")
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn force_magnitude_is_the_euclidean_norm_of_selected_components() {
        let derivation = ForceMagnitude {
            axes: AxisSelection::new(true, true, true),
        };
        let values = derivation
            .derive(&bending_table())
            .expect("derivation should succeed");

        assert_eq!(values, vec![13.0, 5.0, 3.0]);
        assert!(values.iter().all(|value| *value >= 0.0));
    }

    #[test]
    fn force_magnitude_ignores_selected_but_absent_components() {
        let table = Table::from_rows(
            vec!["t".into(), "Fz".into()],
            vec![row(&["0.0", "-2.0"]), row(&["0.5", "2.0"])],
        )
        .expect("table should build");

        let derivation = ForceMagnitude {
            axes: AxisSelection::new(true, true, true),
        };
        let values = derivation.derive(&table).expect("Fz alone should suffice");
        assert_eq!(values, vec![2.0, 2.0]);
    }

    #[test]
    fn force_magnitude_without_any_component_is_insufficient_input() {
        let table = Table::from_rows(vec!["t".into()], vec![row(&["0.0"])])
            .expect("table should build");

        let error = ForceMagnitude {
            axes: AxisSelection::new(true, true, true),
        }
        .derive(&table)
        .expect_err("no force columns should fail");

        assert_eq!(error.category(), PostErrorCategory::InsufficientInput);
        assert_eq!(error.code(), "INPUT.FORCE_COMPONENTS");
    }

    #[test]
    fn displacement_is_zero_at_row_zero_and_relative_afterwards() {
        let derivation = RelativeDisplacement {
            axes: AxisSelection::new(false, false, true),
        };
        let values = derivation
            .derive(&bending_table())
            .expect("derivation should succeed");

        assert_eq!(values[0], 0.0);
        assert!((values[1] - (0.8 - 1.0)).abs() < 1.0e-12);
        assert!((values[2] - (0.9 - 1.0)).abs() < 1.0e-12);
    }

    #[test]
    fn multi_axis_displacement_is_unsupported() {
        let table = Table::from_rows(
            vec!["x".into(), "y".into()],
            vec![row(&["0.0", "0.0"])],
        )
        .expect("table should build");

        let error = RelativeDisplacement {
            axes: AxisSelection::new(true, true, false),
        }
        .derive(&table)
        .expect_err("two axes should fail");

        assert_eq!(error.category(), PostErrorCategory::Unsupported);
        assert_eq!(error.code(), "INPUT.DISPLACEMENT_MULTI_AXIS");
    }

    #[test]
    fn work_increments_conserve_the_total_trapezoid_area() {
        let mut table = bending_table();
        table
            .upsert_numeric_column("F_mag", &[13.0, 5.0, 3.0])
            .expect("force column");
        table
            .upsert_numeric_column("disp", &[0.0, -0.2, -0.1])
            .expect("displacement column");

        let values = WorkIncrements {
            rule: WorkRule::ForceOverDisplacement,
        }
        .derive(&table)
        .expect("derivation should succeed");

        assert_eq!(values[0], 0.0);
        let total: f64 = values.iter().sum();
        let expected = 0.5 * (13.0 + 5.0) * (-0.2) + 0.5 * (5.0 + 3.0) * 0.1;
        assert!((total - expected).abs() < 1.0e-12);
    }

    #[test]
    fn velocity_based_work_starts_at_zero_and_uses_time_steps() {
        let mut table = bending_table();
        table
            .upsert_numeric_column("F_mag", &[2.0, 2.0, 2.0])
            .expect("force column");
        table
            .upsert_numeric_column("disp", &[0.0, 1.0, 1.0])
            .expect("displacement column");

        let values = WorkIncrements {
            rule: WorkRule::ForceVelocityOverTime,
        }
        .derive(&table)
        .expect("derivation should succeed");

        // velocity: 0, 2, 0 over dt = 0.5 each; power: 0, 4, 0.
        assert_eq!(values[0], 0.0);
        assert!((values[1] - 1.0).abs() < 1.0e-12);
        assert!((values[2] - 1.0).abs() < 1.0e-12);
    }

    #[test]
    fn work_without_prerequisite_columns_is_insufficient_input() {
        let error = WorkIncrements {
            rule: WorkRule::ForceOverDisplacement,
        }
        .derive(&bending_table())
        .expect_err("missing F_mag should fail");

        assert_eq!(error.code(), "INPUT.WORK_COLUMNS");
        assert!(error.message().contains("F_mag"));
    }

    #[test]
    fn failed_derivation_leaves_the_save_file_unwritten() {
        let temp = TempDir::new().expect("tempdir should be created");
        let input = temp.path().join("febio4.out.csv");
        Table::from_rows(
            vec!["x".into(), "y".into()],
            vec![row(&["0.0", "0.0"]), row(&["0.1", "0.2"])],
        )
        .expect("table should build")
        .write_delimited(&input)
        .expect("fixture should be written");

        let config = DeriveConfig {
            directory: Some(temp.path().to_path_buf()),
            file: Some("febio4.out.csv".into()),
            save: SaveTarget::Named("augmented.csv".into()),
        };
        let error = run_derivation(
            &config,
            &RelativeDisplacement {
                axes: AxisSelection::new(true, true, false),
            },
        )
        .expect_err("multi-axis request should fail");

        assert_eq!(error.category(), PostErrorCategory::Unsupported);
        assert!(!temp.path().join("augmented.csv").exists());
    }

    #[test]
    fn run_derivation_appends_the_column_and_rewrites_the_save_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let input = temp.path().join("febio4.out.csv");
        bending_table()
            .write_delimited(&input)
            .expect("fixture should be written");

        let config = DeriveConfig {
            directory: Some(temp.path().to_path_buf()),
            file: Some("febio4.out.csv".into()),
            save: SaveTarget::Default,
        };
        let summary = run_derivation(
            &config,
            &ForceMagnitude {
                axes: AxisSelection::new(true, true, true),
            },
        )
        .expect("derivation should succeed");

        assert_eq!(summary.column, "F_mag");
        assert_eq!(summary.row_count, 3);

        let content = fs::read_to_string(&input).expect("artifact should be readable");
        assert!(content.starts_with("n,t,z,Fx,Fy,Fz,F_mag\n"));
        assert!(content.contains("0,0.0,1.0,3.0,4.0,12.0,13.0\n"));
    }
}
