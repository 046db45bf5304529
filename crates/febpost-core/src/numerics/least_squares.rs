use super::peak::CauchyPeak;

pub const DEFAULT_MAX_ITERATIONS: usize = 200;
pub const DEFAULT_TOLERANCE: f64 = 1.0e-10;

const INITIAL_DAMPING: f64 = 1.0e-3;
const DAMPING_GROWTH: f64 = 10.0;
const DAMPING_SHRINK: f64 = 0.1;
const MAX_DAMPING: f64 = 1.0e12;
const MIN_DAMPING: f64 = 1.0e-12;
const MIN_DIAGONAL: f64 = 1.0e-12;
const MIN_WIDTH: f64 = 1.0e-12;
const RESIDUAL_FLOOR: f64 = 1.0e-15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakFitInput<'a> {
    pub xs: &'a [f64],
    pub ys: &'a [f64],
    /// Starting parameters; estimated from the data when absent.
    pub initial: Option<CauchyPeak>,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl<'a> PeakFitInput<'a> {
    pub fn new(xs: &'a [f64], ys: &'a [f64]) -> Self {
        Self {
            xs,
            ys,
            initial: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakFit {
    pub model: CauchyPeak,
    pub iterations: usize,
    pub residual_norm: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PeakFitError {
    #[error("peak fit requires at least 3 observations, got {actual}")]
    InsufficientPoints { actual: usize },
    #[error("peak fit input length mismatch: xs={xs}, ys={ys}")]
    LengthMismatch { xs: usize, ys: usize },
    #[error("peak fit vector '{field}' must contain finite values, index {index} got {value}")]
    NonFiniteValue {
        field: &'static str,
        index: usize,
        value: f64,
    },
    #[error("peak fit parameter '{field}' must be finite and positive, got {value}")]
    InvalidParameter { field: &'static str, value: f64 },
    #[error("peak fit normal system is singular at iteration {iteration}")]
    SingularNormalMatrix { iteration: usize },
    #[error(
        "peak fit did not converge after {iterations} iterations (residual norm {residual_norm:e})"
    )]
    DidNotConverge {
        iterations: usize,
        residual_norm: f64,
    },
}

/// Fit the two-parameter Cauchy peak to `(x, y)` observations with damped
/// Gauss-Newton (Levenberg-Marquardt) iterations and analytic derivatives.
pub fn fit_cauchy_peak(input: PeakFitInput<'_>) -> Result<PeakFit, PeakFitError> {
    validate_input(&input)?;

    let mut model = input.initial.unwrap_or_else(|| initial_guess(input.xs, input.ys));
    model.width = model.width.abs().max(MIN_WIDTH);

    let mut cost = cost_of(&model, input.xs, input.ys);
    let mut damping = INITIAL_DAMPING;

    for iteration in 0..input.max_iterations {
        if cost.sqrt() <= RESIDUAL_FLOOR {
            return Ok(PeakFit {
                model,
                iterations: iteration,
                residual_norm: cost.sqrt(),
            });
        }

        // Normal equations of the damped step: (J^T J + damping * diag) step = -J^T r.
        let mut a11 = 0.0;
        let mut a12 = 0.0;
        let mut a22 = 0.0;
        let mut g1 = 0.0;
        let mut g2 = 0.0;
        for (&x, &y) in input.xs.iter().zip(input.ys) {
            let residual = model.evaluate(x) - y;
            let (j1, j2) = model.gradient(x);
            a11 += j1 * j1;
            a12 += j1 * j2;
            a22 += j2 * j2;
            g1 += j1 * residual;
            g2 += j2 * residual;
        }

        let mut accepted = false;
        while !accepted {
            let m11 = a11 + damping * a11.max(MIN_DIAGONAL);
            let m22 = a22 + damping * a22.max(MIN_DIAGONAL);
            let determinant = m11 * m22 - a12 * a12;

            if !determinant.is_finite() || determinant.abs() <= f64::MIN_POSITIVE {
                damping *= DAMPING_GROWTH;
                if damping > MAX_DAMPING {
                    return Err(PeakFitError::SingularNormalMatrix { iteration });
                }
                continue;
            }

            let step_location = (-g1 * m22 + g2 * a12) / determinant;
            let step_width = (g1 * a12 - g2 * m11) / determinant;

            let candidate = CauchyPeak::new(
                model.location + step_location,
                (model.width + step_width).abs().max(MIN_WIDTH),
            );
            let candidate_cost = cost_of(&candidate, input.xs, input.ys);

            if candidate_cost.is_finite() && candidate_cost < cost {
                let improvement = cost - candidate_cost;
                let converged = step_converged(&model, step_location, step_width, input.tolerance)
                    || improvement <= input.tolerance * cost;

                model = candidate;
                cost = candidate_cost;
                damping = (damping * DAMPING_SHRINK).max(MIN_DAMPING);
                accepted = true;

                if converged {
                    return Ok(PeakFit {
                        model,
                        iterations: iteration + 1,
                        residual_norm: cost.sqrt(),
                    });
                }
            } else {
                damping *= DAMPING_GROWTH;
                if damping > MAX_DAMPING {
                    return Err(PeakFitError::DidNotConverge {
                        iterations: iteration + 1,
                        residual_norm: cost.sqrt(),
                    });
                }
            }
        }
    }

    Err(PeakFitError::DidNotConverge {
        iterations: input.max_iterations,
        residual_norm: cost.sqrt(),
    })
}

fn validate_input(input: &PeakFitInput<'_>) -> Result<(), PeakFitError> {
    if input.xs.len() != input.ys.len() {
        return Err(PeakFitError::LengthMismatch {
            xs: input.xs.len(),
            ys: input.ys.len(),
        });
    }
    if input.xs.len() < 3 {
        return Err(PeakFitError::InsufficientPoints {
            actual: input.xs.len(),
        });
    }
    validate_vector("xs", input.xs)?;
    validate_vector("ys", input.ys)?;

    if !input.tolerance.is_finite() || input.tolerance <= 0.0 {
        return Err(PeakFitError::InvalidParameter {
            field: "tolerance",
            value: input.tolerance,
        });
    }
    if input.max_iterations == 0 {
        return Err(PeakFitError::InvalidParameter {
            field: "max_iterations",
            value: 0.0,
        });
    }
    if let Some(initial) = input.initial {
        if !initial.location.is_finite() {
            return Err(PeakFitError::InvalidParameter {
                field: "initial.location",
                value: initial.location,
            });
        }
        if !initial.width.is_finite() || initial.width == 0.0 {
            return Err(PeakFitError::InvalidParameter {
                field: "initial.width",
                value: initial.width,
            });
        }
    }

    Ok(())
}

fn validate_vector(field: &'static str, values: &[f64]) -> Result<(), PeakFitError> {
    for (index, value) in values.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(PeakFitError::NonFiniteValue {
                field,
                index,
                value,
            });
        }
    }
    Ok(())
}

fn initial_guess(xs: &[f64], ys: &[f64]) -> CauchyPeak {
    let mut peak_index = 0;
    for (index, &y) in ys.iter().enumerate() {
        if y > ys[peak_index] {
            peak_index = index;
        }
    }

    let mut min_x = xs[0];
    let mut max_x = xs[0];
    for &x in xs {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }

    let width = ((max_x - min_x) / 4.0).abs().max(1.0e-3);
    CauchyPeak::new(xs[peak_index], width)
}

fn cost_of(model: &CauchyPeak, xs: &[f64], ys: &[f64]) -> f64 {
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| {
            let residual = model.evaluate(x) - y;
            residual * residual
        })
        .sum()
}

fn step_converged(model: &CauchyPeak, step_location: f64, step_width: f64, tolerance: f64) -> bool {
    step_location.abs() <= tolerance * (1.0 + model.location.abs())
        && step_width.abs() <= tolerance * (1.0 + model.width.abs())
}
