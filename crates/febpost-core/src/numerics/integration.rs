#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrationError {
    #[error("trapezoid input length mismatch: xs={xs}, ys={ys}")]
    LengthMismatch { xs: usize, ys: usize },
    #[error("trapezoid vector '{field}' must contain finite values, index {index} got {value}")]
    NonFiniteValue {
        field: &'static str,
        index: usize,
        value: f64,
    },
}

/// Per-interval trapezoid areas of `ys` over `xs`.
///
/// Returns one increment per sample; the first is 0 so the result aligns with
/// the input rows. `xs` does not have to be monotone; a reversed interval
/// yields a negative increment.
pub fn trapezoid_increments(xs: &[f64], ys: &[f64]) -> Result<Vec<f64>, IntegrationError> {
    if xs.len() != ys.len() {
        return Err(IntegrationError::LengthMismatch {
            xs: xs.len(),
            ys: ys.len(),
        });
    }
    validate_vector("xs", xs)?;
    validate_vector("ys", ys)?;

    let mut increments = Vec::with_capacity(xs.len());
    for index in 0..xs.len() {
        if index == 0 {
            increments.push(0.0);
            continue;
        }
        let span = xs[index] - xs[index - 1];
        increments.push(0.5 * (ys[index] + ys[index - 1]) * span);
    }
    Ok(increments)
}

fn validate_vector(field: &'static str, values: &[f64]) -> Result<(), IntegrationError> {
    for (index, value) in values.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(IntegrationError::NonFiniteValue {
                field,
                index,
                value,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{IntegrationError, trapezoid_increments};

    #[test]
    fn increments_sum_to_the_analytic_integral_of_a_line() {
        let xs: Vec<f64> = (0..=10).map(|index| index as f64 * 0.1).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x).collect();

        let increments = trapezoid_increments(&xs, &ys).expect("integration should succeed");

        assert_eq!(increments.len(), xs.len());
        assert_eq!(increments[0], 0.0);
        let total: f64 = increments.iter().sum();
        assert!((total - 1.0).abs() < 1.0e-12, "total was {total}");
    }

    #[test]
    fn reversed_intervals_contribute_negative_area() {
        let increments =
            trapezoid_increments(&[0.0, 1.0, 0.5], &[1.0, 1.0, 1.0]).expect("integration");
        assert_eq!(increments, vec![0.0, 1.0, -0.5]);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let error = trapezoid_increments(&[0.0, 1.0], &[1.0]).expect_err("mismatch should fail");
        assert_eq!(error, IntegrationError::LengthMismatch { xs: 2, ys: 1 });
    }

    #[test]
    fn non_finite_samples_are_rejected() {
        let error = trapezoid_increments(&[0.0, f64::NAN], &[1.0, 1.0])
            .expect_err("non-finite x should fail");
        assert!(matches!(
            error,
            IntegrationError::NonFiniteValue {
                field: "xs",
                index: 1,
                ..
            }
        ));
    }
}
