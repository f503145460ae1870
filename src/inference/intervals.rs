//! Wald confidence intervals and z-statistics for estimated parameters.
use crate::optimization::errors::{OptError, OptResult};
use ndarray::Array1;
use statrs::distribution::{ContinuousCDF, Normal};

/// Two-sided Wald interval bounds `θ̂ ± z_{(1+level)/2} · se`.
///
/// # Errors
/// - `InvalidConfidenceLevel` unless `0 < level < 1`.
/// - `StandardErrorDimMismatch` if `estimates` and `std_errors` differ in
///   length.
pub fn wald_intervals(
    estimates: &Array1<f64>, std_errors: &Array1<f64>, level: f64,
) -> OptResult<Vec<(f64, f64)>> {
    if !(level > 0.0 && level < 1.0) {
        return Err(OptError::InvalidConfidenceLevel { level });
    }
    check_lengths(estimates, std_errors)?;
    let z = standard_normal()?.inverse_cdf(0.5 + 0.5 * level);
    Ok(estimates.iter().zip(std_errors).map(|(&e, &se)| (e - z * se, e + z * se)).collect())
}

/// `θ̂ / se` and two-sided normal p-values. A zero standard error gives an
/// infinite statistic and a p-value of zero.
pub fn z_statistics(
    estimates: &Array1<f64>, std_errors: &Array1<f64>,
) -> OptResult<Vec<(f64, f64)>> {
    check_lengths(estimates, std_errors)?;
    let normal = standard_normal()?;
    Ok(estimates
        .iter()
        .zip(std_errors)
        .map(|(&e, &se)| {
            let z = e / se;
            (z, 2.0 * (1.0 - normal.cdf(z.abs())))
        })
        .collect())
}

fn standard_normal() -> OptResult<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| OptError::DistributionError { text: e.to_string() })
}

fn check_lengths(estimates: &Array1<f64>, std_errors: &Array1<f64>) -> OptResult<()> {
    if estimates.len() != std_errors.len() {
        return Err(OptError::StandardErrorDimMismatch {
            expected: estimates.len(),
            found: std_errors.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - 95% interval width against the familiar 1.96 quantile.
    // - Rejection of invalid levels and mismatched lengths.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Check the 95% interval uses z ≈ 1.959964.
    //
    // Given
    // -----
    // - θ̂ = [1, -2], se = [0.5, 0.1].
    //
    // Expect
    // ------
    // - Bounds 1 ± 0.98 and -2 ± 0.196 to 1e-5.
    fn wald_intervals_match_normal_quantile() {
        // Arrange
        let est = array![1.0, -2.0];
        let se = array![0.5, 0.1];

        // Act
        let ci = wald_intervals(&est, &se, 0.95).expect("valid level");

        // Assert
        assert!((ci[0].0 - (1.0 - 0.979982)).abs() < 1e-5);
        assert!((ci[0].1 - (1.0 + 0.979982)).abs() < 1e-5);
        assert!((ci[1].1 - (-2.0 + 0.1959964)).abs() < 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Ensure bad inputs are rejected.
    //
    // Given
    // -----
    // - level = 1.0; and estimates/SEs of lengths 2 and 1.
    //
    // Expect
    // ------
    // - `InvalidConfidenceLevel` and `StandardErrorDimMismatch`.
    fn wald_intervals_reject_bad_inputs() {
        // Arrange
        let est = array![1.0, 2.0];

        // Act
        let e1 = wald_intervals(&est, &array![0.1, 0.1], 1.0);
        let e2 = z_statistics(&est, &array![0.1]);

        // Assert
        assert!(matches!(e1, Err(OptError::InvalidConfidenceLevel { .. })));
        assert!(matches!(e2, Err(OptError::StandardErrorDimMismatch { expected: 2, found: 1 })));
    }
}
