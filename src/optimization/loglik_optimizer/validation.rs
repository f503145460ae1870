//! Validation helpers for log-likelihood optimization.
//!
//! - Tolerances: [`verify_tol_grad`], [`verify_tol_cost`].
//! - Inputs: [`validate_theta_input`] for starting vectors.
//! - Derivatives: [`validate_grad`], [`validate_hessian`].
//! - Outcomes: [`validate_theta_hat`], [`validate_value`].
//!
//! Every helper reports the first offending element through a dedicated
//! [`OptError`] variant.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta, types::Hessian},
};

/// Validate the optional gradient-norm tolerance (finite and `> 0` when set).
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional cost-change tolerance (finite and `> 0` when set).
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate a starting vector: expected length and finite entries.
///
/// # Errors
/// - [`OptError::ThetaLengthMismatch`] if `theta.len() != expected`.
/// - [`OptError::InvalidThetaInput`] for the first non-finite entry.
pub fn validate_theta_input(theta: &Theta, expected: usize) -> OptResult<()> {
    if theta.len() != expected {
        return Err(OptError::ThetaLengthMismatch { expected, actual: theta.len() });
    }
    match theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(OptError::InvalidThetaInput { index, value }),
        None => Ok(()),
    }
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] for the first non-finite element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let t = theta_hat.ok_or(OptError::MissingThetaHat)?;
    for (index, &value) in t.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "Parameter estimates must be finite.",
            });
        }
    }
    Ok(t)
}

/// Validate that a scalar log-likelihood value is finite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

/// Validate a `dim × dim` Hessian with finite entries.
///
/// # Errors
/// - [`OptError::HessianDimMismatch`] on a shape mismatch.
/// - [`OptError::InvalidHessian`] with the offending row/col.
pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.nrows() != dim || hessian.ncols() != dim {
        return Err(OptError::HessianDimMismatch {
            expected: dim,
            found: (hessian.nrows(), hessian.ncols()),
        });
    }
    for ((i, j), &value) in hessian.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidHessian { row: i, col: j, value });
        }
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
    // - Starting-vector validation (length and finiteness).
    // - Tolerance validation edge cases.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure starting vectors are checked for length before finiteness.
    //
    // Given
    // -----
    // - A length-2 vector checked against 3, and a vector holding NaN.
    //
    // Expect
    // ------
    // - `ThetaLengthMismatch` and `InvalidThetaInput { index: 1 }`.
    fn validate_theta_input_checks_length_then_finiteness() {
        // Arrange
        let short = array![0.1, 0.2];
        let nan = array![0.1, f64::NAN, 0.3];

        // Act
        let len_err = validate_theta_input(&short, 3);
        let nan_err = validate_theta_input(&nan, 3);

        // Assert
        assert_eq!(len_err, Err(OptError::ThetaLengthMismatch { expected: 3, actual: 2 }));
        assert!(matches!(nan_err, Err(OptError::InvalidThetaInput { index: 1, .. })));
    }

    #[test]
    // Purpose
    // -------
    // Check that zero and infinite tolerances are rejected.
    //
    // Given
    // -----
    // - `Some(0.0)` as gradient tolerance and `Some(inf)` as cost tolerance.
    //
    // Expect
    // ------
    // - Both produce their respective error variants; `None` passes.
    fn tolerance_checks_reject_zero_and_infinite_values() {
        // Arrange / Act / Assert
        assert!(matches!(verify_tol_grad(Some(0.0)), Err(OptError::InvalidTolGrad { .. })));
        assert!(matches!(
            verify_tol_cost(Some(f64::INFINITY)),
            Err(OptError::InvalidTolCost { .. })
        ));
        assert!(verify_tol_grad(None).is_ok());
    }
}
