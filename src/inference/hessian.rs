//! inference::hessian — observed-information standard errors.
//!
//! Purpose
//! -------
//! Turn a finite-difference Hessian of the negative log-likelihood at the
//! estimate into a covariance matrix and standard errors for the free
//! parameters of a fitted affine model.
//!
//! Key behaviors
//! -------------
//! - Call [`compute_hessian`] on `θ ↦ -ℓ(θ)` to obtain the observed
//!   information `J(θ̂)` on the summed log-likelihood scale.
//! - Invert `J(θ̂)` through a symmetric eigendecomposition, dropping
//!   eigenvalues at or below [`EIGEN_EPS`] (Moore–Penrose pseudoinverse).
//!
//! Invariants & assumptions
//! ------------------------
//! - `θ̂` is an interior maximum, so `J(θ̂)` is positive semi-definite up
//!   to differencing error. Non-positive eigen-directions are treated as
//!   unidentified and contribute nothing to the variance.
//! - The objective must be finite on the whole difference stencil around
//!   `θ̂`; a penalized evaluation inside the stencil makes the Hessian
//!   meaningless, and callers should check the result for plausibility.
//!
//! Conventions
//! -----------
//! - Parameters are in free-cell order, matching `θ̂`.
//! - No explicit inverse is formed.
//! - Errors are reported via [`OptResult<T>`].
use crate::optimization::{errors::OptResult, loglik_optimizer::finite_diff::compute_hessian};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Eigenvalues of `J(θ̂)` at or below this are treated as zero.
pub const EIGEN_EPS: f64 = 1e-10;

/// Covariance `J(θ̂)⁺` of the estimate from the negative log-likelihood.
///
/// Parameters
/// ----------
/// - `neg_loglik`: `θ ↦ -ℓ(θ)`, twice differentiable near `theta_hat`.
/// - `theta_hat`: the estimate.
///
/// Errors
/// ------
/// - Any error from [`compute_hessian`] (non-finite entries).
pub fn calc_covariance<F: Fn(&Array1<f64>) -> f64>(
    neg_loglik: &F, theta_hat: &Array1<f64>,
) -> OptResult<Array2<f64>> {
    let obs_info = compute_hessian(neg_loglik, theta_hat)?;
    Ok(pseudo_inverse(fill_dmatrix(&obs_info)))
}

/// Standard errors `sqrt(diag J(θ̂)⁺)`.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_affine::inference::hessian::calc_standard_errors;
/// // -ℓ(θ) = 2 θ₀² + ½ θ₁², so J = diag(4, 1).
/// let f = |t: &ndarray::Array1<f64>| 2.0 * t[0] * t[0] + 0.5 * t[1] * t[1];
/// let se = calc_standard_errors(&f, &array![0.0, 0.0]).unwrap();
/// assert!((se[0] - 0.5).abs() < 1e-6);
/// assert!((se[1] - 1.0).abs() < 1e-6);
/// ```
pub fn calc_standard_errors<F: Fn(&Array1<f64>) -> f64>(
    neg_loglik: &F, theta_hat: &Array1<f64>,
) -> OptResult<Array1<f64>> {
    let cov = calc_covariance(neg_loglik, theta_hat)?;
    Ok(cov.diag().mapv(|v| v.max(0.0).sqrt()))
}

// ---- Helper methods ----

fn fill_dmatrix(obs_info: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(obs_info.nrows(), obs_info.ncols(), |i, j| obs_info[[i, j]])
}

/// `Q Λ⁺ Q'` with eigenvalues `λ ≤ EIGEN_EPS` dropped.
fn pseudo_inverse(obs_info: DMatrix<f64>) -> Array2<f64> {
    let n = obs_info.nrows();
    let eigen = obs_info.symmetric_eigen();
    let q = eigen.eigenvectors;
    let mut cov = Array2::<f64>::zeros((n, n));
    for (k, &lambda) in eigen.eigenvalues.iter().enumerate() {
        if lambda <= EIGEN_EPS {
            continue;
        }
        for i in 0..n {
            for j in 0..n {
                cov[[i, j]] += q[(i, k)] * q[(j, k)] / lambda;
            }
        }
    }
    cov
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Covariance and SEs for quadratic objectives with known information.
    // - Truncation of a flat (unidentified) direction.
    //
    // They intentionally DO NOT cover:
    // - The affine likelihood itself (see the model tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Check the covariance equals the analytic inverse of a coupled
    // information matrix.
    //
    // Given
    // -----
    // - -ℓ(θ) = ½ θ' J θ with J = [[2, 1], [1, 2]].
    //
    // Expect
    // ------
    // - cov ≈ J⁻¹ = [[2/3, -1/3], [-1/3, 2/3]].
    fn calc_covariance_inverts_coupled_information() {
        // Arrange
        let j = array![[2.0, 1.0], [1.0, 2.0]];
        let f = |t: &Array1<f64>| 0.5 * t.dot(&j.dot(t));

        // Act
        let cov = calc_covariance(&f, &array![0.1, -0.2]).expect("covariance");

        // Assert
        let expected = array![[2.0 / 3.0, -1.0 / 3.0], [-1.0 / 3.0, 2.0 / 3.0]];
        for ((r, c), v) in cov.indexed_iter() {
            assert!((v - expected[[r, c]]).abs() < 1e-5);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify a direction with zero curvature gets zero variance rather than
    // an infinite one.
    //
    // Given
    // -----
    // - -ℓ(θ) = θ₀² (θ₁ does not enter).
    //
    // Expect
    // ------
    // - SE[0] ≈ sqrt(1/2); SE[1] ≈ 0.
    fn calc_standard_errors_drops_flat_directions() {
        // Arrange
        let f = |t: &Array1<f64>| t[0] * t[0];

        // Act
        let se = calc_standard_errors(&f, &array![0.5, 3.0]).expect("standard errors");

        // Assert
        assert!((se[0] - 0.5_f64.sqrt()).abs() < 1e-5);
        assert!(se[1] < 1e-8);
    }
}
