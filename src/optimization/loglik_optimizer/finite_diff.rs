//! loglik_optimizer::finite_diff — finite-difference gradient and Hessian helpers.
//!
//! Purpose
//! -------
//! Approximate derivatives of the Kalman log-likelihood, which has no
//! analytic gradient, and keep the `finitediff` API out of the rest of the
//! optimizer.
//!
//! Key behaviors
//! -------------
//! - [`run_fd_diff`]: forward-difference gradient with error capture and
//!   validation; the fallback path of the argmin adapter.
//! - [`compute_hessian`]: central-difference Hessian from function values,
//!   symmetrized before return. Used for observed-information standard
//!   errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Any error raised by the objective during differencing is routed into
//!   the shared `closure_err` cell and treated as a hard failure.
//! - Returned gradients satisfy [`validate_grad`]; returned Hessians satisfy
//!   [`validate_hessian`] and are exactly symmetric.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Forward-difference gradient of `func` at `theta`, with error capture.
///
/// `func` is expected to park any evaluation error in `closure_err` and
/// return `NaN`. The cell is cleared on entry and inspected afterwards.
///
/// # Errors
/// - The captured error, converted into `OptError` (a wrapped `OptError` is
///   recovered unchanged).
/// - `GradientDimMismatch` / `InvalidGradient` from [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Central-difference Hessian of the scalar map `f` at `theta`.
///
/// Built from function values only, with per-coordinate step
/// `h_i = ε^{1/4} · max(|θ_i|, 1)`, which balances truncation against
/// round-off for a second difference. Costs `1 + 2n + 2n(n - 1)` calls.
///
/// # Errors
/// - `InvalidHessian` if any entry is non-finite (e.g. `f` hit an
///   infeasible point inside the stencil).
///
/// # Examples
/// ```rust
/// # use ndarray::array;
/// # use rust_affine::optimization::loglik_optimizer::{Theta, finite_diff::compute_hessian};
/// let f = |theta: &Theta| theta[0] * theta[0] + 3.0 * theta[0] * theta[1];
/// let hess = compute_hessian(&f, &array![1.0, 2.0]).unwrap();
/// assert!((hess[[0, 1]] - 3.0).abs() < 1e-6);
/// ```
pub fn compute_hessian<F: Fn(&Theta) -> f64>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let steps: Vec<f64> =
        theta.iter().map(|t| f64::EPSILON.powf(0.25) * t.abs().max(1.0)).collect();
    let f0 = f(theta);
    let mut hess = Hessian::zeros((dim, dim));
    let mut point = theta.clone();

    for i in 0..dim {
        let hi = steps[i];
        point[i] = theta[i] + hi;
        let plus = f(&point);
        point[i] = theta[i] - hi;
        let minus = f(&point);
        point[i] = theta[i];
        hess[[i, i]] = (plus - 2.0 * f0 + minus) / (hi * hi);

        for j in 0..i {
            let hj = steps[j];
            let mut corner = |si: f64, sj: f64| {
                point[i] = theta[i] + si * hi;
                point[j] = theta[j] + sj * hj;
                let v = f(&point);
                point[i] = theta[i];
                point[j] = theta[j];
                v
            };
            let v = (corner(1.0, 1.0) - corner(1.0, -1.0) - corner(-1.0, 1.0)
                + corner(-1.0, -1.0))
                / (4.0 * hi * hj);
            hess[[i, j]] = v;
            hess[[j, i]] = v;
        }
    }
    validate_hessian(&hess, dim)?;
    symmetrize_hess(&mut hess);
    Ok(hess)
}

// ---- Helper methods ----

/// Average each off-diagonal pair in place; the diagonal is untouched.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
