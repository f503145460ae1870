//! Kalman filter and Gaussian log-likelihood for affine state-space models.
//!
//! Purpose
//! -------
//! Score a parameter vector by running the Kalman filter over a yield panel
//! and accumulating the prediction-error decomposition of the likelihood.
//! Infeasible parameter vectors are reported as [`Evaluation::Penalized`]
//! so that an optimizer can keep searching.
//!
//! Key behaviors
//! -------------
//! - [`initial_state`] turns a [`StatePrior`] into `(x_{1|0}, P_{1|0})`; the
//!   stationary prior solves the discrete Lyapunov equation through
//!   `(I - Φ⊗Φ) vec P = vec Q`.
//! - [`log_likelihood`] / [`filter`] run the update-then-predict recursion.
//!   Each `F_t` is factored by Cholesky; failure stops the pass at that `t`.
//! - [`evaluate`] is the pure scoring entry point used by the driver:
//!   structural problems are `Err(AffineError)`, numerical infeasibility is
//!   `Ok(Evaluation::Penalized { .. })`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Time runs over the panel rows in order; step `t` depends on `t - 1`.
//! - `P` is re-symmetrized after every update and prediction.
//! - Nothing here mutates shared state; the same inputs give the same output.
//!
//! Conventions
//! -----------
//! - `ℓ = Σ_t -½ (p ln 2π + ln|F_t| + v_t' F_t⁻¹ v_t)` with `p = m + n_observed`.
//! - Filtered states are `x_{t|t}`, stored row-wise (T×k).
use crate::term_structure::{
    core::{
        data::YieldPanel,
        options::EvalSettings,
        spec::{ModelSpecification, StatePrior},
        state_space::{RealizedModel, StateSpace, realize_model, to_dmatrix},
    },
    errors::{AffineResult, EvalFailure},
};
use nalgebra::{DMatrix, DVector};
use ndarray::Array2;
use std::f64::consts::PI;

/// Outcome of scoring one parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Valid(f64),
    /// `loglik` is the negated penalty; `failure` says why.
    Penalized { loglik: f64, failure: EvalFailure },
}

impl Evaluation {
    fn penalized(failure: EvalFailure, penalty: f64) -> Self {
        Evaluation::Penalized { loglik: -penalty, failure }
    }

    /// Value handed to the optimizer.
    pub fn loglik(&self) -> f64 {
        match self {
            Evaluation::Valid(ll) => *ll,
            Evaluation::Penalized { loglik, .. } => *loglik,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Evaluation::Valid(_))
    }

    pub fn failure(&self) -> Option<&EvalFailure> {
        match self {
            Evaluation::Valid(_) => None,
            Evaluation::Penalized { failure, .. } => Some(failure),
        }
    }
}

/// Full filter pass output.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutput {
    pub log_likelihood: f64,
    /// `x_{t|t}` (T×k).
    pub filtered_states: Array2<f64>,
    /// `v_t = y_t - d - Z x_{t|t-1}` (T×p).
    pub innovations: Array2<f64>,
}

/// Score `theta` under `spec` on `panel`.
///
/// Errors
/// ------
/// - `ShapeMismatch` for a parameter vector of the wrong length.
/// - `InvalidSpecification` if the panel does not match the specification.
///
/// Every numerical failure (complex residual, non-stationary prior,
/// non-positive-definite `F_t`, non-finite values) is returned as
/// `Ok(Evaluation::Penalized { .. })` with `loglik = -settings.penalty`.
pub fn evaluate(
    spec: &ModelSpecification, theta: &[f64], panel: &YieldPanel, settings: &EvalSettings,
) -> AffineResult<Evaluation> {
    spec.check_panel(panel)?;
    let model = match realize_model(spec, theta, settings.imag_tol)? {
        Ok(model) => model,
        Err(failure) => return Ok(Evaluation::penalized(failure, settings.penalty)),
    };
    Ok(match log_likelihood(&model.system, spec.prior(), panel, spec.n_observed()) {
        Ok(ll) => Evaluation::Valid(ll),
        Err(failure) => Evaluation::penalized(failure, settings.penalty),
    })
}

/// Realise `theta` and run the full filter, treating any numerical failure
/// as an error. Used once at θ̂ to build fitted outputs.
pub fn filter_at(
    spec: &ModelSpecification, theta: &[f64], panel: &YieldPanel, imag_tol: f64,
) -> AffineResult<(RealizedModel, FilterOutput)> {
    spec.check_panel(panel)?;
    let model = realize_model(spec, theta, imag_tol)??;
    let out = filter(&model.system, spec.prior(), panel, spec.n_observed())?;
    Ok((model, out))
}

/// Log-likelihood only.
pub fn log_likelihood(
    system: &StateSpace, prior: &StatePrior, panel: &YieldPanel, n_observed: usize,
) -> Result<f64, EvalFailure> {
    run(system, prior, panel, n_observed, false).map(|out| out.log_likelihood)
}

/// Log-likelihood plus filtered states and innovations.
pub fn filter(
    system: &StateSpace, prior: &StatePrior, panel: &YieldPanel, n_observed: usize,
) -> Result<FilterOutput, EvalFailure> {
    run(system, prior, panel, n_observed, true)
}

/// `(x_{1|0}, P_{1|0})` for the given prior.
pub fn initial_state(
    system: &StateSpace, prior: &StatePrior,
) -> Result<(DVector<f64>, DMatrix<f64>), EvalFailure> {
    let k = system.n_states();
    match prior {
        StatePrior::Stationary => stationary_moments(system),
        StatePrior::Diffuse { kappa } => {
            Ok((DVector::zeros(k), DMatrix::identity(k, k) * *kappa))
        }
        StatePrior::Fixed { mean, cov } => {
            Ok((DVector::from_iterator(k, mean.iter().copied()), to_dmatrix(cov)))
        }
    }
}

/// Unconditional mean `(I - Φ)⁻¹ μ` and covariance solving `P = ΦPΦ' + Q`.
///
/// # Errors
/// - `NonStationary` when `Φ` has non-finite entries or its spectral radius
///   is not below one.
/// - `SingularSystem` if either linear system cannot be solved.
pub fn stationary_moments(
    system: &StateSpace,
) -> Result<(DVector<f64>, DMatrix<f64>), EvalFailure> {
    let k = system.n_states();
    let t = &system.transition;

    if t.iter().any(|v| !v.is_finite()) {
        return Err(EvalFailure::NonStationary { spectral_radius: f64::NAN });
    }
    let mut spectral_radius = 0.0_f64;
    for z in t.complex_eigenvalues().iter() {
        let r = z.norm();
        if !r.is_finite() {
            return Err(EvalFailure::NonStationary { spectral_radius: r });
        }
        spectral_radius = spectral_radius.max(r);
    }
    if spectral_radius >= 1.0 {
        return Err(EvalFailure::NonStationary { spectral_radius });
    }

    let mean = (DMatrix::identity(k, k) - t)
        .lu()
        .solve(&system.transition_intercept)
        .ok_or(EvalFailure::SingularSystem { context: "stationary mean" })?;

    // Column-major vec: vec(TPT') = (T ⊗ T) vec P.
    let lhs = DMatrix::identity(k * k, k * k) - t.kronecker(t);
    let rhs = DVector::from_column_slice(system.state_cov.as_slice());
    let vec_p = lhs
        .lu()
        .solve(&rhs)
        .ok_or(EvalFailure::SingularSystem { context: "stationary covariance" })?;
    let cov = symmetrize(DMatrix::from_column_slice(k, k, vec_p.as_slice()));

    if mean.iter().chain(cov.iter()).any(|v| !v.is_finite()) {
        return Err(EvalFailure::SingularSystem { context: "stationary moments" });
    }
    Ok((mean, cov))
}

// ---- Helper Methods ----

fn run(
    system: &StateSpace, prior: &StatePrior, panel: &YieldPanel, n_observed: usize,
    keep: bool,
) -> Result<FilterOutput, EvalFailure> {
    let (mut x, mut p) = initial_state(system, prior)?;
    let n_steps = panel.len();
    let k = system.n_states();
    let dim = system.n_obs();
    let const_term = dim as f64 * (2.0 * PI).ln();
    let z_t = system.design.transpose();
    let t_t = system.transition.transpose();

    let mut filtered = if keep { Array2::zeros((n_steps, k)) } else { Array2::zeros((0, k)) };
    let mut innovations =
        if keep { Array2::zeros((n_steps, dim)) } else { Array2::zeros((0, dim)) };
    let mut ll = 0.0;

    for t in 0..n_steps {
        // Update
        let y = panel.observation_vector(t, n_observed);
        let v = y - &system.obs_intercept - &system.design * &x;
        let zp = &system.design * &p;
        let f = symmetrize(&zp * &z_t + &system.obs_cov);
        let chol = f.cholesky().ok_or(EvalFailure::NotPositiveDefinite { t })?;
        let diag = chol.l_dirty().diagonal();
        if diag.iter().any(|d| !(*d > 0.0) || !d.is_finite()) {
            return Err(EvalFailure::NotPositiveDefinite { t });
        }
        let log_det = 2.0 * diag.iter().map(|d| d.ln()).sum::<f64>();
        let quad = v.dot(&chol.solve(&v));
        ll += -0.5 * (const_term + log_det + quad);

        // K' = F⁻¹ Z P, so K v = (F⁻¹ Z P)' v and K Z P = (F⁻¹ Z P)' Z P.
        let gain_t = chol.solve(&zp);
        x += gain_t.transpose() * &v;
        p = symmetrize(&p - gain_t.transpose() * &zp);

        if !ll.is_finite() || x.iter().chain(p.iter()).any(|v| !v.is_finite()) {
            return Err(EvalFailure::NonFinite { t });
        }
        if keep {
            for j in 0..k {
                filtered[(t, j)] = x[j];
            }
            for j in 0..dim {
                innovations[(t, j)] = v[j];
            }
        }

        // Predict
        x = &system.transition_intercept + &system.transition * &x;
        p = symmetrize(&system.transition * &p * &t_t + &system.state_cov);
    }

    Ok(FilterOutput { log_likelihood: ll, filtered_states: filtered, innovations })
}

fn symmetrize(m: DMatrix<f64>) -> DMatrix<f64> {
    (&m + m.transpose()) * 0.5
}
