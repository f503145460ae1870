//! Synthetic yield panels drawn from a specified affine model.
//!
//! Purpose
//! -------
//! Generate data with known parameters for recovery studies and tests. The
//! state starts from the model's prior (stationary by default), evolves by
//! the transition equation, and yields are observed with Gaussian
//! measurement error of standard deviation `obs_sd`.
//!
//! Conventions
//! -----------
//! - Randomness comes from a caller-owned generator; the same generator state
//!   gives the same panel.
//! - Observed factors, if any, are the first `n_observed` states and are
//!   returned without noise in the panel's factor block.
use crate::term_structure::{
    core::{
        data::YieldPanel,
        kalman::initial_state,
        spec::ModelSpecification,
        state_space::{realize_model, to_dmatrix},
    },
    errors::{AffineError, AffineResult},
};
use nalgebra::DVector;
use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;

/// Draw `n_periods` observations from the model at `theta`.
///
/// Errors
/// ------
/// - `ShapeMismatch` for a wrong-length `theta`.
/// - `InvalidSpecification` if `n_periods == 0`.
/// - Numerical failures while building the system or prior (complex
///   residual, non-stationary transition under a stationary prior) are
///   returned as errors.
pub fn simulate_panel<R: Rng + ?Sized>(
    spec: &ModelSpecification, theta: &[f64], n_periods: usize, imag_tol: f64, rng: &mut R,
) -> AffineResult<YieldPanel> {
    if n_periods == 0 {
        return Err(AffineError::InvalidSpecification {
            reason: "cannot simulate an empty panel".to_string(),
        });
    }
    let model = realize_model(spec, theta, imag_tol)??;
    let sys = &model.system;
    let k = sys.n_states();
    let m = spec.n_maturities();
    let n_obs = spec.n_observed();

    let (mean, cov) = initial_state(sys, spec.prior())?;
    let sigma = to_dmatrix(&model.params.sigma);
    let mut x = match cov.cholesky() {
        Some(chol) => mean + chol.l() * normal_vector(k, rng),
        None => mean,
    };

    let mut yields = Array2::zeros((n_periods, m));
    let mut factors = Array2::zeros((n_periods, n_obs));
    for t in 0..n_periods {
        let fitted = &sys.obs_intercept + &sys.design * &x;
        for i in 0..m {
            let noise: f64 = rng.sample(StandardNormal);
            yields[(t, i)] = fitted[i] + model.params.obs_sd[(i, 0)] * noise;
        }
        for j in 0..n_obs {
            factors[(t, j)] = x[j];
        }
        x = &sys.transition_intercept + &sys.transition * &x + &sigma * normal_vector(k, rng);
    }

    let factors = if n_obs > 0 { Some(factors) } else { None };
    YieldPanel::new(None, spec.maturities().to_vec(), yields, factors)
}

fn normal_vector<R: Rng + ?Sized>(n: usize, rng: &mut R) -> DVector<f64> {
    DVector::from_fn(n, |_, _| rng.sample(StandardNormal))
}
