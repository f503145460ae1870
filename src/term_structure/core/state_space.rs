//! Real linear-Gaussian state-space form of an affine model.
//!
//! ```text
//! X_{t+1} = c + T X_t + η_t,     η_t ~ N(0, Q),   Q = ΣΣ'
//! y_t     = d + Z X_t + ε_t,     ε_t ~ N(0, H)
//! ```
//!
//! with `c = μ`, `T = Φ`, `d = [A; 0]`, `Z = [B; (I_obs 0)]` and
//! `H = diag(obs_sd²) ⊕ 0`. Observed factors enter `y_t` without error.
//!
//! [`realize_model`] is the builder pipeline for one parameter vector:
//! unflatten, run the complex loading recursion, drop imaginary parts, and
//! assemble nalgebra matrices for the filter.
use crate::term_structure::{
    core::{
        params::ResolvedParams,
        recursion::{AffineLoadings, affine_loadings},
        spec::ModelSpecification,
    },
    errors::{AffineResult, EvalFailure},
};
use nalgebra::{DMatrix, DVector};
use ndarray::Array2;
use num_complex::Complex64;

/// System matrices consumed by the Kalman filter.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpace {
    /// `c` (k)
    pub transition_intercept: DVector<f64>,
    /// `T` (k×k)
    pub transition: DMatrix<f64>,
    /// `Q` (k×k)
    pub state_cov: DMatrix<f64>,
    /// `d` (p)
    pub obs_intercept: DVector<f64>,
    /// `Z` (p×k)
    pub design: DMatrix<f64>,
    /// `H` (p×p)
    pub obs_cov: DMatrix<f64>,
}

impl StateSpace {
    /// Assemble the system from real parameters and loadings.
    ///
    /// `p = m + n_observed`; the first `n_observed` states are the observed
    /// factors.
    pub fn from_parts(
        params: &ResolvedParams<f64>, loadings: &AffineLoadings<f64>, n_observed: usize,
    ) -> Self {
        let k = params.phi.nrows();
        let m = loadings.a.len();
        let p = m + n_observed;

        let transition_intercept = DVector::from_fn(k, |i, _| params.mu[(i, 0)]);
        let transition = to_dmatrix(&params.phi);
        let sigma = to_dmatrix(&params.sigma);
        let state_cov = &sigma * sigma.transpose();

        let obs_intercept = DVector::from_fn(p, |i, _| if i < m { loadings.a[i] } else { 0.0 });
        let design = DMatrix::from_fn(p, k, |i, j| {
            if i < m {
                loadings.b[(i, j)]
            } else if i - m == j {
                1.0
            } else {
                0.0
            }
        });
        let obs_cov = DMatrix::from_fn(p, p, |i, j| {
            if i == j && i < m { params.obs_sd[(i, 0)].powi(2) } else { 0.0 }
        });

        Self { transition_intercept, transition, state_cov, obs_intercept, design, obs_cov }
    }

    /// State dimension `k`.
    pub fn n_states(&self) -> usize {
        self.transition.nrows()
    }

    /// Measurement dimension `p`.
    pub fn n_obs(&self) -> usize {
        self.design.nrows()
    }
}

/// Everything derived from one parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct RealizedModel {
    pub params: ResolvedParams<f64>,
    pub loadings: AffineLoadings<f64>,
    pub system: StateSpace,
}

/// Build the real state-space system for `theta`.
///
/// Returns
/// -------
/// - `Err(AffineError)` only for a structural problem (wrong `theta`
///   length).
/// - `Ok(Err(EvalFailure::ComplexResidual))` when a resolved matrix or the
///   loadings keep an imaginary part above `imag_tol`; during a search this
///   becomes a penalty.
/// - `Ok(Ok(model))` otherwise.
pub fn realize_model(
    spec: &ModelSpecification, theta: &[f64], imag_tol: f64,
) -> AffineResult<Result<RealizedModel, EvalFailure>> {
    let resolved = spec.params().resolve(theta)?;
    let loadings = affine_loadings(&resolved, spec.maturities());
    Ok(build(&resolved, &loadings, spec.n_observed(), imag_tol))
}

fn build(
    resolved: &ResolvedParams<Complex64>,
    loadings: &AffineLoadings<Complex64>, n_observed: usize, imag_tol: f64,
) -> Result<RealizedModel, EvalFailure> {
    let params = resolved.realize(imag_tol)?;
    let loadings = loadings.realize(imag_tol)?;
    let system = StateSpace::from_parts(&params, &loadings, n_observed);
    Ok(RealizedModel { params, loadings, system })
}

pub(crate) fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    let (r, c) = a.dim();
    DMatrix::from_fn(r, c, |i, j| a[(i, j)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term_structure::core::{
        mask::ParameterMatrix,
        params::{MatrixName, ParameterSet},
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Layout of d, Z, H with one observed and one latent factor.
    // - Complex residuals surfacing as a recoverable failure.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify observed factors get an identity row in Z, zero intercept, and
    // zero measurement noise.
    //
    // Given
    // -----
    // - k = 2 (1 observed, 1 latent), m = 2, obs_sd = [0.1, 0.2].
    //
    // Expect
    // ------
    // - Z row 2 = [1, 0]; d[2] = 0; H = diag(0.01, 0.04, 0).
    fn from_parts_places_observed_factor_block() {
        // Arrange
        let mut set = ParameterSet::zeros(2, 2);
        set.set(ParameterMatrix::from_real(MatrixName::ObsSd, array![[0.1], [0.2]].view()));
        set.set(ParameterMatrix::from_real(MatrixName::Phi, array![[0.5, 0.0], [0.0, 0.8]].view()));
        set.set(ParameterMatrix::from_real(MatrixName::Delta1, array![[1.0], [1.0]].view()));
        let spec = ModelSpecification::new(set, vec![1, 4], 1, 1).expect("valid spec");

        // Act
        let model = realize_model(&spec, &[], 1e-10).expect("length ok").expect("real");
        let sys = &model.system;

        // Assert
        assert_eq!(sys.n_obs(), 3);
        assert_eq!(sys.design[(2, 0)], 1.0);
        assert_eq!(sys.design[(2, 1)], 0.0);
        assert_eq!(sys.obs_intercept[2], 0.0);
        assert!((sys.obs_cov[(0, 0)] - 0.01).abs() < 1e-15);
        assert!((sys.obs_cov[(1, 1)] - 0.04).abs() < 1e-15);
        assert_eq!(sys.obs_cov[(2, 2)], 0.0);
        assert_eq!(sys.design[(0, 0)], 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Ensure an imaginary component in a fixed cell is reported as a
    // recoverable failure rather than a structural error.
    //
    // Given
    // -----
    // - `lam_1` fixed at 0.1 + 0.5i.
    //
    // Expect
    // ------
    // - `Ok(Err(EvalFailure::ComplexResidual { .. }))`.
    fn realize_model_flags_complex_residual() {
        // Arrange
        let mut set = ParameterSet::zeros(1, 1);
        set.set(ParameterMatrix::from_complex(
            MatrixName::Lam1,
            array![[Complex64::new(0.1, 0.5)]].view(),
        ));
        let spec = ModelSpecification::new(set, vec![3], 0, 1).expect("valid spec");

        // Act
        let out = realize_model(&spec, &[], 1e-10).expect("length ok");

        // Assert
        assert!(matches!(out, Err(EvalFailure::ComplexResidual { .. })));
    }
}
