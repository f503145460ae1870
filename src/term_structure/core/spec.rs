//! Validated affine model specification.
//!
//! Purpose
//! -------
//! Tie the masked parameter matrices to a maturity list, the observed and
//! latent factor counts, and the initial-state prior, and reject structurally
//! inconsistent combinations before any likelihood work happens.
//!
//! Key behaviors
//! -------------
//! - [`ModelSpecification::new`] checks factor counts, maturities, and every
//!   matrix shape.
//! - [`ModelSpecification::with_prior`] swaps in a [`StatePrior`] after
//!   checking its dimensions.
//! - [`ModelSpecification::check_panel`] verifies that a yield panel lines up
//!   with the specification (same maturities, enough factor columns).
//!
//! Invariants & assumptions
//! ------------------------
//! - `n_latent ≥ 1`; maturities are non-empty, strictly positive, and unique.
//! - Each matrix has the shape given by [`MatrixName::shape`] for
//!   `k = n_observed + n_latent` and `m = maturities.len()`.
//! - State ordering is `[observed factors; latent factors]`.
use crate::term_structure::{
    core::{
        data::YieldPanel,
        params::{FreeCell, MatrixName, ParameterSet},
    },
    errors::{AffineError, AffineResult},
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default variance scale for a diffuse initial state.
pub const DIFFUSE_KAPPA: f64 = 1e6;

/// Distribution of the first state `X_1` before `y_1` is observed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum StatePrior {
    /// Unconditional mean and covariance implied by `μ`, `Φ`, and `Σ`.
    #[default]
    Stationary,
    /// Zero mean and `kappa · I` covariance.
    Diffuse { kappa: f64 },
    /// Caller-supplied mean (`k`) and covariance (`k×k`).
    Fixed { mean: Array1<f64>, cov: Array2<f64> },
}

impl StatePrior {
    /// Diffuse prior with the default scale [`DIFFUSE_KAPPA`].
    pub fn diffuse() -> Self {
        StatePrior::Diffuse { kappa: DIFFUSE_KAPPA }
    }
}

/// Validated affine model: masked matrices, maturities, factor counts, prior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpecification {
    params: ParameterSet,
    maturities: Vec<usize>,
    n_observed: usize,
    n_latent: usize,
    prior: StatePrior,
}

impl ModelSpecification {
    /// Build a specification with the stationary prior.
    ///
    /// Parameters
    /// ----------
    /// - `params`: [`ParameterSet`]
    ///   Masked matrices; shapes must match `k = n_observed + n_latent` and
    ///   `m = maturities.len()`.
    /// - `maturities`: `Vec<usize>`
    ///   Maturities in data periods (e.g. months for monthly data).
    /// - `n_observed`, `n_latent`: factor counts.
    ///
    /// Errors
    /// ------
    /// - `AffineError::InvalidSpecification` for a zero latent count, an
    ///   empty maturity list, a zero or duplicated maturity, or a matrix
    ///   whose shape disagrees with the factor/maturity counts.
    pub fn new(
        params: ParameterSet, maturities: Vec<usize>, n_observed: usize, n_latent: usize,
    ) -> AffineResult<Self> {
        if n_latent == 0 {
            return Err(AffineError::InvalidSpecification {
                reason: "latent factor count must be positive".to_string(),
            });
        }
        if maturities.is_empty() {
            return Err(AffineError::InvalidSpecification {
                reason: "maturity list is empty".to_string(),
            });
        }
        let mut seen = HashSet::with_capacity(maturities.len());
        for &n in &maturities {
            if n == 0 {
                return Err(AffineError::InvalidSpecification {
                    reason: "maturities must be at least one period".to_string(),
                });
            }
            if !seen.insert(n) {
                return Err(AffineError::InvalidSpecification {
                    reason: format!("maturity {n} appears more than once"),
                });
            }
        }

        let k = n_observed + n_latent;
        let m = maturities.len();
        for matrix in params.iter() {
            let expected = matrix.name().shape(k, m);
            if matrix.shape() != expected {
                return Err(AffineError::InvalidSpecification {
                    reason: format!(
                        "`{}` has shape {:?} but {k} factors and {m} maturities require {:?}",
                        matrix.name(),
                        matrix.shape(),
                        expected
                    ),
                });
            }
        }

        Ok(Self { params, maturities, n_observed, n_latent, prior: StatePrior::Stationary })
    }

    /// Replace the initial-state prior.
    ///
    /// # Errors
    /// - `InvalidSpecification` if a diffuse `kappa` is not finite and
    ///   positive, or a fixed prior has the wrong dimension or non-finite
    ///   entries.
    pub fn with_prior(mut self, prior: StatePrior) -> AffineResult<Self> {
        let k = self.n_factors();
        match &prior {
            StatePrior::Stationary => {}
            StatePrior::Diffuse { kappa } => {
                if !kappa.is_finite() || *kappa <= 0.0 {
                    return Err(AffineError::InvalidSpecification {
                        reason: format!("diffuse prior scale must be finite and positive, got {kappa}"),
                    });
                }
            }
            StatePrior::Fixed { mean, cov } => {
                if mean.len() != k || cov.dim() != (k, k) {
                    return Err(AffineError::InvalidSpecification {
                        reason: format!(
                            "fixed prior needs a {k}-vector mean and {k}×{k} covariance, got {} and {:?}",
                            mean.len(),
                            cov.dim()
                        ),
                    });
                }
                if mean.iter().chain(cov.iter()).any(|v| !v.is_finite()) {
                    return Err(AffineError::InvalidSpecification {
                        reason: "fixed prior contains non-finite values".to_string(),
                    });
                }
            }
        }
        self.prior = prior;
        Ok(self)
    }

    /// Check that `panel` can be filtered under this specification.
    ///
    /// # Errors
    /// - `InvalidSpecification` if the panel maturities differ, or observed
    ///   factors are required but missing or of the wrong width.
    pub fn check_panel(&self, panel: &YieldPanel) -> AffineResult<()> {
        if panel.maturities() != self.maturities.as_slice() {
            return Err(AffineError::InvalidSpecification {
                reason: format!(
                    "panel maturities {:?} differ from model maturities {:?}",
                    panel.maturities(),
                    self.maturities
                ),
            });
        }
        if self.n_observed > 0 {
            let width = panel.factors().map_or(0, |f| f.ncols());
            if width != self.n_observed {
                return Err(AffineError::InvalidSpecification {
                    reason: format!(
                        "model has {} observed factors but the panel provides {width}",
                        self.n_observed
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn matrix_shape(&self, name: MatrixName) -> (usize, usize) {
        name.shape(self.n_factors(), self.n_maturities())
    }

    pub fn maturities(&self) -> &[usize] {
        &self.maturities
    }

    pub fn n_maturities(&self) -> usize {
        self.maturities.len()
    }

    pub fn n_observed(&self) -> usize {
        self.n_observed
    }

    pub fn n_latent(&self) -> usize {
        self.n_latent
    }

    /// State dimension `k`.
    pub fn n_factors(&self) -> usize {
        self.n_observed + self.n_latent
    }

    pub fn prior(&self) -> &StatePrior {
        &self.prior
    }

    /// Length of a parameter vector for this specification.
    pub fn free_count(&self) -> usize {
        self.params.free_count()
    }

    pub fn free_cells(&self) -> Vec<FreeCell> {
        self.params.free_cells()
    }
}
