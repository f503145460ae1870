//! Results of an affine-model fit.
//!
//! [`FittedModel`] is a self-contained snapshot: the specification it was
//! estimated under, the estimate `θ̂`, every parameter matrix resolved at
//! `θ̂`, the yield loadings, filtered states, and run diagnostics. It
//! serializes to JSON so estimates can be stored and reloaded without
//! refitting.
use crate::{
    inference::intervals::wald_intervals,
    term_structure::{
        core::{
            params::{FreeCell, MatrixName, ResolvedParams},
            recursion::AffineLoadings,
            spec::ModelSpecification,
        },
        errors::{AffineError, AffineResult},
    },
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Estimated affine model.
///
/// Fields
/// ------
/// - `theta_hat`: free-parameter estimate, aligned with `free_cells`.
/// - `params`: all eight matrices with `θ̂` substituted.
/// - `loadings`: `(A_n, B_n)` per maturity at `θ̂`.
/// - `log_likelihood`: `ℓ(θ̂)`.
/// - `converged`, `status`, `iterations`: optimizer report.
/// - `evaluations`, `invalid_evaluations`: likelihood evaluations during
///   the run and how many of them were penalized.
/// - `filtered_states`: `x_{t|t}` (T×k) at `θ̂`.
/// - `std_errors`: observed-information standard errors, if requested and
///   computable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub spec: ModelSpecification,
    pub theta_hat: Array1<f64>,
    pub params: ResolvedParams<f64>,
    pub loadings: AffineLoadings<f64>,
    pub free_cells: Vec<FreeCell>,
    pub log_likelihood: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub evaluations: usize,
    pub invalid_evaluations: usize,
    pub filtered_states: Array2<f64>,
    pub std_errors: Option<Array1<f64>>,
}

impl FittedModel {
    /// Estimated matrix by name.
    pub fn matrix(&self, name: MatrixName) -> &Array2<f64> {
        self.params.get(name)
    }

    /// Model-implied yields `A + B x_{t|t}` (T×m).
    pub fn fitted_yields(&self) -> Array2<f64> {
        let mut fitted = self.filtered_states.dot(&self.loadings.b.t());
        for mut row in fitted.rows_mut() {
            row += &self.loadings.a;
        }
        fitted
    }

    /// Wald intervals `(cell, lower, upper)` for every free parameter.
    ///
    /// # Errors
    /// - `Optimizer` wrapping the interval error for an invalid `level`.
    /// - `StdErrorsUnavailable` if standard errors were not computed.
    pub fn confidence_intervals(&self, level: f64) -> AffineResult<Vec<(FreeCell, f64, f64)>> {
        let se = self.std_errors.as_ref().ok_or(AffineError::StdErrorsUnavailable)?;
        let bounds = wald_intervals(&self.theta_hat, se, level)?;
        Ok(self.free_cells.iter().zip(bounds).map(|(c, (lo, hi))| (*c, lo, hi)).collect())
    }

    pub fn to_json(&self) -> AffineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> AffineResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Write the model as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> AffineResult<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        tracing::debug!(path = %path.as_ref().display(), "saved fitted model");
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> AffineResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
