//! rust_affine — masked-parameter affine term-structure models with Python
//! bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes affine model estimation to Python via the `_rust_affine`
//! extension module. When the `python-bindings` feature is enabled, this
//! module defines the Python-facing classes and the `term_structure`
//! submodule.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`term_structure`, `optimization`,
//!   `inference`) as the public crate surface.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_rust_affine` Python extension.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, input conversion, and error mapping.
//! - Python-visible types mirror the invariants of their Rust counterparts
//!   (`AffineModel`, `FittedModel`).
//!
//! Conventions
//! -----------
//! - Matrices cross the boundary as 2-D float arrays (or nested lists);
//!   masks as 2-D boolean arrays where `True` marks a free cell.
//! - Errors from core Rust code are converted to `ValueError` at the PyO3
//!   boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on [`term_structure`] directly and can
//!   ignore the items guarded by the `python-bindings` feature.
//! - A typical Rust flow: build a [`ParameterSet`] and mark free cells,
//!   wrap it in a [`ModelSpecification`], load a [`YieldPanel`], then call
//!   [`AffineModel::fit`].
//!
//! [`ParameterSet`]: term_structure::core::params::ParameterSet
//! [`ModelSpecification`]: term_structure::core::spec::ModelSpecification
//! [`YieldPanel`]: term_structure::core::data::YieldPanel
//! [`AffineModel::fit`]: term_structure::models::affine::AffineModel::fit

pub mod inference;
pub mod optimization;
pub mod term_structure;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::PyValueError,
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    term_structure::{
        core::{
            data::YieldPanel,
            guess::GuessVector,
            options::{AffineOptions, DEFAULT_GUESS_SCALE, DEFAULT_GUESS_SEED},
            params::MatrixName,
            spec::ModelSpecification,
        },
        models::{affine::AffineModel, fitted::FittedModel},
    },
    utils::{build_parameter_set, extract_f64_array, extract_f64_matrix, extract_mle_opts},
};

/// Affine — Python-facing wrapper for [`AffineModel`].
///
/// Constructed from Python as
/// `Affine(matrices, maturities, n_latent, /, n_observed=0, algorithm=None, ...)`
/// where `matrices` maps names (`"lam_0"`, `"phi"`, ...) to either a value
/// matrix (all cells fixed) or a `(values, mask)` pair.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_affine.term_structure", unsendable)]
pub struct Affine {
    pub inner: AffineModel,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl Affine {
    #[new]
    #[pyo3(
        signature = (
            matrices,
            maturities,
            n_latent,
            n_observed = 0,
            algorithm = None,
            line_searcher = None,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            max_fevals = None,
            lbfgs_mem = None,
            seed = None,
            guess_scale = None,
            std_errors = false,
        ),
        text_signature = "(matrices, maturities, n_latent, /, n_observed=0, algorithm='lbfgs', \
                          line_searcher='MoreThuente', tol_grad=None, tol_cost=None, \
                          max_iter=None, max_fevals=None, lbfgs_mem=None, seed=100, \
                          guess_scale=0.01, std_errors=False)"
    )]
    pub fn new(
        matrices: &Bound<'_, PyDict>, maturities: Vec<usize>, n_latent: usize, n_observed: usize,
        algorithm: Option<&str>, line_searcher: Option<&str>, tol_grad: Option<f64>,
        tol_cost: Option<f64>, max_iter: Option<usize>, max_fevals: Option<u64>,
        lbfgs_mem: Option<usize>, seed: Option<u64>, guess_scale: Option<f64>, std_errors: bool,
    ) -> PyResult<Self> {
        let params = build_parameter_set(matrices, n_latent + n_observed, maturities.len())?;
        let spec = ModelSpecification::new(params, maturities, n_observed, n_latent)?;
        let mle_opts = extract_mle_opts(
            algorithm,
            line_searcher,
            tol_grad,
            tol_cost,
            max_iter,
            max_fevals,
            lbfgs_mem,
        )?;
        let defaults = AffineOptions::default();
        let options = AffineOptions::new(
            mle_opts,
            defaults.eval,
            defaults.max_invalid_streak,
            seed.unwrap_or(DEFAULT_GUESS_SEED),
            guess_scale.unwrap_or(DEFAULT_GUESS_SCALE),
            std_errors,
        )?;
        Ok(Affine { inner: AffineModel::new(spec, options) })
    }

    /// Number of free parameters (length of a guess vector).
    #[getter]
    pub fn n_free(&self) -> usize {
        self.inner.spec().free_count()
    }

    /// Free-cell labels in guess order, e.g. `"phi[1,0]"`.
    #[getter]
    pub fn free_cells(&self) -> Vec<String> {
        self.inner.spec().free_cells().iter().map(ToString::to_string).collect()
    }

    /// Log-likelihood at `theta` (or the penalty value when infeasible).
    #[pyo3(signature = (theta, yields, factors = None))]
    pub fn loglike<'py>(
        &self, py: Python<'py>, theta: &Bound<'py, PyAny>, yields: &Bound<'py, PyAny>,
        factors: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<f64> {
        let panel = self.panel(yields, factors)?;
        let theta = extract_f64_array(py, theta)?;
        let theta = theta
            .as_slice()
            .map_err(|_| PyValueError::new_err("theta must be a contiguous float64 vector"))?;
        Ok(self.inner.evaluate_at(theta, &panel)?.loglik())
    }

    #[pyo3(signature = (yields, factors = None, guess = None))]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, yields: &Bound<'py, PyAny>,
        factors: Option<&Bound<'py, PyAny>>, guess: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<AffineFit> {
        let panel = self.panel(yields, factors)?;
        let guess = match guess {
            Some(raw) => {
                let arr = extract_f64_array(py, raw)?;
                let slice = arr
                    .as_slice()
                    .map_err(|_| PyValueError::new_err("guess must be a contiguous float64 vector"))?;
                Some(GuessVector::from(Array1::from(slice.to_vec())))
            }
            None => None,
        };
        let fitted = self.inner.fit(guess, &panel)?;
        Ok(AffineFit { inner: fitted.clone() })
    }

    #[getter]
    pub fn results(&self) -> PyResult<AffineFit> {
        Ok(AffineFit { inner: self.inner.fitted()?.clone() })
    }
}

#[cfg(feature = "python-bindings")]
impl Affine {
    fn panel(
        &self, yields: &Bound<'_, PyAny>, factors: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<YieldPanel> {
        let yields = extract_f64_matrix(yields)?;
        let factors = factors.map(extract_f64_matrix).transpose()?;
        Ok(YieldPanel::new(None, self.inner.spec().maturities().to_vec(), yields, factors)?)
    }
}

/// AffineFit — read-only view of a [`FittedModel`] for Python.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_affine.term_structure")]
pub struct AffineFit {
    pub inner: FittedModel,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl AffineFit {
    #[getter]
    pub fn theta_hat(&self) -> Vec<f64> {
        self.inner.theta_hat.to_vec()
    }

    #[getter]
    pub fn log_likelihood(&self) -> f64 {
        self.inner.log_likelihood
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.converged
    }

    #[getter]
    pub fn status(&self) -> String {
        self.inner.status.clone()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    pub fn std_errors(&self) -> Option<Vec<f64>> {
        self.inner.std_errors.as_ref().map(|se| se.to_vec())
    }

    /// Estimated matrix by name, as a list of rows.
    pub fn matrix(&self, name: &str) -> PyResult<Vec<Vec<f64>>> {
        let name: MatrixName = name.parse()?;
        Ok(rows(self.inner.matrix(name)))
    }

    pub fn fitted_yields(&self) -> Vec<Vec<f64>> {
        rows(&self.inner.fitted_yields())
    }

    #[getter]
    pub fn filtered_states(&self) -> Vec<Vec<f64>> {
        rows(&self.inner.filtered_states)
    }

    pub fn to_json(&self) -> PyResult<String> {
        Ok(self.inner.to_json()?)
    }

    #[staticmethod]
    pub fn from_json(text: &str) -> PyResult<Self> {
        Ok(AffineFit { inner: FittedModel::from_json(text)? })
    }
}

#[cfg(feature = "python-bindings")]
fn rows(a: &ndarray::Array2<f64>) -> Vec<Vec<f64>> {
    a.rows().into_iter().map(|r| r.to_vec()).collect()
}

/// _rust_affine — PyO3 module initializer for the Python extension.
///
/// Creates the `term_structure` submodule, attaches it to the parent
/// module, and registers it in `sys.modules` so dotted imports work.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_affine<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let term_structure_mod = PyModule::new(_py, "term_structure")?;
    term_structure(_py, m, &term_structure_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_affine.term_structure", term_structure_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn term_structure<'py>(
    _py: Python, rust_affine: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<Affine>()?;
    m.add_class::<AffineFit>()?;
    rust_affine.add_submodule(m)?;
    Ok(())
}
