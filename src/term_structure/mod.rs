//! term_structure — masked-parameter affine term-structure models.
//!
//! Purpose
//! -------
//! Specify an affine yield-curve model through eight parameter matrices
//! whose cells are individually free or fixed, price bonds with the
//! discrete-time recursion, cast the model in state-space form, and
//! estimate the free cells by Kalman-filter maximum likelihood.
//!
//! Layout
//! ------
//! - [`core`]: masks, parameter sets, specification, loadings, state space,
//!   Kalman filter, data containers and CSV loading, simulation, options.
//! - [`models`]: the estimation driver and fitted results.
//! - [`errors`]: [`AffineError`] / [`AffineResult`] and per-evaluation
//!   [`EvalFailure`] reasons.
//!
//! Conventions
//! -----------
//! - Free parameters are flattened in canonical matrix order (`lam_0`,
//!   `lam_1`, `delta_0`, `delta_1`, `mu`, `phi`, `sigma`, `obs_sd`), each
//!   matrix row-major.
//! - Maturities are integer numbers of model periods.

pub mod core;
pub mod errors;
pub mod models;

pub use self::errors::{AffineError, AffineResult, EvalFailure};

pub mod prelude {
    pub use super::core::{
        data::YieldPanel,
        guess::GuessVector,
        kalman::{Evaluation, evaluate},
        loader::{CsvSpec, load_yield_csv, read_yield_csv},
        mask::{Cell, ParameterMatrix, Region},
        options::{AffineOptions, EvalSettings},
        params::{MatrixName, ParameterSet},
        simulate::simulate_panel,
        spec::{ModelSpecification, StatePrior},
    };
    pub use super::errors::{AffineError, AffineResult, EvalFailure};
    pub use super::models::prelude::*;
}
