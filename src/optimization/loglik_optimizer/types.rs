//! loglik_optimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and Argmin solver aliases used by the
//! log-likelihood optimizer so the remaining optimizer code never spells
//! out `ndarray` or Argmin generics directly.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for parameter vectors, gradients,
//!   Hessians, and scalar costs (`Theta`, `Grad`, `Hessian`, `Cost`).
//! - Provide a standard map type for Argmin function-evaluation counters
//!   (`FnEvalMap`).
//! - Expose pre-wired L-BFGS and Nelder–Mead aliases over the common
//!   `(Theta, Grad, Cost)` numeric shapes; BFGS is built generically over
//!   its line search in `builders`.
//!
//! Conventions
//! -----------
//! - `Theta` and `Grad` are column vectors with length equal to the number
//!   of free parameters.
//! - `Hessian` is a dense square matrix; BFGS stores its inverse-Hessian
//!   approximation in the same type.
//! - `DEFAULT_LBFGS_MEM` is the L-BFGS history size used when options do
//!   not override it.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    neldermead::NelderMead,
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Parameter vector `θ` for log-likelihood optimization.
pub type Theta = Array1<f64>;

/// Gradient vector `∇ℓ(θ)` or `∇c(θ)`; same shape as `Theta`.
pub type Grad = Array1<f64>;

/// Dense Hessian (or inverse-Hessian) matrix, `n × n` for `n = Theta.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value used by the optimizer.
///
/// In this crate, this is the cost `c(θ) = -ℓ(θ)` derived from a
/// log-likelihood `ℓ(θ)`.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps human-readable counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Relative perturbation used to span the initial Nelder–Mead simplex.
pub const NELDER_MEAD_STEP: f64 = 0.05;

/// Absolute perturbation for simplex coordinates that start at zero.
pub const NELDER_MEAD_ZERO_STEP: f64 = 0.00025;

/// Hager–Zhang line search specialized to this crate’s numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// Derivative-free Nelder–Mead simplex solver.
pub type NelderMeadSolver = NelderMead<Theta, Cost>;
