//! loglik_optimizer — MLE-friendly, argmin-powered log-likelihood optimizer.
//!
//! Purpose
//! -------
//! Provide an Argmin-backed optimization layer for **maximizing
//! log-likelihoods** `ℓ(θ)`. Callers implement [`LogLikelihood`] and either
//! call [`maximize`] directly or go through the [`Minimizer`] strategy
//! trait, whose default implementation is [`ArgminMinimizer`].
//!
//! Key behaviors
//! -------------
//! - Convert `ℓ(θ)` into an Argmin cost `c(θ) = -ℓ(θ)` via
//!   [`adapter::ArgMinAdapter`], which also enforces the function-evaluation
//!   budget.
//! - Select L-BFGS, BFGS, or Nelder–Mead from [`Algorithm`], with a
//!   configurable [`LineSearcher`] for the quasi-Newton methods.
//! - Fall back to finite differences ([`finite_diff`]) when no analytic
//!   gradient exists, which is always the case for Kalman likelihoods.
//! - Normalize every run into an [`OptimOutcome`] whose `converged` flag is
//!   only set by genuine convergence.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes** `ℓ(θ)` by minimizing `-ℓ(θ)`.
//! - [`LogLikelihood::value`] treats infeasible inputs either as a finite
//!   penalty value or as a recoverable [`OptError`], never as a panic.
//! - Configuration types are validated on construction.
//!
//! Conventions
//! -----------
//! - Parameters are plain [`Theta`] vectors; mapping them onto structured
//!   model parameters happens in the model layer.
//! - Errors bubble up as [`OptResult<T>`] / [`OptError`]. Errors raised
//!   inside the objective keep their identity across the Argmin boundary.
//! - This module performs no logging of its own unless the `obs_slog`
//!   feature is enabled and `verbose` is set.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover sign conventions and budgets
//!   ([`adapter`]), solver construction ([`builders`]), finite differences,
//!   validation, and end-to-end solves of toy objectives ([`api`]).
//!
//! [`OptError`]: crate::optimization::errors::OptError
//! [`OptResult<T>`]: crate::optimization::errors::OptResult

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{ArgminMinimizer, Minimizer, maximize};
pub use self::traits::{Algorithm, LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::{ArgminMinimizer, Minimizer, maximize};
    pub use super::traits::{
        Algorithm, LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances,
    };
    pub use super::types::{Cost, Grad, Theta};
}
