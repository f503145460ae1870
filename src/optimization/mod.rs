//! optimization — MLE stack and unified optimizer error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer used to fit affine term-structure models:
//! an Argmin-backed log-likelihood optimizer and a single error/result
//! surface. Model code implements a log-likelihood, chooses options, and
//! obtains fitted parameters and diagnostics without touching solver
//! generics.
//!
//! Key behaviors
//! -------------
//! - `loglik_optimizer`: maximize `ℓ(θ)` with L-BFGS, BFGS, or Nelder–Mead
//!   behind a pluggable `Minimizer` strategy.
//! - `errors`: normalize configuration issues, numerical failures, budget
//!   exhaustion, and backend errors into `OptError` / `OptResult<T>`.
//!
//! Conventions
//! -----------
//! - Solvers conceptually maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`;
//!   outcomes are reported on the `ℓ` scale.
//! - Public entrypoints that can fail return `OptResult<T>`; callers never
//!   see raw Argmin errors.
//! - This module avoids I/O; the model layer is responsible for logging.

pub mod errors;
pub mod loglik_optimizer;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
}
