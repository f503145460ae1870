//! inference — standard errors and interval estimates for fitted models.
//!
//! Purpose
//! -------
//! Provide post-estimation uncertainty quantification on top of a fitted
//! affine model: observed-information covariance from a finite-difference
//! Hessian of the Kalman log-likelihood, and Wald intervals / z-statistics
//! built from the resulting standard errors.
//!
//! Key behaviors
//! -------------
//! - [`calc_covariance`] / [`calc_standard_errors`]: invert the observed
//!   information `J(θ̂)` with an eigenvalue-truncated pseudoinverse.
//! - [`wald_intervals`] / [`z_statistics`]: normal-approximation summaries
//!   using `statrs` quantiles.
//!
//! Invariants & assumptions
//! ------------------------
//! - Everything is expressed in the free-parameter vector `θ`, in the same
//!   order as the fitted model's free cells.
//! - Failures are reported as [`OptResult`] errors, never panics.
//!
//! Conventions
//! -----------
//! - The Hessian is taken on the summed log-likelihood scale, so no sample
//!   size rescaling is applied.
//! - Functions here are pure: no logging, no global state.
//!
//! [`OptResult`]: crate::optimization::errors::OptResult

pub mod hessian;
pub mod intervals;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::hessian::{calc_covariance, calc_standard_errors};
pub use self::intervals::{wald_intervals, z_statistics};

pub mod prelude {
    pub use super::hessian::{calc_covariance, calc_standard_errors};
    pub use super::intervals::{wald_intervals, z_statistics};
}
