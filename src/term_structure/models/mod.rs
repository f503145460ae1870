//! models — user-facing affine model estimation.
//!
//! Purpose
//! -------
//! Sit on top of `term_structure::core` and the generic log-likelihood
//! optimizer: [`AffineModel`] implements [`LogLikelihood`] over a
//! [`YieldPanel`], drives the fit, and produces a serializable
//! [`FittedModel`].
//!
//! Key behaviors
//! -------------
//! - [`affine`]: likelihood, fit driver with divergence detection, optional
//!   standard errors, and parallel multi-start fitting.
//! - [`fitted`]: estimation results, fitted yields, Wald intervals, JSON
//!   persistence.
//! - [`notify`]: completion callbacks, logging through `tracing` by default.
//!
//! Invariants & assumptions
//! ------------------------
//! - A model instance is not shared across threads during a fit; its
//!   evaluation bookkeeping lives in a `RefCell`.
//! - Every fit resets the bookkeeping, so diagnostics always describe the
//!   most recent run.
//!
//! [`LogLikelihood`]: crate::optimization::loglik_optimizer::LogLikelihood
//! [`YieldPanel`]: crate::term_structure::core::data::YieldPanel

pub mod affine;
pub mod fitted;
pub mod notify;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::affine::{AffineModel, fit_multi_start};
pub use self::fitted::FittedModel;
pub use self::notify::{CompletionNotifier, FitReport, TracingNotifier};

pub mod prelude {
    pub use super::affine::{AffineModel, fit_multi_start};
    pub use super::fitted::FittedModel;
}
