//! Completion notification for long-running fits.
//!
//! A fit can take minutes, so callers may attach a [`CompletionNotifier`]
//! that receives a [`FitReport`] when the run ends, successfully or not.
//! The default [`TracingNotifier`] emits a single structured log event.
use serde::{Deserialize, Serialize};

/// Summary of a finished fit.
///
/// `log_likelihood` is the value at the returned estimate (or at the best
/// valid point for a non-converged run) and is `None` when no valid
/// evaluation happened. `error` carries the display text of the error
/// returned to the caller, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub converged: bool,
    pub status: String,
    pub log_likelihood: Option<f64>,
    pub evaluations: usize,
    pub invalid_evaluations: usize,
    pub error: Option<String>,
}

/// Receives a report once per fit.
pub trait CompletionNotifier: Send + Sync {
    fn notify(&self, report: &FitReport);
}

/// Logs the report through `tracing`: `info` on convergence, `warn`
/// otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TracingNotifier;

impl CompletionNotifier for TracingNotifier {
    fn notify(&self, report: &FitReport) {
        if report.converged {
            tracing::info!(
                status = %report.status,
                log_likelihood = ?report.log_likelihood,
                evaluations = report.evaluations,
                invalid = report.invalid_evaluations,
                "affine fit converged"
            );
        } else {
            tracing::warn!(
                status = %report.status,
                log_likelihood = ?report.log_likelihood,
                evaluations = report.evaluations,
                invalid = report.invalid_evaluations,
                error = ?report.error,
                "affine fit did not converge"
            );
        }
    }
}
