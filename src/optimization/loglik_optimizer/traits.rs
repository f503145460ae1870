//! Public API surface for log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait users implement for their model.
//! - [`MLEOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`Algorithm`]: which Argmin solver drives the search.
//! - [`LineSearcher`]: choice of line search used by the quasi-Newton solvers.
//! - [`OptimOutcome`]: normalized result returned by the high-level `maximize` API.
//!
//! Convention: we *maximize* a user log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = -ℓ(θ)`. If an analytic gradient is provided, it should be the gradient
//! of the log-likelihood (`∇ℓ(θ)`); the adapter flips the sign as needed.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Cost, FnEvalMap, Grad, Theta,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// User-implemented log-likelihood interface.
///
/// You maximize `ℓ(θ)`; internally we minimize the cost `c(θ) = -ℓ(θ)`.
/// If you provide an analytic gradient, return the gradient of the
/// log-likelihood `∇ℓ(θ)` (the adapter flips the sign to match the cost).
///
/// - `type Data`: per-model data carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`.
///   - Errors: return a descriptive `OptError` for invalid inputs or model failures.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook to reject
///   obviously invalid `θ`/`data` pairs. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇ℓ(θ)`.
///   If not implemented, robust finite differences are used automatically.
pub trait LogLikelihood {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS and BFGS solvers.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Solver family used by [`maximize`](crate::optimization::loglik_optimizer::maximize).
///
/// - `Lbfgs`: limited-memory quasi-Newton with the configured line search.
/// - `Bfgs`: dense quasi-Newton; keeps an `n × n` inverse-Hessian estimate.
/// - `NelderMead`: derivative-free simplex search; ignores `tol_grad` and the
///   line-search choice.
///
/// Parsing is case-insensitive and also accepts `"l-bfgs"` and
/// `"nelder-mead"` / `"nm"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    Lbfgs,
    Bfgs,
    NelderMead,
}

impl FromStr for Algorithm {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lbfgs" | "l-bfgs" => Ok(Algorithm::Lbfgs),
            "bfgs" => Ok(Algorithm::Bfgs),
            "neldermead" | "nelder-mead" | "nm" => Ok(Algorithm::NelderMead),
            _ => Err(OptError::InvalidAlgorithm {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'lbfgs', 'bfgs' or 'neldermead'.",
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `algorithm: Algorithm` — solver family.
/// - `line_searcher: LineSearcher` — line search used by L-BFGS / BFGS.
/// - `verbose: bool` — if `true`, attaches an observer (behind the `obs_slog`
///   feature) and prints progress.
/// - `lbfgs_mem: Option<usize>` — L-BFGS history size.
/// - `max_fevals: Option<u64>` — hard cap on objective evaluations,
///   including those spent on finite-difference gradients.
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = None`, `max_iter = 300`
/// - `algorithm`: `Lbfgs`, `line_searcher`: `MoreThuente`
/// - `verbose`: `false`, `lbfgs_mem`: `None` (uses 7), `max_fevals`: `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub algorithm: Algorithm,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
    pub max_fevals: Option<u64>,
}

impl MLEOptions {
    /// Create a new set of optimizer options.
    ///
    /// Numeric tolerances are validated inside [`Tolerances::new`]; this
    /// constructor only checks the L-BFGS memory.
    pub fn new(
        tols: Tolerances, algorithm: Algorithm, line_searcher: LineSearcher, verbose: bool,
        lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, algorithm, line_searcher, verbose, lbfgs_mem, max_fevals: None })
    }

    /// Cap the number of objective evaluations.
    ///
    /// # Errors
    /// - [`OptError::InvalidMaxFevals`] if `max == 0`.
    pub fn with_max_fevals(mut self, max: u64) -> OptResult<Self> {
        if max == 0 {
            return Err(OptError::InvalidMaxFevals {
                max,
                reason: "Maximum function evaluations must be greater than zero.",
            });
        }
        self.max_fevals = Some(max);
        Ok(self)
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(300) },
            algorithm: Algorithm::Lbfgs,
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
            max_fevals: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold
///   (for Nelder–Mead: when the simplex cost standard deviation does).
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for non-finite or non-positive tolerances.
    /// - `OptError::InvalidMaxIter` if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by `maximize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best **log-likelihood** value `ℓ(θ)` (not the cost).
/// - `converged`: `true` only if the solver met its own convergence test
///   (or reached a target cost); budget exhaustion is not convergence.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`
///   (cost_count, gradient_count, ...).
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// Performs:
    /// - `theta_hat` check via `validate_theta_hat` (present and all finite).
    /// - `value` check via `validate_value` (finite).
    /// - Maps `TerminationStatus` into `(converged, status)`.
    /// - Computes `grad_norm` if a gradient was provided.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let converged = matches!(
            termination,
            TerminationStatus::Terminated(
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached
            )
        );
        let status = match termination {
            TerminationStatus::NotTerminated => "Not terminated".to_string(),
            TerminationStatus::Terminated(reason) => format!("{reason:?}"),
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }

    /// Total objective evaluations, summed over argmin's counters whose name
    /// mentions the cost.
    pub fn cost_evaluations(&self) -> u64 {
        self.fn_evals.iter().filter(|(k, _)| k.contains("cost")).map(|(_, v)| *v).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Parsing of `Algorithm` and `LineSearcher` names.
    // - Validation in `Tolerances::new` and `MLEOptions::with_max_fevals`.
    // - Mapping of termination statuses into the `converged` flag.
    //
    // They intentionally DO NOT cover:
    // - Running solvers, which the `api` tests exercise.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify case-insensitive parsing of algorithm names and rejection of
    // unknown names.
    //
    // Given
    // -----
    // - The strings "BFGS", "nelder-mead", and "newton".
    //
    // Expect
    // ------
    // - The first two parse; the last returns `InvalidAlgorithm`.
    fn algorithm_from_str_accepts_aliases_and_rejects_unknown() {
        // Arrange / Act
        let bfgs = Algorithm::from_str("BFGS");
        let nm = Algorithm::from_str("nelder-mead");
        let bad = Algorithm::from_str("newton");

        // Assert
        assert_eq!(bfgs, Ok(Algorithm::Bfgs));
        assert_eq!(nm, Ok(Algorithm::NelderMead));
        assert!(matches!(bad, Err(OptError::InvalidAlgorithm { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Ensure `Tolerances::new` refuses an all-`None` configuration and
    // non-positive iteration caps.
    //
    // Given
    // -----
    // - `(None, None, None)` and `(None, None, Some(0))`.
    //
    // Expect
    // ------
    // - `NoTolerancesProvided` and `InvalidMaxIter` respectively.
    fn tolerances_new_rejects_empty_and_zero_iterations() {
        // Arrange / Act
        let empty = Tolerances::new(None, None, None);
        let zero = Tolerances::new(None, None, Some(0));

        // Assert
        assert_eq!(empty, Err(OptError::NoTolerancesProvided));
        assert!(matches!(zero, Err(OptError::InvalidMaxIter { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Check that a zero evaluation budget is rejected and a positive one is
    // stored.
    //
    // Given
    // -----
    // - Default `MLEOptions`.
    //
    // Expect
    // ------
    // - `with_max_fevals(0)` errors; `with_max_fevals(50)` stores `Some(50)`.
    fn with_max_fevals_validates_budget() {
        // Arrange
        let opts = MLEOptions::default();

        // Act
        let zero = opts.clone().with_max_fevals(0);
        let fifty = opts.with_max_fevals(50).expect("positive budget should be accepted");

        // Assert
        assert!(matches!(zero, Err(OptError::InvalidMaxFevals { .. })));
        assert_eq!(fifty.max_fevals, Some(50));
    }

    #[test]
    // Purpose
    // -------
    // Confirm that only genuine convergence sets `converged`, while budget
    // exhaustion does not.
    //
    // Given
    // -----
    // - Identical solver states terminated by `SolverConverged` and by
    //   `MaxItersReached`.
    //
    // Expect
    // ------
    // - `converged` is `true` for the first and `false` for the second.
    fn outcome_new_distinguishes_convergence_from_budget_exhaustion() {
        // Arrange
        let theta = array![0.5, -0.5];

        // Act
        let ok = OptimOutcome::new(
            Some(theta.clone()),
            -1.0,
            TerminationStatus::Terminated(TerminationReason::SolverConverged),
            12,
            FnEvalMap::new(),
            None,
        )
        .expect("valid outcome");
        let capped = OptimOutcome::new(
            Some(theta),
            -1.0,
            TerminationStatus::Terminated(TerminationReason::MaxItersReached),
            300,
            FnEvalMap::new(),
            Some(array![3.0, 4.0]),
        )
        .expect("valid outcome");

        // Assert
        assert!(ok.converged);
        assert!(!capped.converged);
        assert_eq!(capped.status, "MaxItersReached");
        assert_eq!(capped.grad_norm, Some(5.0));
    }
}
