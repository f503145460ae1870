//! High-level entry points for maximizing a user-provided `LogLikelihood`.
//!
//! [`maximize`] selects a solver from [`MLEOptions::algorithm`], wraps the
//! model in an `ArgMinAdapter` (which *minimizes* `-ℓ(θ)` under the
//! configured evaluation budget), and delegates to the matching runner.
//! [`Minimizer`] is the seam that lets model code swap that whole pipeline
//! for another optimizer; [`ArgminMinimizer`] is the default strategy.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{
            build_bfgs, build_nelder_mead, build_optimizer_hager_zhang,
            build_optimizer_more_thuente,
        },
        run::{run_bfgs, run_lbfgs, run_nelder_mead},
        traits::{Algorithm, LineSearcher, LogLikelihood, MLEOptions},
        types::{HagerZhangLS, MoreThuenteLS},
    },
};

/// Pluggable maximization strategy.
///
/// Implementors receive the model, a starting vector, the model data, and
/// the options, and must return the best point found together with its
/// log-likelihood. Model layers are generic over this trait so tests and
/// callers can substitute their own optimizer.
pub trait Minimizer {
    fn maximize<F: LogLikelihood>(
        &self, f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
    ) -> OptResult<OptimOutcome>;
}

/// Default [`Minimizer`] backed by Argmin; forwards to [`maximize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArgminMinimizer;

impl Minimizer for ArgminMinimizer {
    fn maximize<F: LogLikelihood>(
        &self, f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
    ) -> OptResult<OptimOutcome> {
        maximize(f, theta0, data, opts)
    }
}

/// Maximize a log-likelihood `ℓ(θ)` with the configured algorithm.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Wraps `(f, data)` in an `ArgMinAdapter` that exposes `c(θ) = -ℓ(θ)` and
///   enforces `opts.max_fevals`.
/// - Dispatches on `opts.algorithm`:
///   - `Lbfgs` / `Bfgs`: quasi-Newton with `opts.line_searcher`.
///   - `NelderMead`: simplex spanned around `theta0`.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder errors (invalid tolerances).
/// - Propagates runtime errors from the runner, including
///   `FunctionEvaluationLimit` when the budget is exhausted.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use rust_affine::optimization::{
///     errors::OptResult,
///     loglik_optimizer::{maximize, MLEOptions, LogLikelihood, Theta},
/// };
///
/// struct Gaussian;
/// impl LogLikelihood for Gaussian {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Gaussian, array![0.1, -0.2, 0.3], &(), &MLEOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), rust_affine::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::with_budget(f, data, opts.max_fevals);
    match (opts.algorithm, opts.line_searcher) {
        (Algorithm::Lbfgs, LineSearcher::MoreThuente) => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        (Algorithm::Lbfgs, LineSearcher::HagerZhang) => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        (Algorithm::Bfgs, LineSearcher::MoreThuente) => {
            let solver = build_bfgs(MoreThuenteLS::new(), opts)?;
            run_bfgs(theta0, opts, problem, solver)
        }
        (Algorithm::Bfgs, LineSearcher::HagerZhang) => {
            let solver = build_bfgs(HagerZhangLS::new(), opts)?;
            run_bfgs(theta0, opts, problem, solver)
        }
        (Algorithm::NelderMead, _) => {
            let solver = build_nelder_mead(&theta0, opts)?;
            run_nelder_mead(opts, problem, solver)
        }
    }
}
