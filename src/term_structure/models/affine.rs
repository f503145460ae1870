//! Affine term-structure model: Kalman log-likelihood and estimation driver.
//!
//! This module wires a [`ModelSpecification`] to the [`LogLikelihood`]
//! trait and drives the generic optimizer over the free parameters. Each
//! call to `value` resolves the masked matrices, runs the bond-pricing
//! recursion, builds the state-space system and filters the panel.
//! Numerically infeasible points score a large negative penalty so the
//! search can continue; the model keeps an [`EvalTracker`] so that a run
//! stuck in the infeasible region is aborted and a non-converged run still
//! reports its best valid point.
//!
//! Outcomes of [`AffineModel::fit`]:
//! - converged: `Ok(&FittedModel)`, also cached on the model;
//! - stopped early with at least one valid evaluation:
//!   `Err(ConvergenceFailure)` carrying the best fitted snapshot;
//! - too many consecutive or only penalized evaluations:
//!   `Err(NumericalDivergence)`;
//! - structural problems (guess length, non-finite guess, panel mismatch,
//!   bad optimizer options): the matching error before any evaluation.
use crate::{
    inference::hessian::calc_standard_errors,
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            ArgminMinimizer, Cost, LogLikelihood, Minimizer, OptimOutcome, Theta,
            validation::validate_theta_input,
        },
    },
    term_structure::{
        core::{
            data::YieldPanel,
            guess::GuessVector,
            kalman::{Evaluation, evaluate, filter_at},
            options::AffineOptions,
            spec::ModelSpecification,
            tracker::EvalTracker,
        },
        errors::{AffineError, AffineResult},
        models::{
            fitted::FittedModel,
            notify::{CompletionNotifier, FitReport, TracingNotifier},
        },
    },
};
use ndarray::Array1;
use rayon::prelude::*;
use std::{cell::RefCell, sync::Arc};

/// Affine model with masked parameters, estimated by Kalman-filter MLE.
///
/// Holds the specification and options, per-run evaluation bookkeeping,
/// and the last successful fit. A model is single-threaded (the tracker
/// lives in a `RefCell`); use [`fit_multi_start`] to run several starts in
/// parallel.
pub struct AffineModel {
    spec: ModelSpecification,
    options: AffineOptions,
    tracker: RefCell<EvalTracker>,
    fitted: Option<FittedModel>,
    notifier: Arc<dyn CompletionNotifier>,
}

impl std::fmt::Debug for AffineModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffineModel")
            .field("spec", &self.spec)
            .field("options", &self.options)
            .field("tracker", &self.tracker)
            .field("fitted", &self.fitted.is_some())
            .finish()
    }
}

impl AffineModel {
    pub fn new(spec: ModelSpecification, options: AffineOptions) -> Self {
        Self {
            spec,
            options,
            tracker: RefCell::new(EvalTracker::new()),
            fitted: None,
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Replace the default logging notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn CompletionNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn spec(&self) -> &ModelSpecification {
        &self.spec
    }

    pub fn options(&self) -> &AffineOptions {
        &self.options
    }

    /// Evaluation bookkeeping of the most recent run.
    pub fn diagnostics(&self) -> EvalTracker {
        self.tracker.borrow().clone()
    }

    /// Last successful fit.
    ///
    /// # Errors
    /// - `ModelNotFitted` before a fit has converged.
    pub fn fitted(&self) -> AffineResult<&FittedModel> {
        self.fitted.as_ref().ok_or(AffineError::ModelNotFitted)
    }

    /// Seeded random starting vector from the options' seed and scale.
    pub fn initial_guess(&self) -> GuessVector {
        GuessVector::seeded(
            self.spec.free_count(),
            self.options.guess_scale,
            self.options.guess_seed,
        )
    }

    /// Score `theta` without touching the run bookkeeping.
    pub fn evaluate_at(&self, theta: &[f64], panel: &YieldPanel) -> AffineResult<Evaluation> {
        evaluate(&self.spec, theta, panel, &self.options.eval)
    }

    /// Estimate the free parameters with the default Argmin optimizer.
    ///
    /// `guess = None` draws the starting vector from
    /// [`AffineModel::initial_guess`].
    pub fn fit(
        &mut self, guess: Option<GuessVector>, panel: &YieldPanel,
    ) -> AffineResult<&FittedModel> {
        self.fit_with(&ArgminMinimizer, guess, panel)
    }

    /// Estimate with a caller-supplied [`Minimizer`].
    ///
    /// # Errors
    /// - `InvalidSpecification` if `panel` does not match the model.
    /// - `ShapeMismatch` / `NonFiniteGuess` for a bad guess; no evaluation
    ///   happens in that case.
    /// - `ConvergenceFailure`, `NumericalDivergence`, or `Optimizer` as
    ///   described in the module docs.
    pub fn fit_with<M: Minimizer>(
        &mut self, minimizer: &M, guess: Option<GuessVector>, panel: &YieldPanel,
    ) -> AffineResult<&FittedModel> {
        self.spec.check_panel(panel)?;
        let guess = guess.unwrap_or_else(|| self.initial_guess());
        guess.validate(&self.spec)?;
        self.tracker.borrow_mut().reset();

        let span = tracing::info_span!(
            "affine_fit",
            n_free = self.spec.free_count(),
            n_periods = panel.len(),
            algorithm = ?self.options.mle_opts.algorithm,
        );
        let _enter = span.enter();
        tracing::info!("starting affine fit");

        let run = minimizer.maximize(&*self, guess.into_inner(), panel, &self.options.mle_opts);
        let result = self.finish(run, panel);
        self.notifier.notify(&self.report(&result));
        let fitted = result?;
        Ok(self.fitted.insert(fitted))
    }

    // ---- Helper Methods ----

    fn finish(&self, run: OptResult<OptimOutcome>, panel: &YieldPanel) -> AffineResult<FittedModel> {
        let best = self.tracker.borrow().best().cloned();
        match run {
            Ok(outcome) => {
                tracing::debug!(
                    status = %outcome.status,
                    iterations = outcome.iterations,
                    cost_evaluations = outcome.cost_evaluations(),
                    "optimizer finished"
                );
                let Some((best_theta, best_ll)) = best else {
                    return Err(self.divergence());
                };
                // A point scored at the penalty cannot be filtered; fall back
                // to the best valid evaluation.
                let penalized = outcome.value <= -self.options.eval.penalty;
                let (theta, converged) = if !penalized
                    && (outcome.converged || outcome.value >= best_ll)
                {
                    (outcome.theta_hat, outcome.converged)
                } else {
                    (best_theta, false)
                };
                let fitted =
                    self.build_fitted(&theta, panel, converged, outcome.status.clone(), outcome.iterations)?;
                if converged {
                    Ok(fitted)
                } else {
                    Err(AffineError::ConvergenceFailure {
                        status: outcome.status,
                        best: Box::new(fitted),
                    })
                }
            }
            Err(OptError::PersistentInvalidLikelihood { .. }) => Err(self.divergence()),
            Err(err) if err.is_configuration() => Err(err.into()),
            Err(err) => match best {
                Some((theta, _)) => {
                    let status = err.to_string();
                    let fitted = self.build_fitted(&theta, panel, false, status.clone(), 0)?;
                    Err(AffineError::ConvergenceFailure { status, best: Box::new(fitted) })
                }
                None if self.tracker.borrow().evaluations() > 0 => Err(self.divergence()),
                None => Err(err.into()),
            },
        }
    }

    fn divergence(&self) -> AffineError {
        let tracker = self.tracker.borrow();
        AffineError::NumericalDivergence {
            invalid_evaluations: tracker.invalid_evaluations(),
            last_failure: tracker.last_failure_text(),
        }
    }

    fn build_fitted(
        &self, theta: &Theta, panel: &YieldPanel, converged: bool, status: String,
        iterations: usize,
    ) -> AffineResult<FittedModel> {
        let (model, out) = filter_at(&self.spec, &theta.to_vec(), panel, self.options.eval.imag_tol)?;
        let std_errors =
            if self.options.compute_std_errors { self.standard_errors(theta, panel) } else { None };
        let tracker = self.tracker.borrow();
        Ok(FittedModel {
            spec: self.spec.clone(),
            theta_hat: theta.clone(),
            params: model.params,
            loadings: model.loadings,
            free_cells: self.spec.free_cells(),
            log_likelihood: out.log_likelihood,
            converged,
            status,
            iterations,
            evaluations: tracker.evaluations(),
            invalid_evaluations: tracker.invalid_evaluations(),
            filtered_states: out.filtered_states,
            std_errors,
        })
    }

    /// Observed-information SEs; `None` (with a warning) when the Hessian
    /// stencil leaves the feasible region.
    fn standard_errors(&self, theta: &Theta, panel: &YieldPanel) -> Option<Array1<f64>> {
        let neg_loglik = |t: &Array1<f64>| match self.evaluate_at(&t.to_vec(), panel) {
            Ok(Evaluation::Valid(ll)) => -ll,
            _ => f64::NAN,
        };
        match calc_standard_errors(&neg_loglik, theta) {
            Ok(se) => Some(se),
            Err(err) => {
                tracing::warn!(error = %err, "standard errors unavailable");
                None
            }
        }
    }

    fn report(&self, result: &AffineResult<FittedModel>) -> FitReport {
        let tracker = self.tracker.borrow();
        let (converged, status, log_likelihood, error) = match result {
            Ok(fitted) => (true, fitted.status.clone(), Some(fitted.log_likelihood), None),
            Err(AffineError::ConvergenceFailure { status, best }) => {
                (false, status.clone(), Some(best.log_likelihood), result.as_ref().err())
            }
            Err(err) => (false, "failed".to_string(), tracker.best().map(|(_, ll)| *ll), Some(err)),
        };
        FitReport {
            converged,
            status,
            log_likelihood,
            evaluations: tracker.evaluations(),
            invalid_evaluations: tracker.invalid_evaluations(),
            error: error.map(ToString::to_string),
        }
    }
}

impl LogLikelihood for AffineModel {
    type Data = YieldPanel;

    /// `ℓ(θ)` on `panel`, or `-penalty` for an infeasible `θ`.
    ///
    /// # Errors
    /// - `ModelError` for structural problems surfaced by `evaluate`.
    /// - `PersistentInvalidLikelihood` once more than `max_invalid_streak`
    ///   consecutive evaluations have been penalized.
    fn value(&self, theta: &Theta, data: &YieldPanel) -> OptResult<Cost> {
        let eval = self
            .evaluate_at(&theta.to_vec(), data)
            .map_err(|e| OptError::ModelError { text: e.to_string() })?;
        if let Some(failure) = eval.failure() {
            tracing::trace!(%failure, "penalized evaluation");
        }
        let mut tracker = self.tracker.borrow_mut();
        tracker.record(theta, &eval);
        if tracker.streak_exceeded(self.options.max_invalid_streak) {
            tracing::warn!(streak = tracker.streak(), "aborting: persistent invalid likelihood");
            return Err(OptError::PersistentInvalidLikelihood {
                streak: tracker.streak(),
                last_failure: tracker.last_failure_text(),
            });
        }
        Ok(eval.loglik())
    }

    /// Length/finiteness of `θ` and panel compatibility.
    fn check(&self, theta: &Theta, data: &YieldPanel) -> OptResult<()> {
        validate_theta_input(theta, self.spec.free_count())?;
        self.spec.check_panel(data).map_err(|e| OptError::ModelError { text: e.to_string() })
    }
}

/// Fit once per seed in parallel and keep the highest log-likelihood.
///
/// Each start uses `options` with `guess_seed` replaced by the seed.
///
/// # Errors
/// - `InvalidSpecification` if `seeds` is empty.
/// - If no start converges: the non-converged result with the highest
///   log-likelihood (`ConvergenceFailure`), otherwise the first start's
///   error.
pub fn fit_multi_start(
    spec: &ModelSpecification, options: &AffineOptions, panel: &YieldPanel, seeds: &[u64],
) -> AffineResult<FittedModel> {
    if seeds.is_empty() {
        return Err(AffineError::InvalidSpecification {
            reason: "multi-start fit needs at least one seed".to_string(),
        });
    }
    let results: Vec<AffineResult<FittedModel>> = seeds
        .par_iter()
        .map(|&seed| {
            let mut opts = options.clone();
            opts.guess_seed = seed;
            let mut model = AffineModel::new(spec.clone(), opts);
            model.fit(None, panel).cloned()
        })
        .collect();

    let mut best_ok: Option<FittedModel> = None;
    let mut best_err: Option<AffineError> = None;
    for result in results {
        match result {
            Ok(fitted) => {
                if best_ok.as_ref().map_or(true, |b| fitted.log_likelihood > b.log_likelihood) {
                    best_ok = Some(fitted);
                }
            }
            Err(err) => {
                let replace = match (&best_err, &err) {
                    (None, _) => true,
                    (
                        Some(AffineError::ConvergenceFailure { best: old, .. }),
                        AffineError::ConvergenceFailure { best: new, .. },
                    ) => new.log_likelihood > old.log_likelihood,
                    (Some(AffineError::ConvergenceFailure { .. }), _) => false,
                    (Some(_), AffineError::ConvergenceFailure { .. }) => true,
                    (Some(_), _) => false,
                };
                if replace {
                    best_err = Some(err);
                }
            }
        }
    }
    match (best_ok, best_err) {
        (Some(fitted), _) => {
            tracing::info!(seeds = seeds.len(), log_likelihood = fitted.log_likelihood, "multi-start fit done");
            Ok(fitted)
        }
        (None, Some(err)) => Err(err),
        (None, None) => Err(AffineError::ModelNotFitted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        optimization::loglik_optimizer::{
            Algorithm, FnEvalMap, LineSearcher, MLEOptions, Tolerances,
        },
        term_structure::core::{
            mask::ParameterMatrix,
            params::{MatrixName, ParameterSet},
            simulate::simulate_panel,
        },
    };
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};
    use std::sync::Mutex;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `LogLikelihood` conformance (`check`, `value`, penalty bookkeeping).
    // - Fit outcomes: convergence, early stop, divergence, bad guesses, and
    //   a reported optimum at a penalized point.
    // - Notifier delivery and multi-start selection.
    //
    // They intentionally DO NOT cover:
    // - Multi-factor recovery on realistic panels (see the integration
    //   tests).
    // -------------------------------------------------------------------------

    /// One latent factor, yields at 1 and 4 periods, δ0 free.
    fn spec(phi: f64) -> ModelSpecification {
        let mut set = ParameterSet::zeros(1, 2);
        set.get_mut(MatrixName::Delta0).mark_all_free();
        let real = |name, v: f64| ParameterMatrix::from_real(name, array![[v]].view());
        set.set(real(MatrixName::Delta1, 1.0));
        set.set(real(MatrixName::Phi, phi));
        set.set(real(MatrixName::Sigma, 0.01));
        set.set(ParameterMatrix::from_real(MatrixName::ObsSd, array![[1e-4], [1e-4]].view()));
        ModelSpecification::new(set, vec![1, 4], 0, 1).expect("valid spec")
    }

    fn panel(spec: &ModelSpecification) -> YieldPanel {
        let mut rng = StdRng::seed_from_u64(11);
        simulate_panel(spec, &[0.03], 60, 1e-10, &mut rng).expect("simulates")
    }

    fn options(algorithm: Algorithm, max_iter: usize) -> AffineOptions {
        let tols = Tolerances::new(Some(1e-8), Some(1e-10), Some(max_iter)).expect("valid tols");
        let mle = MLEOptions::new(tols, algorithm, LineSearcher::MoreThuente, false, None)
            .expect("valid mle options");
        AffineOptions::default().with_mle_opts(mle)
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<FitReport>>);

    impl CompletionNotifier for Recorder {
        fn notify(&self, report: &FitReport) {
            self.0.lock().expect("not poisoned").push(report.clone());
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure `check` rejects wrong lengths and non-finite entries.
    //
    // Given
    // -----
    // - One free parameter; θ of length 2 and θ = [NaN].
    //
    // Expect
    // ------
    // - `ThetaLengthMismatch` and `InvalidThetaInput`.
    fn check_rejects_bad_theta() {
        // Arrange
        let spec = spec(0.9);
        let data = panel(&spec);
        let model = AffineModel::new(spec, AffineOptions::default());

        // Act
        let e1 = model.check(&array![0.0, 0.0], &data);
        let e2 = model.check(&array![f64::NAN], &data);

        // Assert
        assert_eq!(e1, Err(OptError::ThetaLengthMismatch { expected: 1, actual: 2 }));
        assert!(matches!(e2, Err(OptError::InvalidThetaInput { index: 0, .. })));
    }

    #[test]
    // Purpose
    // -------
    // Check an explosive transition is penalized and aborts after the
    // configured streak.
    //
    // Given
    // -----
    // - Φ = 1.5 with a stationary prior; `max_invalid_streak = 2`.
    //
    // Expect
    // ------
    // - Two calls return `-penalty`; the third returns
    //   `PersistentInvalidLikelihood { streak: 3 }`.
    fn value_penalizes_then_aborts_persistent_failures() {
        // Arrange
        let good = spec(0.9);
        let data = panel(&good);
        let mut opts = AffineOptions::default();
        opts.max_invalid_streak = 2;
        let model = AffineModel::new(spec(1.5), opts);
        let theta = array![0.03];

        // Act
        let v1 = model.value(&theta, &data);
        let v2 = model.value(&theta, &data);
        let v3 = model.value(&theta, &data);

        // Assert
        assert_eq!(v1, Ok(-1e10));
        assert_eq!(v2, Ok(-1e10));
        assert!(matches!(v3, Err(OptError::PersistentInvalidLikelihood { streak: 3, .. })));
        assert_eq!(model.diagnostics().invalid_evaluations(), 3);
    }

    #[test]
    // Purpose
    // -------
    // Verify a one-parameter fit converges near the simulating δ0 and
    // notifies once.
    //
    // Given
    // -----
    // - 60 periods simulated at δ0 = 0.03; Nelder–Mead from 0.01.
    //
    // Expect
    // ------
    // - Converged estimate within 2e-3 of 0.03; ℓ(θ̂) ≥ ℓ(0.03) - 1e-6;
    //   one converged report.
    fn fit_recovers_short_rate_intercept() {
        // Arrange
        let spec = spec(0.9);
        let data = panel(&spec);
        let recorder = Arc::new(Recorder::default());
        let mut model = AffineModel::new(spec, options(Algorithm::NelderMead, 500))
            .with_notifier(recorder.clone());
        let ll_true = model.evaluate_at(&[0.03], &data).expect("scores").loglik();

        // Act
        let fitted = model.fit(Some(GuessVector::from(vec![0.01])), &data).expect("converges");

        // Assert
        assert!(fitted.converged);
        assert!((fitted.theta_hat[0] - 0.03).abs() < 2e-3);
        assert!(fitted.log_likelihood >= ll_true - 1e-6);
        assert_eq!(fitted.filtered_states.nrows(), 60);
        let reports = recorder.0.lock().expect("not poisoned");
        assert_eq!(reports.len(), 1);
        assert!(reports[0].converged);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a bad guess fails before any evaluation.
    //
    // Given
    // -----
    // - A guess of length 3 for one free parameter.
    //
    // Expect
    // ------
    // - `ShapeMismatch` and zero recorded evaluations.
    fn fit_rejects_wrong_guess_length_without_evaluating() {
        // Arrange
        let spec = spec(0.9);
        let data = panel(&spec);
        let mut model = AffineModel::new(spec, AffineOptions::default());

        // Act
        let err = model.fit(Some(GuessVector::from(vec![0.0; 3])), &data).map(|f| f.clone());

        // Assert
        assert!(matches!(err, Err(AffineError::ShapeMismatch { expected: (1, 1), .. })));
        assert_eq!(model.diagnostics().evaluations(), 0);
        assert_eq!(model.fitted(), Err(AffineError::ModelNotFitted));
    }

    #[test]
    // Purpose
    // -------
    // Check an iteration cap yields `ConvergenceFailure` with a best
    // estimate no worse than the start.
    //
    // Given
    // -----
    // - BFGS limited to one iteration from δ0 = 0.
    //
    // Expect
    // ------
    // - `ConvergenceFailure` whose best ℓ ≥ ℓ(guess).
    fn fit_reports_best_point_when_stopped_early() {
        // Arrange
        let spec = spec(0.9);
        let data = panel(&spec);
        let mut model = AffineModel::new(spec, options(Algorithm::Bfgs, 1));
        let ll_guess = model.evaluate_at(&[0.0], &data).expect("scores").loglik();

        // Act
        let result = model.fit(Some(GuessVector::from(vec![0.0])), &data).map(|f| f.clone());

        // Assert
        match result {
            Err(AffineError::ConvergenceFailure { best, .. }) => {
                assert!(!best.converged);
                assert!(best.log_likelihood >= ll_guess);
            }
            Ok(fitted) => assert!(fitted.log_likelihood >= ll_guess),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify an everywhere-infeasible model ends in `NumericalDivergence`.
    //
    // Given
    // -----
    // - Φ = 1.5 under the stationary prior; streak limit 5.
    //
    // Expect
    // ------
    // - `NumericalDivergence` naming the non-stationary failure.
    fn fit_on_infeasible_model_diverges() {
        // Arrange
        let data = panel(&spec(0.9));
        let mut opts = options(Algorithm::NelderMead, 200);
        opts.max_invalid_streak = 5;
        let mut model = AffineModel::new(spec(1.5), opts);

        // Act
        let result = model.fit(None, &data).map(|f| f.clone());

        // Assert
        match result {
            Err(AffineError::NumericalDivergence { last_failure, .. }) => {
                assert!(last_failure.contains("spectral radius"));
            }
            other => panic!("expected divergence, got {other:?}"),
        }
    }

    /// Scores a feasible point, then reports an infeasible one as converged.
    struct ConvergesOnPenalty {
        feasible: Theta,
        infeasible: Theta,
    }

    impl Minimizer for ConvergesOnPenalty {
        fn maximize<F: LogLikelihood>(
            &self, f: &F, _theta0: Theta, data: &F::Data, _opts: &MLEOptions,
        ) -> OptResult<OptimOutcome> {
            f.value(&self.feasible, data)?;
            let value = f.value(&self.infeasible, data)?;
            Ok(OptimOutcome {
                theta_hat: self.infeasible.clone(),
                value,
                converged: true,
                status: "SolverConverged".to_string(),
                iterations: 3,
                fn_evals: FnEvalMap::new(),
                grad_norm: None,
            })
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure a reported optimum at a penalized point falls back to the best
    // valid evaluation with the true bookkeeping.
    //
    // Given
    // -----
    // - δ0 and Φ free; a minimizer that scores (0.03, 0.9), then
    //   (0.03, 1.5) and claims convergence at the latter.
    //
    // Expect
    // ------
    // - `ConvergenceFailure` whose best point is (0.03, 0.9), with two
    //   evaluations and one invalid.
    fn fit_with_penalized_optimum_falls_back_to_best_point() {
        // Arrange
        let data = panel(&spec(0.9));
        let mut set = ParameterSet::zeros(1, 2);
        set.get_mut(MatrixName::Delta0).mark_all_free();
        set.get_mut(MatrixName::Phi).mark_all_free();
        set.set(ParameterMatrix::from_real(MatrixName::Delta1, array![[1.0]].view()));
        set.set(ParameterMatrix::from_real(MatrixName::Sigma, array![[0.01]].view()));
        set.set(ParameterMatrix::from_real(MatrixName::ObsSd, array![[1e-4], [1e-4]].view()));
        let two_free = ModelSpecification::new(set, vec![1, 4], 0, 1).expect("valid spec");
        let mut model = AffineModel::new(two_free, AffineOptions::default());
        let minimizer =
            ConvergesOnPenalty { feasible: array![0.03, 0.9], infeasible: array![0.03, 1.5] };

        // Act
        let result = model
            .fit_with(&minimizer, Some(GuessVector::from(vec![0.03, 0.9])), &data)
            .map(|f| f.clone());

        // Assert
        match result {
            Err(AffineError::ConvergenceFailure { best, .. }) => {
                assert!(!best.converged);
                assert_eq!(best.theta_hat, array![0.03, 0.9]);
                assert_eq!(best.evaluations, 2);
                assert_eq!(best.invalid_evaluations, 1);
            }
            other => panic!("expected convergence failure, got {other:?}"),
        }
        assert!(model.fitted().is_err());
    }

    #[test]
    // Purpose
    // -------
    // Check multi-start keeps the best converged run.
    //
    // Given
    // -----
    // - Three seeds on the one-parameter model.
    //
    // Expect
    // ------
    // - A converged fit whose ℓ is at least that of every single start.
    fn fit_multi_start_keeps_best_run() {
        // Arrange
        let spec = spec(0.9);
        let data = panel(&spec);
        let opts = options(Algorithm::NelderMead, 500);
        let seeds = [1_u64, 2, 3];

        // Act
        let best = fit_multi_start(&spec, &opts, &data, &seeds).expect("fits");

        // Assert
        assert!(best.converged);
        for &seed in &seeds {
            let mut o = opts.clone();
            o.guess_seed = seed;
            let mut single = AffineModel::new(spec.clone(), o);
            if let Ok(f) = single.fit(None, &data) {
                assert!(best.log_likelihood >= f.log_likelihood);
            }
        }
    }
}
