//! Adapter that exposes a user `LogLikelihood` as an `argmin` problem.
//!
//! We convert a *maximization* of a log-likelihood `ℓ(θ)` into a *minimization*
//! problem by defining the cost as `c(θ) = -ℓ(θ)`. Analytic gradients (if
//! provided by the user) are negated accordingly. If a gradient is not
//! provided, we finite-difference the **cost** closure, so no sign flip is
//! needed in that branch.
//!
//! The adapter also owns the function-evaluation budget: every cost call,
//! including the ones spent inside finite differences, is counted, and the
//! call that would exceed `max_fevals` fails with
//! [`OptError::FunctionEvaluationLimit`].
use std::cell::{Cell, RefCell};

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::run_fd_diff,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user `LogLikelihood` to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `-ℓ(θ)` (negative log-likelihood).
/// - `Gradient::gradient` returns:
///   - `-∇ℓ(θ)` if the user provides an analytic gradient, or
///   - a finite-difference gradient of the cost (no sign flip needed).
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
    max_fevals: Option<u64>,
    evals: Cell<u64>,
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost `c(θ) = -ℓ(θ)`.
    ///
    /// # Errors
    /// - `FunctionEvaluationLimit` once the budget is spent.
    /// - `NonFiniteCost` if the user value is not finite.
    /// - Any `OptError` from the user’s `value`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let used = self.evals.get();
        if let Some(max) = self.max_fevals {
            if used >= max {
                return Err(OptError::FunctionEvaluationLimit { max }.into());
            }
        }
        self.evals.set(used + 1);
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// Behavior:
    /// - If the user implements `grad(θ, data)`, we validate it and return `-grad`.
    /// - Otherwise, central differences of the cost are tried first. If a
    ///   cost evaluation failed (captured via `closure_err`) or the result
    ///   does not validate, forward differences are used instead.
    ///
    /// The FD closure must return `f64`, so the first error is parked in
    /// `closure_err` and the closure returns `NaN`.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                let central_ok =
                    closure_err.borrow().is_none() && validate_grad(&fd_grad, dim).is_ok();
                if central_ok {
                    return Ok(fd_grad);
                }
                if let Some(err) = closure_err.take() {
                    // Budget exhaustion cannot be cured by a cheaper stencil.
                    let err = OptError::from(err);
                    if matches!(err, OptError::FunctionEvaluationLimit { .. }) {
                        return Err(err.into());
                    }
                }
                Ok(run_fd_diff(theta, &cost_func, &closure_err)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user `LogLikelihood` and its data,
    /// without an evaluation budget.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data, max_fevals: None, evals: Cell::new(0) }
    }

    /// Construct an adapter that refuses cost evaluations beyond `max_fevals`.
    pub fn with_budget(f: &'a F, data: &'a F::Data, max_fevals: Option<u64>) -> Self {
        Self { f, data, max_fevals, evals: Cell::new(0) }
    }

    /// Number of cost evaluations performed so far.
    pub fn evaluations(&self) -> u64 {
        self.evals.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sign convention of `cost` and of the finite-difference gradient.
    // - Enforcement of the function-evaluation budget.
    //
    // They intentionally DO NOT cover:
    // - Solver behavior, which the `api` tests exercise.
    // -------------------------------------------------------------------------

    struct Parabola;

    impl LogLikelihood for Parabola {
        type Data = ();

        fn value(&self, theta: &Theta, _data: &()) -> OptResult<f64> {
            Ok(-(theta[0] - 1.0).powi(2))
        }

        fn check(&self, _theta: &Theta, _data: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that the adapter negates the log-likelihood and that the FD
    // gradient is the gradient of the cost.
    //
    // Given
    // -----
    // - ℓ(θ) = -(θ - 1)² evaluated at θ = 3.
    //
    // Expect
    // ------
    // - cost = 4 and d cost / dθ ≈ 4.
    fn cost_and_fd_gradient_follow_cost_sign_convention() {
        // Arrange
        let adapter = ArgMinAdapter::new(&Parabola, &());
        let theta = array![3.0];

        // Act
        let cost = adapter.cost(&theta).expect("cost should evaluate");
        let grad = adapter.gradient(&theta).expect("gradient should evaluate");

        // Assert
        assert!((cost - 4.0).abs() < 1e-12);
        assert!((grad[0] - 4.0).abs() < 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Ensure the evaluation budget is enforced on the call that would exceed
    // it.
    //
    // Given
    // -----
    // - A budget of two evaluations.
    //
    // Expect
    // ------
    // - Two calls succeed; the third fails with `FunctionEvaluationLimit`.
    fn cost_fails_once_budget_is_spent() {
        // Arrange
        let adapter = ArgMinAdapter::with_budget(&Parabola, &(), Some(2));
        let theta = array![0.0];

        // Act
        let first = adapter.cost(&theta);
        let second = adapter.cost(&theta);
        let third = adapter.cost(&theta).map_err(OptError::from);

        // Assert
        assert!(first.is_ok() && second.is_ok());
        assert_eq!(third, Err(OptError::FunctionEvaluationLimit { max: 2 }));
        assert_eq!(adapter.evaluations(), 2);
    }
}
