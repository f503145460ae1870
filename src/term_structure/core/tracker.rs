//! Bookkeeping across likelihood evaluations during a fit.
//!
//! The optimizer only sees scalars, so the model records what happened at
//! each evaluation: how many were penalized, how long the current run of
//! penalized evaluations is, the last failure, and the best valid point. The
//! driver uses this to abort divergent runs and to report a best estimate
//! when the optimizer stops early.
use crate::{
    optimization::loglik_optimizer::Theta,
    term_structure::{core::kalman::Evaluation, errors::EvalFailure},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalTracker {
    evaluations: usize,
    invalid: usize,
    streak: usize,
    best: Option<(Theta, f64)>,
    last_failure: Option<EvalFailure>,
}

impl EvalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of evaluating `theta`.
    pub fn record(&mut self, theta: &Theta, eval: &Evaluation) {
        self.evaluations += 1;
        match eval {
            Evaluation::Valid(ll) => {
                self.streak = 0;
                let better = self.best.as_ref().map_or(true, |(_, best)| *ll > *best);
                if better {
                    self.best = Some((theta.clone(), *ll));
                }
            }
            Evaluation::Penalized { failure, .. } => {
                self.invalid += 1;
                self.streak += 1;
                self.last_failure = Some(failure.clone());
            }
        }
    }

    /// `true` once the current streak of penalized evaluations exceeds `max`.
    pub fn streak_exceeded(&self, max: usize) -> bool {
        self.streak > max
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn invalid_evaluations(&self) -> usize {
        self.invalid
    }

    pub fn streak(&self) -> usize {
        self.streak
    }

    /// Best valid `(θ, ℓ)` seen so far.
    pub fn best(&self) -> Option<&(Theta, f64)> {
        self.best.as_ref()
    }

    pub fn last_failure(&self) -> Option<&EvalFailure> {
        self.last_failure.as_ref()
    }

    /// Human-readable last failure, or a placeholder when none occurred.
    pub fn last_failure_text(&self) -> String {
        self.last_failure
            .as_ref()
            .map_or_else(|| "no valid evaluation".to_string(), ToString::to_string)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
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
    // - Streak counting and reset on a valid evaluation.
    // - Best-point tracking.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify streaks grow on penalties, reset on valid values, and that the
    // best valid point is kept.
    //
    // Given
    // -----
    // - Sequence: valid(-5), penalty, penalty, valid(-3), penalty.
    //
    // Expect
    // ------
    // - 5 evaluations, 3 invalid, final streak 1, best ℓ = -3 at θ = [2].
    fn record_tracks_streak_and_best() {
        // Arrange
        let mut tracker = EvalTracker::new();
        let penalty = Evaluation::Penalized {
            loglik: -1e10,
            failure: EvalFailure::NotPositiveDefinite { t: 4 },
        };

        // Act
        tracker.record(&array![1.0], &Evaluation::Valid(-5.0));
        tracker.record(&array![9.0], &penalty);
        tracker.record(&array![9.0], &penalty);
        assert_eq!(tracker.streak(), 2);
        tracker.record(&array![2.0], &Evaluation::Valid(-3.0));
        tracker.record(&array![9.0], &penalty);

        // Assert
        assert_eq!(tracker.evaluations(), 5);
        assert_eq!(tracker.invalid_evaluations(), 3);
        assert_eq!(tracker.streak(), 1);
        assert!(!tracker.streak_exceeded(1));
        assert!(tracker.streak_exceeded(0));
        assert_eq!(tracker.best(), Some(&(array![2.0], -3.0)));
        assert_eq!(tracker.last_failure(), Some(&EvalFailure::NotPositiveDefinite { t: 4 }));
    }
}
