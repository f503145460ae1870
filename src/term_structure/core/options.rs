//! Affine estimation options.
//!
//! Purpose
//! -------
//! Collect the knobs of an affine-model fit in one serializable place:
//! optimizer settings, per-evaluation numerical settings, the divergence
//! threshold, random-guess seeding, and whether to compute standard errors.
//!
//! Key behaviors
//! -------------
//! - [`EvalSettings`] controls how a single likelihood evaluation treats
//!   numerical trouble (imaginary tolerance and penalty size).
//! - [`AffineOptions`] bundles [`MLEOptions`] with the driver settings and
//!   validates cross-field constraints in [`AffineOptions::new`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `imag_tol` is finite and non-negative; `penalty` is finite and positive.
//! - `max_invalid_streak ≥ 1`; `guess_scale` is finite.
//! - [`MLEOptions`] validates itself on construction and is stored as-is.
//!
//! Conventions
//! -----------
//! - Defaults mirror common usage: seed 100, guess scale 0.01, penalty
//!   `1e10`, imaginary tolerance `1e-8`, divergence after 1000 consecutive
//!   penalized evaluations.
use crate::{
    optimization::loglik_optimizer::MLEOptions,
    term_structure::errors::{AffineError, AffineResult},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAG_TOL: f64 = 1e-8;
pub const DEFAULT_PENALTY: f64 = 1e10;
pub const DEFAULT_MAX_INVALID_STREAK: usize = 1000;
pub const DEFAULT_GUESS_SEED: u64 = 100;
pub const DEFAULT_GUESS_SCALE: f64 = 0.01;

/// Numerical settings for one likelihood evaluation.
///
/// - `imag_tol`: largest `|Im|` tolerated when realising complex matrices.
/// - `penalty`: infeasible vectors score `-penalty`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalSettings {
    pub imag_tol: f64,
    pub penalty: f64,
}

impl EvalSettings {
    /// # Errors
    /// - `InvalidSpecification` for a negative/non-finite tolerance or a
    ///   non-positive/non-finite penalty.
    pub fn new(imag_tol: f64, penalty: f64) -> AffineResult<Self> {
        if !imag_tol.is_finite() || imag_tol < 0.0 {
            return Err(AffineError::InvalidSpecification {
                reason: format!("imaginary tolerance must be finite and non-negative, got {imag_tol}"),
            });
        }
        if !penalty.is_finite() || penalty <= 0.0 {
            return Err(AffineError::InvalidSpecification {
                reason: format!("penalty must be finite and positive, got {penalty}"),
            });
        }
        Ok(Self { imag_tol, penalty })
    }
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self { imag_tol: DEFAULT_IMAG_TOL, penalty: DEFAULT_PENALTY }
    }
}

/// Options for [`AffineModel`](crate::term_structure::models::affine::AffineModel).
///
/// Fields
/// ------
/// - `mle_opts`: [`MLEOptions`]
///   Algorithm, tolerances, iteration and evaluation budgets.
/// - `eval`: [`EvalSettings`]
///   Imaginary tolerance and penalty for each evaluation.
/// - `max_invalid_streak`: `usize`
///   Consecutive penalized evaluations tolerated before the run is aborted
///   as numerically divergent.
/// - `guess_seed`, `guess_scale`:
///   Seed and scale of the random starting vector used when no guess is
///   supplied.
/// - `compute_std_errors`: `bool`
///   Whether to compute observed-information standard errors at θ̂.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineOptions {
    pub mle_opts: MLEOptions,
    pub eval: EvalSettings,
    pub max_invalid_streak: usize,
    pub guess_seed: u64,
    pub guess_scale: f64,
    pub compute_std_errors: bool,
}

impl AffineOptions {
    /// Build validated options.
    ///
    /// # Errors
    /// - `InvalidSpecification` if `max_invalid_streak == 0` or
    ///   `guess_scale` is not finite.
    pub fn new(
        mle_opts: MLEOptions, eval: EvalSettings, max_invalid_streak: usize, guess_seed: u64,
        guess_scale: f64, compute_std_errors: bool,
    ) -> AffineResult<Self> {
        if max_invalid_streak == 0 {
            return Err(AffineError::InvalidSpecification {
                reason: "max_invalid_streak must be at least one".to_string(),
            });
        }
        if !guess_scale.is_finite() {
            return Err(AffineError::InvalidSpecification {
                reason: format!("guess scale must be finite, got {guess_scale}"),
            });
        }
        Ok(Self { mle_opts, eval, max_invalid_streak, guess_seed, guess_scale, compute_std_errors })
    }

    /// Same options with a different optimizer configuration.
    pub fn with_mle_opts(mut self, mle_opts: MLEOptions) -> Self {
        self.mle_opts = mle_opts;
        self
    }
}

impl Default for AffineOptions {
    fn default() -> Self {
        Self {
            mle_opts: MLEOptions::default(),
            eval: EvalSettings::default(),
            max_invalid_streak: DEFAULT_MAX_INVALID_STREAK,
            guess_seed: DEFAULT_GUESS_SEED,
            guess_scale: DEFAULT_GUESS_SCALE,
            compute_std_errors: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation in `EvalSettings::new` and `AffineOptions::new`.
    // - JSON round trip of the defaults.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure invalid numerical settings are rejected.
    //
    // Given
    // -----
    // - A negative tolerance, a zero penalty, and a zero streak limit.
    //
    // Expect
    // ------
    // - `InvalidSpecification` for each.
    fn constructors_reject_invalid_settings() {
        // Arrange / Act
        let tol = EvalSettings::new(-1.0, 1e10);
        let penalty = EvalSettings::new(1e-8, 0.0);
        let streak = AffineOptions::new(
            MLEOptions::default(),
            EvalSettings::default(),
            0,
            DEFAULT_GUESS_SEED,
            DEFAULT_GUESS_SCALE,
            false,
        );

        // Assert
        assert!(matches!(tol, Err(AffineError::InvalidSpecification { .. })));
        assert!(matches!(penalty, Err(AffineError::InvalidSpecification { .. })));
        assert!(matches!(streak, Err(AffineError::InvalidSpecification { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Verify default options survive a JSON round trip unchanged.
    //
    // Given
    // -----
    // - `AffineOptions::default()`.
    //
    // Expect
    // ------
    // - Deserialized options equal the original.
    fn default_options_round_trip_through_json() {
        // Arrange
        let opts = AffineOptions::default();

        // Act
        let text = serde_json::to_string(&opts).expect("serializable");
        let back: AffineOptions = serde_json::from_str(&text).expect("deserializable");

        // Assert
        assert_eq!(back, opts);
        assert_eq!(back.guess_seed, 100);
    }
}
