//! Starting vectors for the optimizer.
//!
//! A [`GuessVector`] holds one value per free cell in canonical order. It is
//! either supplied by the caller, derived from known matrices, or drawn from
//! an explicitly passed random generator; there is no process-wide seed.
use crate::term_structure::{
    core::{params::ResolvedParams, spec::ModelSpecification},
    errors::{AffineError, AffineResult},
};
use ndarray::Array1;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

/// Flat starting values, one per free parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessVector {
    values: Array1<f64>,
}

impl GuessVector {
    pub fn new(values: Array1<f64>) -> Self {
        Self { values }
    }

    /// `|scale · u|` with `u ~ U[0, 1)` drawn from `rng`.
    pub fn random<R: Rng + ?Sized>(n: usize, scale: f64, rng: &mut R) -> Self {
        let values = (0..n).map(|_| (scale * rng.gen::<f64>()).abs()).collect();
        Self { values }
    }

    /// [`GuessVector::random`] from a fresh `StdRng` seeded with `seed`.
    pub fn seeded(n: usize, scale: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::random(n, scale, &mut rng)
    }

    /// Free-cell values read out of known matrices, e.g. to start a search
    /// near a previous estimate.
    pub fn from_resolved(spec: &ModelSpecification, params: &ResolvedParams<f64>) -> Self {
        Self { values: spec.params().flatten(params) }
    }

    /// Check length and finiteness against a specification.
    ///
    /// # Errors
    /// - `ShapeMismatch` (context "guess vector") on a length mismatch.
    /// - `NonFiniteGuess` for the first NaN/±inf entry.
    pub fn validate(&self, spec: &ModelSpecification) -> AffineResult<()> {
        let expected = spec.free_count();
        if self.values.len() != expected {
            return Err(AffineError::ShapeMismatch {
                context: "guess vector".to_string(),
                expected: (expected, 1),
                found: (self.values.len(), 1),
            });
        }
        if let Some((index, &value)) = self.values.iter().enumerate().find(|(_, v)| !v.is_finite())
        {
            return Err(AffineError::NonFiniteGuess { index, value });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_array(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn into_inner(self) -> Array1<f64> {
        self.values
    }
}

impl From<Vec<f64>> for GuessVector {
    fn from(values: Vec<f64>) -> Self {
        Self { values: Array1::from(values) }
    }
}

impl From<Array1<f64>> for GuessVector {
    fn from(values: Array1<f64>) -> Self {
        Self { values }
    }
}
