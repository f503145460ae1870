//! Errors for affine term-structure models (mask/specification checks, data
//! loading, per-evaluation numerical failures, and estimation outcomes).
//!
//! Two types live here:
//! - [`AffineError`]: everything a caller can receive from this module.
//! - [`EvalFailure`]: the recoverable reasons a single likelihood evaluation
//!   was replaced by the penalty value. These never abort a search on their
//!   own; they are recorded and reported through [`AffineError`] only when a
//!   run ends in divergence.
//!
//! ## Conventions
//! - **Indices are 0-based** (rows are time, columns are maturities).
//! - Shapes are written `(rows, cols)`.
//! - Build-time errors carry enough context to locate the offending matrix
//!   or cell.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

use crate::{
    optimization::errors::OptError, term_structure::models::fitted::FittedModel,
};

/// Result alias for affine-model operations.
pub type AffineResult<T> = Result<T, AffineError>;

/// Unified error type for affine term-structure modeling.
#[derive(Debug, Clone, PartialEq)]
pub enum AffineError {
    // ---- Structure ----
    /// A mask, index, or vector does not fit the matrix it targets.
    ShapeMismatch { context: String, expected: (usize, usize), found: (usize, usize) },

    /// Parameter matrices, maturities, factor counts, or prior are inconsistent.
    InvalidSpecification { reason: String },

    // ---- Evaluation ----
    /// A realised matrix kept an imaginary part above tolerance.
    ComplexResidual { matrix: String, imag: f64, tol: f64 },

    // ---- Estimation ----
    /// The optimizer stopped without converging; `best` holds the best valid
    /// point seen during the search.
    ConvergenceFailure { status: String, best: Box<FittedModel> },

    /// No usable likelihood could be produced (every evaluation penalized, or
    /// too many in a row).
    NumericalDivergence { invalid_evaluations: usize, last_failure: String },

    /// Starting vector contains NaN/±inf.
    NonFiniteGuess { index: usize, value: f64 },

    /// Optimizer configuration or backend failure that is not a numerical
    /// outcome of the model.
    Optimizer { text: String },

    /// Accessor used before `fit`.
    ModelNotFitted,

    /// Standard errors were not requested or could not be computed at θ̂.
    StdErrorsUnavailable,

    // ---- Data ----
    /// Yield panel has no rows.
    EmptyPanel,

    /// A yield or factor value is NaN/±inf.
    NonFiniteData { row: usize, col: usize, value: f64 },

    /// Dates must be strictly increasing; `index` is the first violating row.
    UnsortedDates { index: usize },

    /// Requested column is absent from the CSV header.
    MissingColumn { name: String },

    /// A cell could not be parsed as a number.
    DataParse { row: usize, column: String, value: String },

    /// A date cell could not be parsed with the configured format.
    DateParse { row: usize, value: String },

    /// Wrapper for csv::Error
    Csv { text: String },

    /// Wrapper for std::io::Error
    Io { text: String },

    /// Wrapper for serde_json::Error
    Serialization { text: String },
}

impl std::error::Error for AffineError {}

impl std::fmt::Display for AffineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Structure ----
            AffineError::ShapeMismatch { context, expected, found } => {
                write!(f, "Shape mismatch for {context}: expected {expected:?}, found {found:?}")
            }
            AffineError::InvalidSpecification { reason } => {
                write!(f, "Invalid model specification: {reason}")
            }

            // ---- Evaluation ----
            AffineError::ComplexResidual { matrix, imag, tol } => {
                write!(
                    f,
                    "Matrix `{matrix}` has residual imaginary part {imag:e} above tolerance {tol:e}"
                )
            }

            // ---- Estimation ----
            AffineError::ConvergenceFailure { status, best } => {
                write!(
                    f,
                    "Optimizer did not converge ({status}); best log-likelihood {}",
                    best.log_likelihood
                )
            }
            AffineError::NumericalDivergence { invalid_evaluations, last_failure } => {
                write!(
                    f,
                    "Numerical divergence after {invalid_evaluations} invalid evaluations \
                     (last: {last_failure})"
                )
            }
            AffineError::NonFiniteGuess { index, value } => {
                write!(f, "Guess vector entry {index} is not finite: {value}")
            }
            AffineError::Optimizer { text } => write!(f, "Optimizer error: {text}"),
            AffineError::ModelNotFitted => write!(f, "Model has not been fitted"),
            AffineError::StdErrorsUnavailable => {
                write!(f, "Standard errors were not computed for this fit")
            }

            // ---- Data ----
            AffineError::EmptyPanel => write!(f, "Yield panel is empty"),
            AffineError::NonFiniteData { row, col, value } => {
                write!(f, "Non-finite value {value} at row {row}, column {col}")
            }
            AffineError::UnsortedDates { index } => {
                write!(f, "Dates must be strictly increasing; violated at row {index}")
            }
            AffineError::MissingColumn { name } => write!(f, "Missing column '{name}'"),
            AffineError::DataParse { row, column, value } => {
                write!(f, "Cannot parse '{value}' in column '{column}' at row {row}")
            }
            AffineError::DateParse { row, value } => {
                write!(f, "Cannot parse date '{value}' at row {row}")
            }
            AffineError::Csv { text } => write!(f, "CSV error: {text}"),
            AffineError::Io { text } => write!(f, "I/O error: {text}"),
            AffineError::Serialization { text } => write!(f, "Serialization error: {text}"),
        }
    }
}

impl From<OptError> for AffineError {
    fn from(err: OptError) -> Self {
        match err {
            OptError::ThetaLengthMismatch { expected, actual } => AffineError::ShapeMismatch {
                context: "guess vector".to_string(),
                expected: (expected, 1),
                found: (actual, 1),
            },
            OptError::InvalidThetaInput { index, value } => {
                AffineError::NonFiniteGuess { index, value }
            }
            OptError::PersistentInvalidLikelihood { streak, last_failure } => {
                AffineError::NumericalDivergence { invalid_evaluations: streak, last_failure }
            }
            other => AffineError::Optimizer { text: other.to_string() },
        }
    }
}

impl From<EvalFailure> for AffineError {
    fn from(failure: EvalFailure) -> Self {
        match failure {
            EvalFailure::ComplexResidual { matrix, imag, tol } => {
                AffineError::ComplexResidual { matrix, imag, tol }
            }
            other => AffineError::NumericalDivergence {
                invalid_evaluations: 1,
                last_failure: other.to_string(),
            },
        }
    }
}

impl From<csv::Error> for AffineError {
    fn from(err: csv::Error) -> Self {
        AffineError::Csv { text: err.to_string() }
    }
}

impl From<std::io::Error> for AffineError {
    fn from(err: std::io::Error) -> Self {
        AffineError::Io { text: err.to_string() }
    }
}

impl From<serde_json::Error> for AffineError {
    fn from(err: serde_json::Error) -> Self {
        AffineError::Serialization { text: err.to_string() }
    }
}

/// Convert an [`AffineError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<AffineError> for PyErr {
    fn from(err: AffineError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Why one likelihood evaluation was replaced by the penalty value.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalFailure {
    /// A realised matrix kept an imaginary part above tolerance.
    ComplexResidual { matrix: String, imag: f64, tol: f64 },

    /// Innovation covariance `F_t` failed its Cholesky factorization.
    NotPositiveDefinite { t: usize },

    /// Transition matrix has spectral radius ≥ 1, so no stationary prior exists.
    NonStationary { spectral_radius: f64 },

    /// A linear system needed for the prior could not be solved.
    SingularSystem { context: &'static str },

    /// The filter produced a NaN/±inf at step `t`.
    NonFinite { t: usize },
}

impl std::error::Error for EvalFailure {}

impl std::fmt::Display for EvalFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalFailure::ComplexResidual { matrix, imag, tol } => {
                write!(f, "complex residual {imag:e} in `{matrix}` (tolerance {tol:e})")
            }
            EvalFailure::NotPositiveDefinite { t } => {
                write!(f, "innovation covariance not positive definite at t = {t}")
            }
            EvalFailure::NonStationary { spectral_radius } => {
                write!(f, "transition matrix not stationary (spectral radius {spectral_radius})")
            }
            EvalFailure::SingularSystem { context } => write!(f, "singular system in {context}"),
            EvalFailure::NonFinite { t } => write!(f, "non-finite filter quantity at t = {t}"),
        }
    }
}
