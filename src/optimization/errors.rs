use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Implies that FD should be used
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- MLEOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch {
        name: String,
        reason: &'static str,
    },

    /// Invalid algorithm name.
    InvalidAlgorithm {
        name: String,
        reason: &'static str,
    },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem {
        mem: usize,
        reason: &'static str,
    },

    /// Function-evaluation budget needs to be at least 1.
    InvalidMaxFevals {
        max: u64,
        reason: &'static str,
    },

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    /// The function-evaluation budget was exhausted mid-run.
    FunctionEvaluationLimit {
        max: u64,
    },

    /// The objective kept returning penalized values.
    PersistentInvalidLikelihood {
        streak: usize,
        last_failure: String,
    },

    /// The model rejected a parameter vector for a structural reason.
    ModelError {
        text: String,
    },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Finite Diffs ----
    /// Hessian matrix dimensions do not match parameter dimensions.
    HessianDimMismatch {
        expected: usize,
        found: (usize, usize),
    },

    /// Hessian values need to be finite.
    InvalidHessian {
        row: usize,
        col: usize,
        value: f64,
    },

    // ---- Parameter vector ----
    /// Parameter vector length does not match the number of free cells.
    ThetaLengthMismatch {
        expected: usize,
        actual: usize,
    },

    /// Optimization input must have finite values.
    InvalidThetaInput {
        index: usize,
        value: f64,
    },

    // ---- Inference ----
    /// Confidence level must lie strictly between 0 and 1.
    InvalidConfidenceLevel {
        level: f64,
    },

    /// Standard errors must align with the estimates.
    StandardErrorDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Failure inside a distribution helper.
    DistributionError {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl OptError {
    /// `true` for errors raised while validating options, before any
    /// objective evaluation could have happened.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OptError::InvalidTolGrad { .. }
                | OptError::InvalidTolCost { .. }
                | OptError::InvalidMaxIter { .. }
                | OptError::NoTolerancesProvided
                | OptError::InvalidLineSearch { .. }
                | OptError::InvalidAlgorithm { .. }
                | OptError::InvalidLBFGSMem { .. }
                | OptError::InvalidMaxFevals { .. }
                | OptError::InvalidParameter { .. }
        )
    }
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Gradient optimization not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- MLEOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidAlgorithm { name, reason } => {
                write!(f, "Invalid algorithm '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }
            OptError::InvalidMaxFevals { max, reason } => {
                write!(f, "Invalid maximum function evaluations {max}: {reason}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }
            OptError::FunctionEvaluationLimit { max } => {
                write!(f, "Function evaluation budget of {max} exhausted")
            }
            OptError::PersistentInvalidLikelihood { streak, last_failure } => {
                write!(
                    f,
                    "Log-likelihood invalid for {streak} consecutive evaluations (last: {last_failure})"
                )
            }
            OptError::ModelError { text } => {
                write!(f, "Model error: {text}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Finite Diffs ----
            OptError::HessianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            OptError::InvalidHessian { row, col, value } => {
                write!(f, "Invalid Hessian at ({row}, {col}): {value}, must be finite")
            }

            // ---- Parameter vector ----
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid theta input at index {index}: {value}, must be finite")
            }

            // ---- Inference ----
            OptError::InvalidConfidenceLevel { level } => {
                write!(f, "Invalid confidence level {level}: must lie in (0, 1)")
            }
            OptError::StandardErrorDimMismatch { expected, found } => {
                write!(f, "Standard error length mismatch: expected {expected}, found {found}")
            }
            OptError::DistributionError { text } => {
                write!(f, "Distribution error: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

/// Errors raised inside the objective travel through argmin as
/// `anyhow`-style errors; recover them before falling back to argmin's own
/// error kinds.
impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
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
    // - Recovery of an `OptError` that was wrapped into an argmin error.
    // - Mapping of argmin's own error kinds.
    // - Classification of configuration errors.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure an `OptError` raised inside a cost function survives the round
    // trip through argmin's error type.
    //
    // Given
    // -----
    // - `OptError::FunctionEvaluationLimit { max: 10 }` converted into
    //   `argmin::core::Error`.
    //
    // Expect
    // ------
    // - Converting back yields the identical variant.
    fn from_argmin_error_recovers_wrapped_opt_error() {
        // Arrange
        let wrapped: Error = OptError::FunctionEvaluationLimit { max: 10 }.into();

        // Act
        let recovered = OptError::from(wrapped);

        // Assert
        assert_eq!(recovered, OptError::FunctionEvaluationLimit { max: 10 });
    }

    #[test]
    // Purpose
    // -------
    // Verify that argmin's own error kinds map to the matching wrapper.
    //
    // Given
    // -----
    // - An `ArgminError::ConditionViolated` converted into `Error`.
    //
    // Expect
    // ------
    // - `OptError::ConditionViolated` with the same text.
    fn from_argmin_error_maps_condition_violated() {
        // Arrange
        let wrapped: Error =
            ArgminError::ConditionViolated { text: "descent".to_string() }.into();

        // Act
        let mapped = OptError::from(wrapped);

        // Assert
        assert_eq!(mapped, OptError::ConditionViolated { text: "descent".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // Check that option-validation errors are flagged as configuration
    // errors while runtime failures are not.
    //
    // Given
    // -----
    // - `NoTolerancesProvided` and `FunctionEvaluationLimit`.
    //
    // Expect
    // ------
    // - Only the former is a configuration error.
    fn is_configuration_separates_option_errors_from_runtime_errors() {
        // Arrange
        let config = OptError::NoTolerancesProvided;
        let runtime = OptError::FunctionEvaluationLimit { max: 5 };

        // Act / Assert
        assert!(config.is_configuration());
        assert!(!runtime.is_configuration());
    }
}
