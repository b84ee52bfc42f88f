// =============================================================================
// Error Types
// =============================================================================
//
// Every fallible operation in the library returns `Result<T>`, an alias for
// `std::result::Result<T, FitError>`.
//
// Hitting the iteration cap is NOT an error: the fit comes back with
// `converged == false` and the best estimate so far. Errors are reserved for
// fits that cannot produce a meaningful estimate at all.
//
// Where the failure happens inside the IRLS loop, the error carries the
// iteration number and the last coefficients that were still valid, so a
// caller can inspect how close the fit got before it broke down.
//
// =============================================================================

use ndarray::Array1;
use thiserror::Error;

/// Errors raised while fitting or analysing a GLM.
#[derive(Debug, Clone, Error)]
pub enum FitError {
    /// Shapes don't line up: X rows vs y length, weights/offset length,
    /// or more parameters than observations.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// No observations or no columns to fit.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Input values outside what the model accepts (non-finite data,
    /// negative weights, responses outside the family's support, ...).
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The weighted design is rank deficient.
    #[error(
        "singular weighted design at iteration {iteration}: redundant column(s) {}",
        names.join(", ")
    )]
    Singular {
        iteration: usize,
        /// Indices into the model matrix (intercept included) of the
        /// columns found linearly dependent on earlier ones.
        columns: Vec<usize>,
        names: Vec<String>,
        last_coefficients: Option<Array1<f64>>,
    },

    /// η, μ or the deviance left the representable range.
    #[error("numeric overflow at iteration {iteration}: {cause}")]
    NumericOverflow {
        iteration: usize,
        cause: String,
        last_coefficients: Option<Array1<f64>>,
    },

    /// The link drove μ (or η) outside the range the family/link accepts.
    #[error(
        "family '{family}' with link '{link}' produced invalid fitted values at iteration {iteration}"
    )]
    InvalidFamilyLinkCombination {
        family: &'static str,
        link: &'static str,
        iteration: usize,
        last_coefficients: Option<Array1<f64>>,
    },

    /// A later design in an ANOVA sequence does not contain an earlier one.
    #[error("models are not nested: {0}")]
    NotNested(String),

    /// The iteration monitor asked the fit to stop.
    #[error("fit cancelled at iteration {iteration}")]
    Cancelled {
        iteration: usize,
        last_coefficients: Option<Array1<f64>>,
    },

    /// Profiling found a fit with a lower deviance than the original one,
    /// so the original fit was not at the optimum.
    #[error("profiling '{column}' found a better fit than the original model")]
    ProfileImproved { column: String },
}

impl FitError {
    /// The iteration at which an IRLS failure happened, if it has one.
    pub fn iteration(&self) -> Option<usize> {
        match self {
            FitError::Singular { iteration, .. }
            | FitError::NumericOverflow { iteration, .. }
            | FitError::InvalidFamilyLinkCombination { iteration, .. }
            | FitError::Cancelled { iteration, .. } => Some(*iteration),
            _ => None,
        }
    }

    /// Last valid coefficients before the failure, when any were reached.
    pub fn last_coefficients(&self) -> Option<&Array1<f64>> {
        match self {
            FitError::Singular { last_coefficients, .. }
            | FitError::NumericOverflow { last_coefficients, .. }
            | FitError::InvalidFamilyLinkCombination { last_coefficients, .. }
            | FitError::Cancelled { last_coefficients, .. } => last_coefficients.as_ref(),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_singular_message_names_columns() {
        let err = FitError::Singular {
            iteration: 1,
            columns: vec![2],
            names: vec!["x1_copy".to_string()],
            last_coefficients: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("x1_copy"));
        assert!(msg.contains("iteration 1"));
    }

    #[test]
    fn test_partial_progress_accessors() {
        let err = FitError::NumericOverflow {
            iteration: 4,
            cause: "non-finite linear predictor".to_string(),
            last_coefficients: Some(array![1.0, -2.0]),
        };
        assert_eq!(err.iteration(), Some(4));
        assert_eq!(err.last_coefficients(), Some(&array![1.0, -2.0]));

        let err = FitError::EmptyInput("y is empty".to_string());
        assert_eq!(err.iteration(), None);
        assert!(err.last_coefficients().is_none());
    }
}
