// =============================================================================
// glmkit Core Library
// =============================================================================
//
// Generalized linear models fitted by Iteratively Reweighted Least Squares,
// plus the statistics derived from a fit: standard errors, deviance, null
// deviance, AIC/BIC, analysis of deviance over nested models, and profile
// likelihood intervals.
//
// STRUCTURE:
// ----------
//   - design:      DesignMatrix, the named numeric predictors a caller hands in
//   - links:       Link functions (Identity, Log, Logit, Probit, ...)
//   - families:    Distribution families (Gaussian, Binomial, Poisson, ...)
//   - solvers:     QR weighted least squares and the IRLS driver
//   - model:       fit / fit_full / fit_with_monitor and FitResult
//   - diagnostics: Residuals, dispersion, AIC/BIC, null deviance, influence
//   - inference:   P-values, confidence intervals, quantiles
//   - summary:     Coefficient table and printable summary
//   - anova:       Analysis of deviance over nested models
//   - profile:     Profile-likelihood confidence intervals
//   - error:       Error types used throughout the library
//
// LOGGING:
// --------
// The library logs through the `log` facade and never installs a logger.
// `trace` shows every IRLS iteration, `debug` convergence, `warn` fits that
// hit the iteration cap.
//
// FOR MAINTAINERS:
// ----------------
// When adding new functionality:
//   1. Add it to the appropriate module (or create a new one)
//   2. Write tests in that module (see existing tests for examples)
//   3. Re-export public items here so users can access them easily
//
// =============================================================================

pub mod anova;
pub mod constants;
pub mod convert;
pub mod design;
pub mod diagnostics;
pub mod error;
pub mod families;
pub mod inference;
pub mod links;
pub mod model;
pub mod profile;
pub mod solvers;
pub mod summary;

// Re-export commonly used items at the top level for convenience
pub use anova::{anova, anova_sequential, anova_with_test, AnovaRow, AnovaTable, AnovaTest};
pub use design::{DesignMatrix, INTERCEPT_NAME};
pub use diagnostics::ResidualKind;
pub use error::{FitError, Result};
pub use families::Family;
pub use inference::{confidence_interval_t, confidence_interval_z, pvalue_t, pvalue_z};
pub use links::Link;
pub use model::{fit, fit_full, fit_with_monitor, FitResult, PredictScale, Prediction};
pub use profile::{profile, ParameterProfile, ProfileOptions};
pub use solvers::{FitConfig, IterationState, Monitor};
pub use summary::{CoefficientRow, Summary, TestStatistic};
