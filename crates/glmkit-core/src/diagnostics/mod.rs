// =============================================================================
// Model Diagnostics
// =============================================================================
//
// Diagnostic tools for assessing GLM quality:
//
// - RESIDUALS: Different ways to measure prediction errors
// - DISPERSION: Estimating the scale parameter φ
// - MODEL FIT: AIC, BIC and the null deviance
// - INFLUENCE: Leverage, standardized/studentized residuals, Cook's distance
//
// Names follow the statsmodels conventions:
// - resid_response: Raw residuals (y - μ)
// - resid_pearson: Standardized by variance
// - resid_deviance: Based on deviance contributions
// - resid_working: Used internally in IRLS
//
// =============================================================================

mod dispersion;
mod influence;
mod model_fit;
mod residuals;

pub use residuals::{resid_deviance, resid_pearson, resid_response, resid_working};

pub use dispersion::{
    dispersion, estimate_dispersion_deviance, estimate_dispersion_pearson, pearson_chi2,
};

pub use model_fit::{aic, bic, null_deviance};

pub use influence::{
    cooks_distance, covratio, dfbeta, dfbetas, dffits, leave_one_out_sigma, leverage, standardized_residuals,
    studentized_residuals, ResidualKind,
};
pub(crate) use influence::{kept_columns, quadratic_form};
