// =============================================================================
// GLM Solvers
// =============================================================================
//
// This module contains the algorithms that fit a GLM.
//
// HOW GLM FITTING WORKS (High-Level Overview)
// -------------------------------------------
//
// We want to find coefficients β that best explain the relationship:
//
//     g(E[Y]) = Xβ + offset
//
// where:
//   - Y is the response variable
//   - X is the model matrix (predictors, plus the intercept column)
//   - β is the coefficient vector (what we're solving for)
//   - g is the link function
//
// We can't solve this directly because:
//   1. The link function g() makes it non-linear
//   2. The variance depends on μ (heteroscedasticity)
//
// IRLS (irls.rs) solves it by repeatedly linearizing around the current fit
// and handing a weighted least-squares problem to the QR solver (wls.rs).
//
// =============================================================================

mod irls;
pub mod wls;

pub use irls::{
    run_irls, FitConfig, IrlsProblem, IrlsResult, IrlsStatus, IterationState, Monitor,
};
pub(crate) use irls::working_weights;
pub use wls::{covariance_with_redundancy, solve_wls, RankDeficiency, WlsSolution};
