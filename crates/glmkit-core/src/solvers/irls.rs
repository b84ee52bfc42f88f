// =============================================================================
// IRLS: Iteratively Reweighted Least Squares
// =============================================================================
//
// This is THE algorithm for fitting GLMs. Every `fit`, the null-model refit,
// each ANOVA model and each profiling step end up in `run_irls`.
//
// THE BIG PICTURE
// ---------------
// We want the β that maximizes the likelihood. For GLMs there is no closed
// form, so we repeatedly linearize around the current fit:
//
//     Start with μ₀ from the family's starting rule, η₀ = g(μ₀)
//     Repeat:
//         1. d = dμ/dη at the current η
//         2. Working weights   w = prior × d² / V(μ)
//         3. Working response  z = (η − offset) + (y − μ) / d
//         4. Solve weighted least squares for β
//         5. η = Xβ + offset, μ = g⁻¹(η), recompute the deviance
//         6. Stop when the deviance has settled
//
// STATES
// ------
//     Initializing → Iterating → Converged
//                              → MaxIterationsReached   (still Ok, converged = false)
//                              → Failed                 (Err, see below)
//
// Failures carry the iteration number and the coefficients of the last
// iteration that completed cleanly:
//   - the weighted design lost rank                      → Singular
//   - η, μ or the deviance stopped being finite          → NumericOverflow
//   - μ outside the family's range / η outside the link's domain
//                                                        → InvalidFamilyLinkCombination
//   - the monitor asked to stop                          → Cancelled
//
// CONVERGENCE
// -----------
//     |dev_new − dev_old| / (|dev_old| + 0.1) < tolerance
//
// The 0.1 keeps the criterion meaningful when the deviance heads to zero,
// as it does for perfectly separated binomial data.
//
// There is no step-halving: an invalid μ is reported, not repaired.
//
// =============================================================================

use std::ops::ControlFlow;

use log::{debug, trace, warn};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::wls::solve_wls;
use crate::constants::{CONVERGENCE_DEVIANCE_FLOOR, DEFAULT_RANK_TOLERANCE};
use crate::error::{FitError, Result};
use crate::families::Family;
use crate::links::Link;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration options for a fit.
///
/// Missing fields take their defaults when deserializing, so a partial
/// config such as `{"max_iterations": 50}` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Convergence tolerance on the relative deviance change.
    /// Default: 1e-8
    pub tolerance: f64,

    /// Maximum number of iterations before giving up.
    /// Default: 25
    pub max_iterations: usize,

    /// Prepend an intercept column to the design.
    /// Default: true
    pub include_intercept: bool,

    /// Relative threshold on |R_jj| below which a column is redundant.
    /// Default: 1e-11
    pub rank_tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 25,
            include_intercept: true,
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        }
    }
}

impl FitConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(FitError::InvalidValue(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(FitError::InvalidValue(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.rank_tolerance.is_finite() && self.rank_tolerance >= 0.0) {
            return Err(FitError::InvalidValue(format!(
                "rank_tolerance must be non-negative, got {}",
                self.rank_tolerance
            )));
        }
        Ok(())
    }
}

// =============================================================================
// State exposed to monitors
// =============================================================================

/// Snapshot of the solver after a completed iteration.
///
/// Handed to the monitor callback; the solver owns the data.
#[derive(Debug, Clone, Copy)]
pub struct IterationState<'a> {
    pub iteration: usize,
    pub coefficients: &'a Array1<f64>,
    pub linear_predictor: &'a Array1<f64>,
    pub fitted_values: &'a Array1<f64>,
    pub deviance: f64,
}

/// Per-iteration callback. Returning `ControlFlow::Break(())` stops the fit
/// with `FitError::Cancelled`.
pub type Monitor<'m> = dyn FnMut(&IterationState<'_>) -> ControlFlow<()> + 'm;

/// How the iteration loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrlsStatus {
    Converged,
    MaxIterationsReached,
}

/// Everything one IRLS run produces.
#[derive(Debug, Clone)]
pub struct IrlsResult {
    pub coefficients: Array1<f64>,
    /// η = Xβ + offset
    pub linear_predictor: Array1<f64>,
    /// μ = g⁻¹(η)
    pub fitted_values: Array1<f64>,
    pub deviance: f64,
    pub iterations: usize,
    pub status: IrlsStatus,
    /// Starting deviance followed by the deviance after each iteration.
    pub deviance_history: Vec<f64>,
}

impl IrlsResult {
    pub fn converged(&self) -> bool {
        self.status == IrlsStatus::Converged
    }
}

/// The data an IRLS run works on. All lengths are already checked.
#[derive(Debug, Clone, Copy)]
pub struct IrlsProblem<'a> {
    /// Model matrix, intercept column included when there is one.
    pub x: &'a Array2<f64>,
    pub names: &'a [String],
    pub y: &'a Array1<f64>,
    pub offset: &'a Array1<f64>,
    pub prior_weights: &'a Array1<f64>,
}

// =============================================================================
// Main loop
// =============================================================================

/// Run IRLS to convergence, to the iteration cap, or to the first failure.
pub fn run_irls(
    problem: &IrlsProblem<'_>,
    family: Family,
    link: Link,
    config: &FitConfig,
    mut monitor: Option<&mut Monitor<'_>>,
) -> Result<IrlsResult> {
    let IrlsProblem {
        x,
        names,
        y,
        offset,
        prior_weights,
    } = *problem;

    // -------------------------------------------------------------------------
    // Initializing
    // -------------------------------------------------------------------------
    let mut mu = family.initialize_mu(y, prior_weights);
    let mut eta = link.link(&mu);
    check_eta(&eta, family, link, 0, None)?;

    let mut deviance = family.deviance(y, &mu, Some(prior_weights));
    if !deviance.is_finite() {
        return Err(FitError::NumericOverflow {
            iteration: 0,
            cause: "non-finite starting deviance".to_string(),
            last_coefficients: None,
        });
    }

    let mut history = vec![deviance];
    let mut coefficients: Option<Array1<f64>> = None;
    let mut status = IrlsStatus::MaxIterationsReached;
    let mut iteration = 0;

    // -------------------------------------------------------------------------
    // Iterating
    // -------------------------------------------------------------------------
    while iteration < config.max_iterations {
        iteration += 1;

        let mu_eta = link.mu_eta(&eta);
        if let Some(i) = mu_eta.iter().position(|d| !d.is_finite() || *d == 0.0) {
            return Err(FitError::NumericOverflow {
                iteration,
                cause: format!("dμ/dη is {} at observation {}", mu_eta[i], i),
                last_coefficients: coefficients,
            });
        }

        let (z, w) = working_response_and_weights(y, &mu, &eta, offset, &mu_eta, prior_weights, family);

        let solution = solve_wls(x, &z, &w, config.rank_tolerance).map_err(|deficiency| {
            FitError::Singular {
                iteration,
                names: deficiency
                    .columns
                    .iter()
                    .map(|&j| names.get(j).cloned().unwrap_or_else(|| format!("column {}", j)))
                    .collect(),
                columns: deficiency.columns,
                last_coefficients: coefficients.clone(),
            }
        })?;
        let beta = solution.coefficients;

        let new_eta = x.dot(&beta) + offset;
        check_eta(&new_eta, family, link, iteration, coefficients.as_ref())?;

        let new_mu = link.inverse(&new_eta);
        if new_mu.iter().any(|m| !m.is_finite()) {
            return Err(FitError::NumericOverflow {
                iteration,
                cause: "non-finite fitted values".to_string(),
                last_coefficients: coefficients,
            });
        }
        if !family.is_valid_mu(&new_mu) {
            return Err(invalid_combination(family, link, iteration, coefficients));
        }

        let new_deviance = family.deviance(y, &new_mu, Some(prior_weights));
        if !new_deviance.is_finite() {
            return Err(FitError::NumericOverflow {
                iteration,
                cause: "non-finite deviance".to_string(),
                last_coefficients: coefficients,
            });
        }

        let rel_change =
            (new_deviance - deviance).abs() / (deviance.abs() + CONVERGENCE_DEVIANCE_FLOOR);
        trace!(
            "IRLS iteration {}: deviance = {:.10}, rel_change = {:.3e}",
            iteration,
            new_deviance,
            rel_change
        );

        eta = new_eta;
        mu = new_mu;
        deviance = new_deviance;
        history.push(deviance);

        if let Some(callback) = monitor.as_mut() {
            let state = IterationState {
                iteration,
                coefficients: &beta,
                linear_predictor: &eta,
                fitted_values: &mu,
                deviance,
            };
            if callback(&state).is_break() {
                return Err(FitError::Cancelled {
                    iteration,
                    last_coefficients: Some(beta),
                });
            }
        }

        coefficients = Some(beta);

        if rel_change < config.tolerance {
            status = IrlsStatus::Converged;
            break;
        }
    }

    match status {
        IrlsStatus::Converged => debug!(
            "IRLS ({}/{}) converged after {} iterations, deviance = {:.10}",
            family, link, iteration, deviance
        ),
        IrlsStatus::MaxIterationsReached => warn!(
            "IRLS ({}/{}) did not converge within {} iterations, deviance = {:.10}",
            family, link, config.max_iterations, deviance
        ),
    }

    let coefficients = coefficients.ok_or_else(|| {
        FitError::InvalidValue("IRLS finished without completing an iteration".to_string())
    })?;

    Ok(IrlsResult {
        coefficients,
        linear_predictor: eta,
        fitted_values: mu,
        deviance,
        iterations: iteration,
        status,
        deviance_history: history,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Working response z = (η − offset) + (y − μ)/d and working weights
/// w = prior × d²/V(μ), where d = dμ/dη.
fn working_response_and_weights(
    y: &Array1<f64>,
    mu: &Array1<f64>,
    eta: &Array1<f64>,
    offset: &Array1<f64>,
    mu_eta: &Array1<f64>,
    prior_weights: &Array1<f64>,
    family: Family,
) -> (Array1<f64>, Array1<f64>) {
    let n = y.len();
    let mut z = Array1::zeros(n);
    let mut w = Array1::zeros(n);
    for i in 0..n {
        let d = mu_eta[i];
        z[i] = (eta[i] - offset[i]) + (y[i] - mu[i]) / d;
        w[i] = prior_weights[i] * d * d / family.variance(mu[i]);
    }
    (z, w)
}

/// Working weights at a given η (no working response).
pub(crate) fn working_weights(
    mu: &Array1<f64>,
    eta: &Array1<f64>,
    prior_weights: &Array1<f64>,
    family: Family,
    link: Link,
) -> Array1<f64> {
    let mu_eta = link.mu_eta(eta);
    Array1::from_shape_fn(mu.len(), |i| {
        prior_weights[i] * mu_eta[i] * mu_eta[i] / family.variance(mu[i])
    })
}

fn check_eta(
    eta: &Array1<f64>,
    family: Family,
    link: Link,
    iteration: usize,
    last: Option<&Array1<f64>>,
) -> Result<()> {
    if eta.iter().any(|e| !e.is_finite()) {
        return Err(FitError::NumericOverflow {
            iteration,
            cause: "non-finite linear predictor".to_string(),
            last_coefficients: last.cloned(),
        });
    }
    if eta.iter().any(|&e| !link.valid_eta(e)) {
        return Err(invalid_combination(family, link, iteration, last.cloned()));
    }
    Ok(())
}

fn invalid_combination(
    family: Family,
    link: Link,
    iteration: usize,
    last_coefficients: Option<Array1<f64>>,
) -> FitError {
    FitError::InvalidFamilyLinkCombination {
        family: family.name(),
        link: link.name(),
        iteration,
        last_coefficients,
    }
}

// =============================================================================
// Tests
// =============================================================================
