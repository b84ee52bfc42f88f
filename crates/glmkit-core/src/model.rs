// =============================================================================
// Model Fitting Entry Points
// =============================================================================
//
// `fit` → `fit_full` → `fit_with_monitor` all end in the same place:
//
//   1. validate shapes and values
//   2. build the model matrix ([1 | X] unless the intercept is switched off)
//   3. run IRLS
//   4. derive the fit statistics from the final μ/η:
//        - working weights re-evaluated at the final fit
//        - (X'WX)⁻¹ by QR, NaN rows/columns for aliased columns
//        - dispersion, standard errors
//        - null deviance (intercept-only refit, same offset and weights)
//        - log-likelihood, AIC, BIC
//        - leverage, for the influence diagnostics
//
// The returned `FitResult` owns copies of everything it needs (response,
// offset, prior weights), so ANOVA and profiling can work from it alone
// plus the design.
//
// =============================================================================

use ndarray::{Array1, Array2};

use crate::design::DesignMatrix;
use crate::diagnostics::{
    aic, bic, cooks_distance, covratio, dfbeta, dfbetas, dffits, dispersion, kept_columns, leave_one_out_sigma,
    leverage, null_deviance, pearson_chi2, quadratic_form, resid_deviance, resid_pearson,
    resid_response, resid_working, standardized_residuals, studentized_residuals, ResidualKind,
};
use crate::error::{FitError, Result};
use crate::families::Family;
use crate::links::Link;
use crate::solvers::{
    covariance_with_redundancy, run_irls, working_weights, FitConfig, IrlsProblem, Monitor,
};

// =============================================================================
// Result Structure
// =============================================================================

/// A fitted generalized linear model.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Coefficient names, `(Intercept)` first when present.
    pub column_names: Vec<String>,

    /// The fitted coefficients β. Predictions use η = Xβ + offset.
    pub coefficients: Array1<f64>,

    /// sqrt(φ × diag((X'WX)⁻¹)); NaN for aliased columns.
    pub std_errors: Array1<f64>,

    /// (X'WX)⁻¹ at the final weights, unscaled by φ.
    pub covariance_unscaled: Array2<f64>,

    /// Fitted values μ = g⁻¹(η)
    pub fitted_values: Array1<f64>,

    /// Linear predictor η = Xβ + offset
    pub linear_predictor: Array1<f64>,

    pub deviance: f64,
    pub null_deviance: f64,
    pub pearson_chi2: f64,

    /// φ: 1 for binomial/Poisson, Pearson χ² / df otherwise.
    pub dispersion: f64,

    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,

    pub iterations: usize,
    pub converged: bool,

    /// Number of linearly independent columns at the final weights.
    pub rank: usize,
    /// Indices of columns aliased at the final weights.
    pub aliased: Vec<usize>,

    /// Observations with positive prior weight.
    pub n_obs: usize,
    pub df_residual: usize,
    pub df_null: usize,

    /// Working weights re-evaluated at the final fit.
    pub working_weights: Array1<f64>,
    /// Hat values of the final weighted fit.
    pub leverage: Array1<f64>,
    pub prior_weights: Array1<f64>,
    pub offset: Array1<f64>,
    pub y: Array1<f64>,

    pub family: Family,
    pub link: Link,
    pub has_intercept: bool,

    /// Deviance at the start and after every iteration.
    pub deviance_history: Vec<f64>,
}

/// Scale on which `FitResult::predict` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictScale {
    /// η = Xβ + offset
    Link,
    /// μ = g⁻¹(η)
    Response,
}

/// Predictions with their standard errors.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub fit: Array1<f64>,
    /// sqrt(φ xᵀ(X'WX)⁻¹x) on the link scale, times |dμ/dη| on the
    /// response scale.
    pub se_fit: Array1<f64>,
}

// =============================================================================
// Fitting
// =============================================================================

/// Fit a GLM with no offset and unit prior weights.
pub fn fit(
    x: &DesignMatrix,
    y: &Array1<f64>,
    family: Family,
    link: Link,
    config: &FitConfig,
) -> Result<FitResult> {
    fit_full(x, y, family, link, config, None, None)
}

/// Fit a GLM with an optional offset and optional prior weights.
///
/// # Offset
/// Added to the linear predictor: η = Xβ + offset. For rates with varying
/// exposure pass `log(exposure)` with a log link.
///
/// # Weights
/// Prior weights scale each observation's contribution. For binomial
/// proportions they are the number of trials. Zero weights drop an
/// observation from the degrees of freedom.
pub fn fit_full(
    x: &DesignMatrix,
    y: &Array1<f64>,
    family: Family,
    link: Link,
    config: &FitConfig,
    offset: Option<&Array1<f64>>,
    weights: Option<&Array1<f64>>,
) -> Result<FitResult> {
    fit_inner(x, y, family, link, config, offset, weights, None)
}

/// Like [`fit_full`], calling `monitor` after every IRLS iteration.
///
/// The monitor sees the current coefficients and deviance; returning
/// `ControlFlow::Break(())` stops the fit with [`FitError::Cancelled`].
#[allow(clippy::too_many_arguments)]
pub fn fit_with_monitor(
    x: &DesignMatrix,
    y: &Array1<f64>,
    family: Family,
    link: Link,
    config: &FitConfig,
    offset: Option<&Array1<f64>>,
    weights: Option<&Array1<f64>>,
    monitor: &mut Monitor<'_>,
) -> Result<FitResult> {
    fit_inner(x, y, family, link, config, offset, weights, Some(monitor))
}

#[allow(clippy::too_many_arguments)]
fn fit_inner(
    x: &DesignMatrix,
    y: &Array1<f64>,
    family: Family,
    link: Link,
    config: &FitConfig,
    offset: Option<&Array1<f64>>,
    weights: Option<&Array1<f64>>,
    monitor: Option<&mut Monitor<'_>>,
) -> Result<FitResult> {
    // -------------------------------------------------------------------------
    // Step 0: Validate inputs
    // -------------------------------------------------------------------------
    config.validate()?;
    let n = y.len();
    if n == 0 {
        return Err(FitError::EmptyInput("y is empty".to_string()));
    }
    if x.nrows() != n {
        return Err(FitError::DimensionMismatch(format!(
            "X has {} rows but y has {} elements",
            x.nrows(),
            n
        )));
    }
    if x.values().iter().any(|v| !v.is_finite()) {
        return Err(FitError::InvalidValue(
            "design matrix contains non-finite values".to_string(),
        ));
    }
    family.validate_response(y)?;

    let offset = match offset {
        Some(o) => {
            check_length("offset", o, n)?;
            if o.iter().any(|v| !v.is_finite()) {
                return Err(FitError::InvalidValue(
                    "offset contains non-finite values".to_string(),
                ));
            }
            o.clone()
        }
        None => Array1::zeros(n),
    };

    let prior_weights = match weights {
        Some(w) => {
            check_length("weights", w, n)?;
            if w.iter().any(|&v| !v.is_finite() || v < 0.0) {
                return Err(FitError::InvalidValue(
                    "weights must be finite and non-negative".to_string(),
                ));
            }
            w.clone()
        }
        None => Array1::ones(n),
    };

    // -------------------------------------------------------------------------
    // Step 1: Model matrix
    // -------------------------------------------------------------------------
    let (xm, names) = x.model_matrix(config.include_intercept);
    let p = xm.ncols();
    if p == 0 {
        return Err(FitError::EmptyInput(
            "model has no columns (no predictors and no intercept)".to_string(),
        ));
    }
    if p > n {
        return Err(FitError::DimensionMismatch(format!(
            "{} parameters but only {} observations",
            p, n
        )));
    }

    // -------------------------------------------------------------------------
    // Step 2: IRLS
    // -------------------------------------------------------------------------
    let problem = IrlsProblem {
        x: &xm,
        names: &names,
        y,
        offset: &offset,
        prior_weights: &prior_weights,
    };
    let irls = run_irls(&problem, family, link, config, monitor)?;
    let converged = irls.converged();

    // -------------------------------------------------------------------------
    // Step 3: Statistics at the final fit
    // -------------------------------------------------------------------------
    let mu = irls.fitted_values;
    let eta = irls.linear_predictor;

    let w = working_weights(&mu, &eta, &prior_weights, family, link);
    let (covariance_unscaled, aliased) =
        covariance_with_redundancy(&xm, &w, config.rank_tolerance);
    let rank = p - aliased.len();

    let n_obs = prior_weights.iter().filter(|&&wi| wi > 0.0).count();
    let df_residual = n_obs.saturating_sub(rank);
    let df_null = n_obs.saturating_sub(usize::from(config.include_intercept));

    let chi2 = pearson_chi2(y, &mu, family, &prior_weights);
    let phi = dispersion(family, chi2, df_residual);
    let std_errors = Array1::from_shape_fn(p, |j| (phi * covariance_unscaled[[j, j]]).sqrt());

    let hat = leverage(&xm, &w, &aliased);

    let null_dev = null_deviance(y, family, link, &offset, &prior_weights, config)?;

    let log_likelihood = family.log_likelihood(y, &mu, &prior_weights, irls.deviance);
    let n_params = rank + family.extra_parameters();

    Ok(FitResult {
        column_names: names,
        coefficients: irls.coefficients,
        std_errors,
        covariance_unscaled,
        fitted_values: mu,
        linear_predictor: eta,
        deviance: irls.deviance,
        null_deviance: null_dev,
        pearson_chi2: chi2,
        dispersion: phi,
        log_likelihood,
        aic: aic(log_likelihood, n_params),
        bic: bic(log_likelihood, n_params, n_obs),
        iterations: irls.iterations,
        converged,
        rank,
        aliased,
        n_obs,
        df_residual,
        df_null,
        working_weights: w,
        leverage: hat,
        prior_weights,
        offset,
        y: y.clone(),
        family,
        link,
        has_intercept: config.include_intercept,
        deviance_history: irls.deviance_history,
    })
}

fn check_length(what: &str, v: &Array1<f64>, n: usize) -> Result<()> {
    if v.len() != n {
        return Err(FitError::DimensionMismatch(format!(
            "{} has {} elements but y has {}",
            what,
            v.len(),
            n
        )));
    }
    Ok(())
}

// =============================================================================
// Accessors
// =============================================================================

impl FitResult {
    /// Coefficient by name.
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.column_names
            .iter()
            .position(|n| n == name)
            .map(|j| self.coefficients[j])
    }

    /// Scaled covariance φ (X'WX)⁻¹.
    pub fn covariance(&self) -> Array2<f64> {
        &self.covariance_unscaled * self.dispersion
    }

    /// Whether the dispersion was estimated rather than fixed at 1.
    pub fn dispersion_estimated(&self) -> bool {
        !self.family.fixed_dispersion()
    }

    pub fn resid_response(&self) -> Array1<f64> {
        resid_response(&self.y, &self.fitted_values)
    }

    pub fn resid_pearson(&self) -> Array1<f64> {
        resid_pearson(&self.y, &self.fitted_values, self.family, &self.prior_weights)
    }

    pub fn resid_deviance(&self) -> Array1<f64> {
        resid_deviance(&self.y, &self.fitted_values, self.family, &self.prior_weights)
    }

    pub fn resid_working(&self) -> Array1<f64> {
        resid_working(&self.y, &self.fitted_values, &self.linear_predictor, self.link)
    }

    /// Predict for new rows of predictors (no intercept column; it is added
    /// when the model has one).
    pub fn predict(
        &self,
        x: &DesignMatrix,
        offset: Option<&Array1<f64>>,
        scale: PredictScale,
    ) -> Result<Array1<f64>> {
        let (_, eta) = self.new_linear_predictor(x, offset)?;
        Ok(match scale {
            PredictScale::Link => eta,
            PredictScale::Response => self.link.inverse(&eta),
        })
    }

    /// Like [`FitResult::predict`], also returning standard errors.
    ///
    /// Aliased columns do not contribute to the standard errors.
    pub fn predict_with_se(
        &self,
        x: &DesignMatrix,
        offset: Option<&Array1<f64>>,
        scale: PredictScale,
    ) -> Result<Prediction> {
        let (xm, eta) = self.new_linear_predictor(x, offset)?;
        let kept = kept_columns(xm.ncols(), &self.aliased);
        let se_link = Array1::from_shape_fn(xm.nrows(), |i| {
            (self.dispersion * quadratic_form(xm.row(i), &self.covariance_unscaled, &kept)).sqrt()
        });

        Ok(match scale {
            PredictScale::Link => Prediction {
                fit: eta,
                se_fit: se_link,
            },
            PredictScale::Response => {
                let se_fit = Array1::from_shape_fn(eta.len(), |i| {
                    se_link[i] * self.link.derivative(eta[i]).abs()
                });
                Prediction {
                    fit: self.link.inverse(&eta),
                    se_fit,
                }
            }
        })
    }

    fn new_linear_predictor(
        &self,
        x: &DesignMatrix,
        offset: Option<&Array1<f64>>,
    ) -> Result<(Array2<f64>, Array1<f64>)> {
        let (xm, _) = x.model_matrix(self.has_intercept);
        if xm.ncols() != self.coefficients.len() {
            return Err(FitError::DimensionMismatch(format!(
                "model has {} coefficients but new data gives {} columns",
                self.coefficients.len(),
                xm.ncols()
            )));
        }
        let mut eta = xm.dot(&self.coefficients);
        if let Some(o) = offset {
            check_length("offset", o, x.nrows())?;
            eta += o;
        }
        Ok((xm, eta))
    }
}

// =============================================================================
// Influence
// =============================================================================

impl FitResult {
    /// Hat values of the final weighted fit.
    pub fn hat_values(&self) -> Array1<f64> {
        self.leverage.clone()
    }

    /// Standardized residuals r / √(φ(1 − h)); NaN where h = 1.
    pub fn rstandard(&self, kind: ResidualKind) -> Array1<f64> {
        let residuals = match kind {
            ResidualKind::Deviance => self.resid_deviance(),
            ResidualKind::Pearson => self.resid_pearson(),
        };
        standardized_residuals(&residuals, &self.leverage, self.dispersion)
    }

    /// Studentized residuals using the leave-one-out scale.
    pub fn rstudent(&self) -> Array1<f64> {
        let dev = self.resid_deviance();
        let sigma = leave_one_out_sigma(&dev, &self.leverage, self.df_residual);
        studentized_residuals(
            &dev,
            &self.resid_pearson(),
            &self.leverage,
            &sigma,
            self.family.fixed_dispersion(),
        )
    }

    pub fn cooks_distance(&self) -> Array1<f64> {
        cooks_distance(&self.resid_pearson(), &self.leverage, self.dispersion, self.rank)
    }

    pub fn dffits(&self) -> Array1<f64> {
        let dev = self.resid_deviance();
        let sigma = leave_one_out_sigma(&dev, &self.leverage, self.df_residual);
        dffits(&dev, &self.leverage, &sigma)
    }

    pub fn covratio(&self) -> Array1<f64> {
        let dev = self.resid_deviance();
        let sigma = leave_one_out_sigma(&dev, &self.leverage, self.df_residual);
        covratio(&dev, &self.leverage, &sigma, self.df_residual, self.rank)
    }

    /// β − β₍ᵢ₎ per observation; `x` must be the design the model was fitted on.
    pub fn dfbeta(&self, x: &DesignMatrix) -> Result<Array2<f64>> {
        let xm = self.training_matrix(x)?;
        Ok(dfbeta(
            &xm,
            &self.working_weights,
            &self.covariance_unscaled,
            &self.aliased,
            &self.resid_deviance(),
            &self.leverage,
        ))
    }

    /// DFBETA scaled by the leave-one-out standard error of each coefficient.
    pub fn dfbetas(&self, x: &DesignMatrix) -> Result<Array2<f64>> {
        let db = self.dfbeta(x)?;
        let sigma = leave_one_out_sigma(&self.resid_deviance(), &self.leverage, self.df_residual);
        Ok(dfbetas(&db, &self.covariance_unscaled, &sigma))
    }

    fn training_matrix(&self, x: &DesignMatrix) -> Result<Array2<f64>> {
        let (xm, _) = x.model_matrix(self.has_intercept);
        if xm.dim() != (self.y.len(), self.coefficients.len()) {
            return Err(FitError::DimensionMismatch(format!(
                "fit has {} observations and {} coefficients, design gives {} x {}",
                self.y.len(),
                self.coefficients.len(),
                xm.nrows(),
                xm.ncols()
            )));
        }
        Ok(xm)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn line() -> (DesignMatrix, Array1<f64>) {
        let x = DesignMatrix::from_columns(&[("x", &[1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        let y = array![5.1, 7.9, 11.2, 13.8, 17.1];
        (x, y)
    }

    #[test]
    fn test_gaussian_statistics() {
        let (x, y) = line();
        let result = fit(&x, &y, Family::Gaussian, Link::Identity, &FitConfig::default()).unwrap();

        assert!(result.converged);
        assert_eq!(result.column_names, vec!["(Intercept)".to_string(), "x".to_string()]);
        assert_eq!(result.rank, 2);
        assert_eq!(result.df_residual, 3);
        assert_eq!(result.df_null, 4);

        // RSS for the OLS line 2.05 + 2.99x
        let rss: f64 = result.resid_response().iter().map(|r| r * r).sum();
        assert_abs_diff_eq!(result.deviance, rss, epsilon = 1e-10);
        assert_abs_diff_eq!(result.dispersion, rss / 3.0, epsilon = 1e-10);

        // slope SE = sqrt(σ² / Sxx), Sxx = 10
        assert_abs_diff_eq!(result.std_errors[1], (rss / 3.0 / 10.0).sqrt(), epsilon = 1e-10);

        // null deviance = total sum of squares
        let mean = y.mean().unwrap();
        let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
        assert_abs_diff_eq!(result.null_deviance, tss, epsilon = 1e-8);

        // R: n (log(2π RSS/n) + 1) + 2 + 2·2
        let n = 5.0;
        let expected_aic = n * ((2.0 * std::f64::consts::PI * rss / n).ln() + 1.0) + 2.0 + 4.0;
        assert_abs_diff_eq!(result.aic, expected_aic, epsilon = 1e-8);
    }

    #[test]
    fn test_binary_aic_is_deviance_plus_2k() {
        let x = DesignMatrix::from_columns(&[("x", &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        let y = array![1.0, 0.0, 1.0, 0.0, 1.0, 1.0];
        let result = fit(&x, &y, Family::Binomial, Link::Logit, &FitConfig::default()).unwrap();
        assert_abs_diff_eq!(result.aic, result.deviance + 4.0, epsilon = 1e-8);
        assert_eq!(result.dispersion, 1.0);
    }

    #[test]
    fn test_predict_scales() {
        let x = DesignMatrix::from_columns(&[("x", &[0.0, 1.0, 2.0, 3.0])]).unwrap();
        let y = array![1.0, 2.0, 4.0, 9.0];
        let result = fit(&x, &y, Family::Poisson, Link::Log, &FitConfig::default()).unwrap();

        let new_x = DesignMatrix::from_columns(&[("x", &[1.0])]).unwrap();
        let eta = result.predict(&new_x, None, PredictScale::Link).unwrap();
        let mu = result.predict(&new_x, None, PredictScale::Response).unwrap();
        assert_abs_diff_eq!(mu[0], eta[0].exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(mu[0], result.fitted_values[1], epsilon = 1e-10);

        let wrong = DesignMatrix::from_columns(&[("x", &[1.0]), ("z", &[2.0])]).unwrap();
        assert!(result.predict(&wrong, None, PredictScale::Link).is_err());
    }

    #[test]
    fn test_prediction_standard_errors() {
        // y = [1, 3, 2, 5, 4] on x = 1..5: σ² = 3.6 / 3, Sxx = 10
        let x = DesignMatrix::from_columns(&[("x", &[1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        let y = array![1.0, 3.0, 2.0, 5.0, 4.0];
        let result = fit(&x, &y, Family::Gaussian, Link::Identity, &FitConfig::default()).unwrap();

        let new_x = DesignMatrix::from_columns(&[("x", &[3.0, 5.0])]).unwrap();
        let pred = result.predict_with_se(&new_x, None, PredictScale::Link).unwrap();
        assert_abs_diff_eq!(pred.fit[0], 3.0, epsilon = 1e-10);
        // σ² (1/n + (x − x̄)² / Sxx)
        assert_abs_diff_eq!(pred.se_fit[0], (1.2f64 * 0.2).sqrt(), epsilon = 1e-10);
        assert_abs_diff_eq!(pred.se_fit[1], (1.2f64 * 0.6).sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn test_response_scale_se_uses_delta_method() {
        let x = DesignMatrix::from_columns(&[("x", &[0.0, 1.0, 2.0, 3.0])]).unwrap();
        let y = array![1.0, 2.0, 4.0, 9.0];
        let result = fit(&x, &y, Family::Poisson, Link::Log, &FitConfig::default()).unwrap();

        let new_x = DesignMatrix::from_columns(&[("x", &[1.5, 4.0])]).unwrap();
        let link = result.predict_with_se(&new_x, None, PredictScale::Link).unwrap();
        let response = result.predict_with_se(&new_x, None, PredictScale::Response).unwrap();
        for i in 0..2 {
            // log link: dμ/dη = μ
            assert_abs_diff_eq!(response.fit[i], link.fit[i].exp(), epsilon = 1e-12);
            assert_abs_diff_eq!(response.se_fit[i], link.se_fit[i] * response.fit[i], epsilon = 1e-10);
        }
        // extrapolating further out is less certain
        assert!(link.se_fit[1] > link.se_fit[0]);
    }

    #[test]
    fn test_influence_of_simple_regression() {
        let x = DesignMatrix::from_columns(&[("x", &[1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        let y = array![1.0, 3.0, 2.0, 5.0, 4.0];
        let result = fit(&x, &y, Family::Gaussian, Link::Identity, &FitConfig::default()).unwrap();

        let h = result.hat_values();
        for (a, b) in h.iter().zip([0.6, 0.3, 0.2, 0.3, 0.6].iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-10);
        }
        // residual of the first point is −0.4
        assert_abs_diff_eq!(result.rstandard(ResidualKind::Deviance)[0], -0.4 / 0.48f64.sqrt(), epsilon = 1e-8);
        assert_abs_diff_eq!(result.rstandard(ResidualKind::Pearson)[0], -0.4 / 0.48f64.sqrt(), epsilon = 1e-8);
        assert_abs_diff_eq!(result.rstudent()[0], -0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(result.cooks_distance()[0], 0.25, epsilon = 1e-8);
        assert_abs_diff_eq!(result.dffits()[0], -0.5 * 1.5f64.sqrt(), epsilon = 1e-8);
        assert_abs_diff_eq!(result.covratio()[0], (1.6f64 / 1.2).powi(2) / 0.4, epsilon = 1e-8);

        // dropping the first point refits to 1.4 + 0.6x
        let db = result.dfbeta(&x).unwrap();
        assert_abs_diff_eq!(db[[0, 0]], -0.8, epsilon = 1e-8);
        assert_abs_diff_eq!(db[[0, 1]], 0.2, epsilon = 1e-8);
        assert_eq!(result.dfbetas(&x).unwrap().dim(), (5, 2));

        let other = DesignMatrix::from_columns(&[("x", &[1.0, 2.0])]).unwrap();
        assert!(result.dfbeta(&other).is_err());
    }

    #[test]
    fn test_point_with_own_indicator_has_unit_leverage() {
        let x = DesignMatrix::from_columns(&[
            ("x", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            ("last", &[0.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
        ])
        .unwrap();
        let y = array![2.0, 3.0, 5.0, 4.0, 6.0, 20.0];
        let result = fit(&x, &y, Family::Gaussian, Link::Identity, &FitConfig::default()).unwrap();

        assert_eq!(result.hat_values()[5], 1.0);
        assert!(result.rstandard(ResidualKind::Deviance)[5].is_nan());
        assert!(result.rstudent()[5].is_nan());
        assert!(result.cooks_distance()[5].is_nan());
        assert!(result.cooks_distance()[0].is_finite());
    }

    #[test]
    fn test_poisson_leverage_sums_to_rank() {
        let x = DesignMatrix::from_columns(&[("x", &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        let y = array![2.0, 2.0, 3.0, 4.0, 5.0, 7.0];
        let result = fit(&x, &y, Family::Poisson, Link::Log, &FitConfig::default()).unwrap();

        let h = result.hat_values();
        assert_abs_diff_eq!(h.sum(), 2.0, epsilon = 1e-8);
        assert!(h.iter().all(|&v| (0.0..1.0).contains(&v)));
        // fixed dispersion: rstudent is not rescaled by σ₍ᵢ₎
        let dev = result.resid_deviance();
        let pear = result.resid_pearson();
        let expected = dev[0].signum() * (dev[0].powi(2) + h[0] * pear[0].powi(2) / (1.0 - h[0])).sqrt();
        assert_abs_diff_eq!(result.rstudent()[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_validation_errors() {
        let (x, y) = line();
        let short = array![1.0, 2.0];
        assert!(matches!(
            fit(&x, &short, Family::Gaussian, Link::Identity, &FitConfig::default()),
            Err(FitError::DimensionMismatch(_))
        ));
        assert!(matches!(
            fit_full(&x, &y, Family::Gaussian, Link::Identity, &FitConfig::default(), Some(&short), None),
            Err(FitError::DimensionMismatch(_))
        ));
        let negative = array![1.0, -1.0, 1.0, 1.0, 1.0];
        assert!(matches!(
            fit_full(&x, &y, Family::Gaussian, Link::Identity, &FitConfig::default(), None, Some(&negative)),
            Err(FitError::InvalidValue(_))
        ));
        assert!(matches!(
            fit(&x, &Array1::zeros(0), Family::Gaussian, Link::Identity, &FitConfig::default()),
            Err(FitError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_more_parameters_than_observations() {
        let x = DesignMatrix::new(array![[1.0, 2.0], [3.0, 5.0]]);
        let y = array![1.0, 2.0];
        assert!(matches!(
            fit(&x, &y, Family::Gaussian, Link::Identity, &FitConfig::default()),
            Err(FitError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_zero_weight_rows_leave_degrees_of_freedom() {
        let (x, y) = line();
        let w = array![1.0, 1.0, 1.0, 1.0, 0.0];
        let result = fit_full(&x, &y, Family::Gaussian, Link::Identity, &FitConfig::default(), None, Some(&w)).unwrap();
        assert_eq!(result.n_obs, 4);
        assert_eq!(result.df_residual, 2);
    }

    #[test]
    fn test_no_intercept() {
        let x = DesignMatrix::from_columns(&[("x", &[1.0, 2.0, 3.0])]).unwrap();
        let y = array![2.0, 4.0, 6.5];
        let config = FitConfig {
            include_intercept: false,
            ..FitConfig::default()
        };
        let result = fit(&x, &y, Family::Gaussian, Link::Identity, &config).unwrap();
        assert_eq!(result.coefficients.len(), 1);
        assert_eq!(result.df_null, 3);
        // null model μ = 0: deviance = Σy²
        assert_abs_diff_eq!(result.null_deviance, 4.0 + 16.0 + 42.25, epsilon = 1e-10);
    }
}
