// =============================================================================
// Profile Likelihood
// =============================================================================
//
// Wald intervals assume the log-likelihood is quadratic around β̂. Profiling
// checks that assumption directly: hold one coefficient βⱼ fixed at a value
// b, refit every other coefficient, and measure how much the deviance rises.
//
//     z(b) = sign(b − β̂ⱼ) × sqrt((D(b) − D̂) / φ)
//
// Fixing βⱼ = b is done by moving xⱼ·b into the offset and dropping column j
// from the design, so each point on the profile is an ordinary IRLS fit.
//
// The grid walks away from β̂ⱼ in steps of `step × SEⱼ` in each direction
// until |z| reaches z_max or `max_steps` is used up, where
//
//     z_max = sqrt(χ²₁(1 − α))          fixed dispersion
//     z_max = sqrt(F₁,df(1 − α))        estimated dispersion
//
// and the default step is z_max / 5. Confidence limits interpolate b at
// z = ±Φ⁻¹((1 + level) / 2).
//
// If any refit lands at a LOWER deviance than the original fit (beyond a
// small tolerance), the original fit was not at the optimum and profiling
// stops with `ProfileImproved`.
//
// =============================================================================

use log::debug;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::design::DesignMatrix;
use crate::error::{FitError, Result};
use crate::inference::{quantile_chisq, quantile_f, quantile_normal};
use crate::model::FitResult;
use crate::solvers::{run_irls, FitConfig, IrlsProblem};

/// Tolerance on (D(b) − D̂)/φ below zero before a refit counts as improved.
const IMPROVEMENT_TOLERANCE: f64 = 1e-3;

/// Options for [`profile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    /// Confidence level of the reported limits. Default: 0.95
    pub level: f64,
    /// Sets how far the grid reaches (z_max). Default: 0.01
    pub alpha: f64,
    /// Grid points on each side of the estimate. Default: 10
    pub max_steps: usize,
    /// Step in units of the standard error. Default: z_max / 5
    pub step: Option<f64>,
    /// Coefficient indices to profile. Default: all non-aliased ones.
    pub columns: Option<Vec<usize>>,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            level: 0.95,
            alpha: 0.01,
            max_steps: 10,
            step: None,
            columns: None,
        }
    }
}

/// Profile of one coefficient.
#[derive(Debug, Clone)]
pub struct ParameterProfile {
    pub name: String,
    pub index: usize,
    pub estimate: f64,
    /// Signed root deviance at each grid point, ascending. Includes 0 at the
    /// estimate.
    pub z: Vec<f64>,
    /// Value of the profiled coefficient at each grid point.
    pub values: Vec<f64>,
    /// Full coefficient vector at each grid point.
    pub coefficients: Vec<Array1<f64>>,
    /// Interpolated confidence limits; NaN when the grid did not reach them.
    pub lower: f64,
    pub upper: f64,
}

/// Profile the coefficients of `fitted`, which must have been fitted on `x`.
pub fn profile(
    fitted: &FitResult,
    x: &DesignMatrix,
    config: &FitConfig,
    options: &ProfileOptions,
) -> Result<Vec<ParameterProfile>> {
    if !(options.level > 0.0 && options.level < 1.0) {
        return Err(FitError::InvalidValue(format!(
            "level must be in (0, 1), got {}",
            options.level
        )));
    }
    if !(options.alpha > 0.0 && options.alpha < 1.0) {
        return Err(FitError::InvalidValue(format!(
            "alpha must be in (0, 1), got {}",
            options.alpha
        )));
    }

    let (xm, names) = x.model_matrix(fitted.has_intercept);
    let p = fitted.coefficients.len();
    if xm.ncols() != p || xm.nrows() != fitted.y.len() {
        return Err(FitError::DimensionMismatch(format!(
            "fit has {} coefficients and {} observations, design gives {} x {}",
            p,
            fitted.y.len(),
            xm.nrows(),
            xm.ncols()
        )));
    }

    let z_max = if fitted.family.fixed_dispersion() {
        quantile_chisq(1.0 - options.alpha, 1.0).sqrt()
    } else {
        quantile_f(1.0 - options.alpha, 1.0, fitted.df_residual as f64).sqrt()
    };
    let step = options.step.unwrap_or(z_max / 5.0);
    let z_target = quantile_normal((1.0 + options.level) / 2.0);

    let columns: Vec<usize> = match &options.columns {
        Some(cols) => {
            if let Some(&bad) = cols.iter().find(|&&j| j >= p) {
                return Err(FitError::InvalidValue(format!(
                    "column index {} out of range for {} coefficients",
                    bad, p
                )));
            }
            cols.clone()
        }
        None => (0..p).collect(),
    };

    let mut profiles = Vec::with_capacity(columns.len());
    for j in columns {
        if fitted.aliased.contains(&j) || !fitted.std_errors[j].is_finite() {
            debug!("skipping profile of '{}': standard error undefined", names[j]);
            continue;
        }
        profiles.push(profile_column(
            fitted, &xm, &names, j, config, options.max_steps, step, z_max, z_target,
        )?);
    }
    Ok(profiles)
}

#[allow(clippy::too_many_arguments)]
fn profile_column(
    fitted: &FitResult,
    xm: &Array2<f64>,
    names: &[String],
    j: usize,
    config: &FitConfig,
    max_steps: usize,
    step: f64,
    z_max: f64,
    z_target: f64,
) -> Result<ParameterProfile> {
    let b0 = &fitted.coefficients;
    let se = fitted.std_errors[j];
    let kept: Vec<usize> = (0..xm.ncols()).filter(|&k| k != j).collect();
    let x_rest = xm.select(Axis(1), &kept);
    let rest_names: Vec<String> = kept.iter().map(|&k| names[k].clone()).collect();
    let x_j = xm.column(j);

    let mut points: Vec<(f64, Array1<f64>)> = vec![(0.0, b0.clone())];

    for sign in [-1.0, 1.0] {
        let mut z: f64 = 0.0;
        let mut k = 0;
        while k < max_steps && z.abs() < z_max {
            k += 1;
            let b = b0[j] + sign * k as f64 * step * se;
            let offset = &fitted.offset + &x_j.mapv(|v| v * b);

            let (deviance, rest_coefficients) = if kept.is_empty() {
                let mu = fitted.link.inverse(&offset);
                let dev = fitted.family.deviance(&fitted.y, &mu, Some(&fitted.prior_weights));
                (dev, Array1::zeros(0))
            } else {
                let problem = IrlsProblem {
                    x: &x_rest,
                    names: &rest_names,
                    y: &fitted.y,
                    offset: &offset,
                    prior_weights: &fitted.prior_weights,
                };
                let refit = run_irls(&problem, fitted.family, fitted.link, config, None)?;
                (refit.deviance, refit.coefficients)
            };

            let zz = (deviance - fitted.deviance) / fitted.dispersion;
            if zz < -IMPROVEMENT_TOLERANCE {
                return Err(FitError::ProfileImproved {
                    column: names[j].clone(),
                });
            }
            z = sign * zz.max(0.0).sqrt();

            let mut full = Array1::zeros(b0.len());
            for (&k_col, &coef) in kept.iter().zip(rest_coefficients.iter()) {
                full[k_col] = coef;
            }
            full[j] = b;
            points.push((z, full));
        }
    }

    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    let z: Vec<f64> = points.iter().map(|(z, _)| *z).collect();
    let values: Vec<f64> = points.iter().map(|(_, beta)| beta[j]).collect();
    let coefficients = points.into_iter().map(|(_, beta)| beta).collect();

    Ok(ParameterProfile {
        name: names[j].clone(),
        index: j,
        estimate: b0[j],
        lower: interpolate(&z, &values, -z_target),
        upper: interpolate(&z, &values, z_target),
        z,
        values,
        coefficients,
    })
}

/// Linear interpolation of `values` at `target` along ascending `z`.
fn interpolate(z: &[f64], values: &[f64], target: f64) -> f64 {
    for k in 1..z.len() {
        let (z0, z1) = (z[k - 1], z[k]);
        if z0 <= target && target <= z1 {
            if z1 == z0 {
                return values[k - 1];
            }
            let t = (target - z0) / (z1 - z0);
            return values[k - 1] + t * (values[k] - values[k - 1]);
        }
    }
    f64::NAN
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::Family;
    use crate::inference::confidence_interval_z;
    use crate::links::Link;
    use crate::model::fit;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_interpolate() {
        let z = [-2.0, 0.0, 2.0];
        let v = [1.0, 2.0, 3.0];
        assert_abs_diff_eq!(interpolate(&z, &v, -1.0), 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(interpolate(&z, &v, 2.0), 3.0, epsilon = 1e-12);
        assert!(interpolate(&z, &v, 2.5).is_nan());
    }

    #[test]
    fn test_gaussian_profile_is_wald() {
        let x = DesignMatrix::from_columns(&[("x", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])]).unwrap();
        let y = array![1.3, 1.9, 3.4, 3.8, 5.3, 5.9];
        let config = FitConfig::default();
        let fitted = fit(&x, &y, Family::Gaussian, Link::Identity, &config).unwrap();

        let profiles = profile(&fitted, &x, &config, &ProfileOptions::default()).unwrap();
        assert_eq!(profiles.len(), 2);

        for prof in &profiles {
            let j = prof.index;
            let (lo, hi) = confidence_interval_z(fitted.coefficients[j], fitted.std_errors[j], 0.95);
            assert_abs_diff_eq!(prof.lower, lo, epsilon = 1e-6);
            assert_abs_diff_eq!(prof.upper, hi, epsilon = 1e-6);
            assert!(prof.z.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_binomial_profile_brackets_estimate() {
        let x = DesignMatrix::from_columns(&[("x", &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])]).unwrap();
        let y = array![0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0];
        let config = FitConfig::default();
        let fitted = fit(&x, &y, Family::Binomial, Link::Logit, &config).unwrap();

        let options = ProfileOptions {
            columns: Some(vec![1]),
            ..ProfileOptions::default()
        };
        let profiles = profile(&fitted, &x, &config, &options).unwrap();
        assert_eq!(profiles.len(), 1);
        let prof = &profiles[0];
        assert_eq!(prof.name, "x");
        assert!(prof.lower < prof.estimate && prof.estimate < prof.upper);
        // Each grid point carries a full coefficient vector
        assert!(prof.coefficients.iter().all(|b| b.len() == 2));
    }

    #[test]
    fn test_design_must_match_fit() {
        let x = DesignMatrix::from_columns(&[("x", &[1.0, 2.0, 3.0, 4.0])]).unwrap();
        let y = array![1.0, 2.0, 2.5, 4.5];
        let config = FitConfig::default();
        let fitted = fit(&x, &y, Family::Gaussian, Link::Identity, &config).unwrap();

        let other = DesignMatrix::from_columns(&[("x", &[1.0, 2.0, 3.0, 4.0]), ("z", &[0.0, 1.0, 0.0, 1.0])])
            .unwrap();
        assert!(matches!(
            profile(&fitted, &other, &config, &ProfileOptions::default()),
            Err(FitError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_perturbed_fit_reports_improvement() {
        let x = DesignMatrix::from_columns(&[("x", &[1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        let y = array![1.2, 1.8, 3.1, 4.2, 4.8];
        let config = FitConfig::default();
        let mut fitted = fit(&x, &y, Family::Gaussian, Link::Identity, &config).unwrap();
        // Pretend the fit stopped well short of the optimum.
        fitted.deviance += 1.0;

        let err = profile(&fitted, &x, &config, &ProfileOptions::default()).unwrap_err();
        assert!(matches!(err, FitError::ProfileImproved { .. }));
    }
}
