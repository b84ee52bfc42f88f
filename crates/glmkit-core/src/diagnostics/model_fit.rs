// =============================================================================
// Model Fit Criteria
// =============================================================================
//
// AIC = −2ℓ + 2k
// BIC = −2ℓ + k ln(n)
//
// k counts the estimated coefficients (the rank, so aliased columns are not
// counted) plus one when the family estimates its dispersion. ℓ comes from
// `Family::log_likelihood`.
//
// The null deviance is the deviance of the simplest model the fit is
// compared against: intercept only (refitted with the same offset and
// weights), or no parameters at all when the model has no intercept.
//
// =============================================================================

use ndarray::{Array1, Array2};

use crate::design::INTERCEPT_NAME;
use crate::error::Result;
use crate::families::Family;
use crate::links::Link;
use crate::solvers::{run_irls, FitConfig, IrlsProblem};

/// Akaike information criterion.
pub fn aic(log_likelihood: f64, n_params: usize) -> f64 {
    -2.0 * log_likelihood + 2.0 * n_params as f64
}

/// Bayesian information criterion.
pub fn bic(log_likelihood: f64, n_params: usize, n_obs: usize) -> f64 {
    -2.0 * log_likelihood + n_params as f64 * (n_obs as f64).ln()
}

/// Deviance of the null model.
pub fn null_deviance(
    y: &Array1<f64>,
    family: Family,
    link: Link,
    offset: &Array1<f64>,
    prior_weights: &Array1<f64>,
    config: &FitConfig,
) -> Result<f64> {
    if !config.include_intercept {
        let mu = link.inverse(offset);
        return Ok(family.deviance(y, &mu, Some(prior_weights)));
    }

    let x = Array2::ones((y.len(), 1));
    let names = [INTERCEPT_NAME.to_string()];
    let problem = IrlsProblem {
        x: &x,
        names: &names,
        y,
        offset,
        prior_weights,
    };
    let null_fit = run_irls(&problem, family, link, config, None)?;
    Ok(null_fit.deviance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_aic_bic() {
        assert_abs_diff_eq!(aic(-10.0, 3), 26.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bic(-10.0, 2, 100), 20.0 + 2.0 * 100f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_gaussian_null_deviance_is_total_sum_of_squares() {
        let y = array![1.0, 2.0, 6.0];
        let dev = null_deviance(
            &y,
            Family::Gaussian,
            Link::Identity,
            &Array1::zeros(3),
            &Array1::ones(3),
            &FitConfig::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(dev, 14.0, epsilon = 1e-10);
    }

    #[test]
    fn test_binomial_null_deviance_balanced() {
        let y = array![0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        let dev = null_deviance(
            &y,
            Family::Binomial,
            Link::Logit,
            &Array1::zeros(6),
            &Array1::ones(6),
            &FitConfig::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(dev, 12.0 * 2f64.ln(), epsilon = 1e-8);
    }

    #[test]
    fn test_null_deviance_without_intercept_uses_offset() {
        let y = array![1.0, 3.0];
        let config = FitConfig {
            include_intercept: false,
            ..FitConfig::default()
        };
        let dev = null_deviance(
            &y,
            Family::Gaussian,
            Link::Identity,
            &array![1.0, 1.0],
            &Array1::ones(2),
            &config,
        )
        .unwrap();
        assert_abs_diff_eq!(dev, 4.0, epsilon = 1e-12);
    }
}
