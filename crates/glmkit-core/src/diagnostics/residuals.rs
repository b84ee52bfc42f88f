// =============================================================================
// Residuals
// =============================================================================
//
//   response   y − μ
//   pearson    √w (y − μ) / √V(μ)
//   deviance   sign(y − μ) √(w d(y, μ))      Σ r² = deviance
//   working    (y − μ) / (dμ/dη)             the IRLS working residual
//
// `w` are the prior weights. Observations with zero weight get a zero
// Pearson/deviance residual.
//
// =============================================================================

use ndarray::Array1;

use crate::families::Family;
use crate::links::Link;

/// Raw residuals y − μ.
pub fn resid_response(y: &Array1<f64>, mu: &Array1<f64>) -> Array1<f64> {
    y - mu
}

/// Pearson residuals √w (y − μ) / √V(μ).
pub fn resid_pearson(
    y: &Array1<f64>,
    mu: &Array1<f64>,
    family: Family,
    prior_weights: &Array1<f64>,
) -> Array1<f64> {
    Array1::from_shape_fn(y.len(), |i| {
        prior_weights[i].sqrt() * (y[i] - mu[i]) / family.variance(mu[i]).sqrt()
    })
}

/// Deviance residuals sign(y − μ) √(w d(y, μ)).
pub fn resid_deviance(
    y: &Array1<f64>,
    mu: &Array1<f64>,
    family: Family,
    prior_weights: &Array1<f64>,
) -> Array1<f64> {
    Array1::from_shape_fn(y.len(), |i| {
        let d = (prior_weights[i] * family.unit_deviance(y[i], mu[i])).max(0.0);
        let sign = if y[i] >= mu[i] { 1.0 } else { -1.0 };
        sign * d.sqrt()
    })
}

/// Working residuals (y − μ) / (dμ/dη).
pub fn resid_working(
    y: &Array1<f64>,
    mu: &Array1<f64>,
    eta: &Array1<f64>,
    link: Link,
) -> Array1<f64> {
    Array1::from_shape_fn(y.len(), |i| (y[i] - mu[i]) / link.derivative(eta[i]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_deviance_residuals_square_to_deviance() {
        let y = array![0.0, 2.0, 5.0, 1.0];
        let mu = array![0.5, 2.5, 3.0, 1.5];
        let w = array![1.0, 2.0, 1.0, 0.5];
        let r = resid_deviance(&y, &mu, Family::Poisson, &w);
        let total: f64 = r.iter().map(|v| v * v).sum();
        assert_abs_diff_eq!(total, Family::Poisson.deviance(&y, &mu, Some(&w)), epsilon = 1e-12);
        assert!(r[0] < 0.0 && r[2] > 0.0);
    }

    #[test]
    fn test_pearson_residuals_poisson() {
        let r = resid_pearson(&array![4.0], &array![1.0], Family::Poisson, &array![1.0]);
        assert_abs_diff_eq!(r[0], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_working_residuals_identity_equal_response() {
        let y = array![1.0, 2.0];
        let mu = array![0.5, 2.5];
        assert_eq!(resid_working(&y, &mu, &mu, Link::Identity), resid_response(&y, &mu));
    }
}
