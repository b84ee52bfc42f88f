// =============================================================================
// Dispersion
// =============================================================================
//
// Var(Y) = φ V(μ). Binomial and Poisson fix φ = 1; the other families
// estimate it, by default from the Pearson statistic:
//
//     φ̂ = Σ wᵢ (yᵢ − μᵢ)² / V(μᵢ)  /  (n − p)
//
// With no residual degrees of freedom the estimate is undefined (NaN).
//
// =============================================================================

use ndarray::Array1;

use crate::families::Family;

/// Pearson χ² = Σ wᵢ (yᵢ − μᵢ)² / V(μᵢ).
pub fn pearson_chi2(
    y: &Array1<f64>,
    mu: &Array1<f64>,
    family: Family,
    prior_weights: &Array1<f64>,
) -> f64 {
    y.iter()
        .zip(mu.iter())
        .zip(prior_weights.iter())
        .map(|((&yi, &mui), &wi)| wi * (yi - mui).powi(2) / family.variance(mui))
        .sum()
}

/// Pearson χ² / residual df.
pub fn estimate_dispersion_pearson(pearson_chi2: f64, df_residual: usize) -> f64 {
    if df_residual == 0 {
        return f64::NAN;
    }
    pearson_chi2 / df_residual as f64
}

/// Deviance / residual df.
pub fn estimate_dispersion_deviance(deviance: f64, df_residual: usize) -> f64 {
    if df_residual == 0 {
        return f64::NAN;
    }
    deviance / df_residual as f64
}

/// The φ used for standard errors: 1 for fixed-dispersion families,
/// the Pearson estimate otherwise.
pub fn dispersion(family: Family, pearson_chi2: f64, df_residual: usize) -> f64 {
    if family.fixed_dispersion() {
        1.0
    } else {
        estimate_dispersion_pearson(pearson_chi2, df_residual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_gaussian_pearson_is_rss() {
        let y = array![1.0, 2.0, 4.0];
        let mu = array![1.5, 2.0, 3.0];
        let chi2 = pearson_chi2(&y, &mu, Family::Gaussian, &Array1::ones(3));
        assert_abs_diff_eq!(chi2, 1.25, epsilon = 1e-12);
        assert_abs_diff_eq!(estimate_dispersion_pearson(chi2, 1), 1.25, epsilon = 1e-12);
    }

    #[test]
    fn test_fixed_dispersion_families() {
        assert_eq!(dispersion(Family::Poisson, 12.0, 3), 1.0);
        assert_abs_diff_eq!(dispersion(Family::Gamma, 12.0, 3), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_df_is_undefined() {
        assert!(estimate_dispersion_pearson(1.0, 0).is_nan());
        assert!(estimate_dispersion_deviance(1.0, 0).is_nan());
    }
}
