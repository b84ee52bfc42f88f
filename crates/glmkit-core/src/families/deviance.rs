// =============================================================================
// Deviance
// =============================================================================
//
// The deviance is twice the log-likelihood gap between the saturated model
// (μ = y) and the fitted model. It is the GLM analogue of the residual sum of
// squares, and it is what IRLS watches to decide convergence.
//
// Each family contributes a closed-form unit deviance d(y, μ); the total is
// the prior-weighted sum Σ wᵢ d(yᵢ, μᵢ). Terms of the form y·log(y/μ) use the
// convention 0·log(0) = 0.
//
// =============================================================================

use ndarray::Array1;

use super::Family;

/// y·log(y/μ), taken as 0 when y = 0.
#[inline]
fn y_log_y(y: f64, mu: f64) -> f64 {
    if y > 0.0 {
        y * (y / mu).ln()
    } else {
        0.0
    }
}

impl Family {
    /// Deviance contribution of a single observation (before prior weights).
    pub fn unit_deviance(&self, y: f64, mu: f64) -> f64 {
        match self {
            Family::Gaussian => (y - mu) * (y - mu),
            Family::Binomial => 2.0 * (y_log_y(y, mu) + y_log_y(1.0 - y, 1.0 - mu)),
            Family::Poisson => 2.0 * (y_log_y(y, mu) - (y - mu)),
            Family::Gamma => -2.0 * ((y / mu).ln() - (y - mu) / mu),
            Family::InverseGaussian => (y - mu) * (y - mu) / (mu * mu * y),
        }
    }

    /// Unit deviances for every observation.
    pub fn unit_deviances(&self, y: &Array1<f64>, mu: &Array1<f64>) -> Array1<f64> {
        y.iter()
            .zip(mu.iter())
            .map(|(&yi, &mui)| self.unit_deviance(yi, mui))
            .collect()
    }

    /// Total deviance Σ wᵢ d(yᵢ, μᵢ). `None` weights means all ones.
    pub fn deviance(&self, y: &Array1<f64>, mu: &Array1<f64>, weights: Option<&Array1<f64>>) -> f64 {
        match weights {
            Some(w) => y
                .iter()
                .zip(mu.iter())
                .zip(w.iter())
                .filter(|(_, &wi)| wi > 0.0)
                .map(|((&yi, &mui), &wi)| wi * self.unit_deviance(yi, mui))
                .sum(),
            None => y
                .iter()
                .zip(mu.iter())
                .map(|(&yi, &mui)| self.unit_deviance(yi, mui))
                .sum(),
        }
    }
}
