// =============================================================================
// Distribution Families
// =============================================================================
//
// A family describes the distribution of the response around its mean μ.
// For IRLS the essential piece is the variance function V(μ):
//
//     Var(Y) = φ × V(μ)
//
//   Gaussian          V(μ) = 1             (constant variance)
//   Binomial          V(μ) = μ(1 − μ)      (proportions / 0-1 outcomes)
//   Poisson           V(μ) = μ             (counts)
//   Gamma             V(μ) = μ²            (positive, constant CV)
//   Inverse Gaussian  V(μ) = μ³            (positive, heavy right tail)
//
// Each family also knows how to:
//   - pick starting values μ₀ that the link can take (no log(0), no logit(1))
//   - say which μ are valid
//   - compute its deviance and log-likelihood (see `deviance` / `likelihood`)
//
// Families are a closed enum: every numeric kernel matches exhaustively, so a
// new family is a compile-time checked extension.
//
// =============================================================================

mod deviance;
mod likelihood;

use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::constants::{MU_MAX_PROBABILITY, MU_MIN_POSITIVE, MU_MIN_PROBABILITY};
use crate::error::{FitError, Result};
use crate::links::Link;

/// The exponential-family response distributions supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Gaussian,
    Binomial,
    Poisson,
    Gamma,
    InverseGaussian,
}

impl Family {
    /// Name as R prints it.
    pub fn name(&self) -> &'static str {
        match self {
            Family::Gaussian => "gaussian",
            Family::Binomial => "binomial",
            Family::Poisson => "poisson",
            Family::Gamma => "Gamma",
            Family::InverseGaussian => "inverse.gaussian",
        }
    }

    /// Parse a family name (case-insensitive, common aliases accepted).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "gaussian" | "normal" => Ok(Family::Gaussian),
            "binomial" | "logistic" => Ok(Family::Binomial),
            "poisson" => Ok(Family::Poisson),
            "gamma" => Ok(Family::Gamma),
            "inverse.gaussian" | "inverse_gaussian" | "inversegaussian" => {
                Ok(Family::InverseGaussian)
            }
            _ => Err(FitError::InvalidValue(format!(
                "unknown family '{}'. Use 'gaussian', 'binomial', 'poisson', 'gamma' \
                 or 'inverse_gaussian'",
                name
            ))),
        }
    }

    /// The canonical link, used when the caller has no reason to pick another.
    pub fn default_link(&self) -> Link {
        match self {
            Family::Gaussian => Link::Identity,
            Family::Binomial => Link::Logit,
            Family::Poisson => Link::Log,
            Family::Gamma => Link::Inverse,
            Family::InverseGaussian => Link::InverseSquared,
        }
    }

    /// Variance function V(μ).
    ///
    /// μ is clamped into the interior of its range first so the result is
    /// strictly positive and IRLS weights stay finite.
    pub fn variance(&self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => 1.0,
            Family::Binomial => {
                let m = mu.clamp(MU_MIN_PROBABILITY, MU_MAX_PROBABILITY);
                m * (1.0 - m)
            }
            Family::Poisson => mu.max(MU_MIN_POSITIVE),
            Family::Gamma => {
                let m = mu.max(MU_MIN_POSITIVE);
                m * m
            }
            Family::InverseGaussian => mu.max(MU_MIN_POSITIVE).powi(3),
        }
    }

    /// Starting value μ₀ for one observation with prior weight `w`.
    ///
    /// Binomial moves 0/1 responses toward 1/2 so logit(μ₀) is finite;
    /// Poisson shifts zero counts up so log(μ₀) is finite.
    pub fn initial_mu(&self, y: f64, w: f64) -> f64 {
        match self {
            Family::Gaussian | Family::Gamma | Family::InverseGaussian => y,
            Family::Binomial => (w * y + 0.5) / (w + 1.0),
            Family::Poisson => y + 0.1,
        }
    }

    /// Starting values for a whole response vector.
    pub fn initialize_mu(&self, y: &Array1<f64>, weights: &Array1<f64>) -> Array1<f64> {
        y.iter()
            .zip(weights.iter())
            .map(|(&yi, &wi)| self.initial_mu(yi, wi))
            .collect()
    }

    /// Whether μ lies in the range the family accepts.
    pub fn valid_mu(&self, mu: f64) -> bool {
        if !mu.is_finite() {
            return false;
        }
        match self {
            Family::Gaussian => true,
            Family::Binomial => mu > 0.0 && mu < 1.0,
            Family::Poisson | Family::Gamma | Family::InverseGaussian => mu > 0.0,
        }
    }

    pub fn is_valid_mu(&self, mu: &Array1<f64>) -> bool {
        mu.iter().all(|&m| self.valid_mu(m))
    }

    /// Check the response against the family's support.
    pub fn validate_response(&self, y: &Array1<f64>) -> Result<()> {
        match y.iter().position(|&v| !self.in_support(v)) {
            None => Ok(()),
            Some(i) => Err(FitError::InvalidValue(format!(
                "{} family requires y {}; y[{}] = {}",
                self.name(),
                self.support(),
                i,
                y[i]
            ))),
        }
    }

    fn in_support(&self, y: f64) -> bool {
        match self {
            Family::Gaussian => y.is_finite(),
            Family::Binomial => (0.0..=1.0).contains(&y),
            Family::Poisson => y.is_finite() && y >= 0.0,
            Family::Gamma | Family::InverseGaussian => y.is_finite() && y > 0.0,
        }
    }

    fn support(&self) -> &'static str {
        match self {
            Family::Gaussian => "finite",
            Family::Binomial => "in [0, 1]",
            Family::Poisson => "non-negative",
            Family::Gamma | Family::InverseGaussian => "strictly positive",
        }
    }

    /// Whether the dispersion φ is fixed at 1 (otherwise it is estimated).
    pub fn fixed_dispersion(&self) -> bool {
        matches!(self, Family::Binomial | Family::Poisson)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Tests
// =============================================================================
