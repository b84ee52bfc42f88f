// =============================================================================
// Link Functions
// =============================================================================
//
// The link function g connects the mean of the response to the linear
// predictor:
//
//     η = g(μ)        μ = g⁻¹(η)
//
// IRLS needs three things from a link:
//   - link_fn(μ)      to turn starting values into a starting η
//   - link_inverse(η) to turn the linear predictor back into fitted means
//   - derivative(η)   dμ/dη, which drives both the working weights and the
//                     working response
//
// Links form a closed set. Adding one means adding a variant and the compiler
// then points at every `match` that must learn about it.
//
// SATURATION
// ----------
// logit, probit, cloglog and log keep μ (and dμ/dη) at least machine epsilon
// away from the boundary. Without that, nearly separable binomial data drives
// dμ/dη to exactly zero and the working response divides by it.
//
// =============================================================================

use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::constants::{CLOGLOG_ETA_MAX, LOGIT_THRESH};
use crate::error::{FitError, Result};

const EPS: f64 = f64::EPSILON;

/// The link functions supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    Identity,
    Log,
    Logit,
    Probit,
    Cloglog,
    Inverse,
    InverseSquared,
    Sqrt,
}

impl Link {
    /// Name as R prints it.
    pub fn name(&self) -> &'static str {
        match self {
            Link::Identity => "identity",
            Link::Log => "log",
            Link::Logit => "logit",
            Link::Probit => "probit",
            Link::Cloglog => "cloglog",
            Link::Inverse => "inverse",
            Link::InverseSquared => "1/mu^2",
            Link::Sqrt => "sqrt",
        }
    }

    /// Parse a link name (case-insensitive, common aliases accepted).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "identity" => Ok(Link::Identity),
            "log" => Ok(Link::Log),
            "logit" => Ok(Link::Logit),
            "probit" => Ok(Link::Probit),
            "cloglog" => Ok(Link::Cloglog),
            "inverse" => Ok(Link::Inverse),
            "1/mu^2" | "inverse_squared" => Ok(Link::InverseSquared),
            "sqrt" => Ok(Link::Sqrt),
            _ => Err(FitError::InvalidValue(format!(
                "unknown link '{}'. Use 'identity', 'log', 'logit', 'probit', 'cloglog', \
                 'inverse', '1/mu^2' or 'sqrt'",
                name
            ))),
        }
    }

    /// η = g(μ)
    pub fn link_fn(&self, mu: f64) -> f64 {
        match self {
            Link::Identity => mu,
            Link::Log => mu.ln(),
            Link::Logit => (mu / (1.0 - mu)).ln(),
            Link::Probit => std_normal().map_or(f64::NAN, |n| n.inverse_cdf(mu)),
            Link::Cloglog => (-(-mu).ln_1p()).ln(),
            Link::Inverse => 1.0 / mu,
            Link::InverseSquared => 1.0 / (mu * mu),
            Link::Sqrt => mu.sqrt(),
        }
    }

    /// μ = g⁻¹(η)
    pub fn link_inverse(&self, eta: f64) -> f64 {
        match self {
            Link::Identity => eta,
            Link::Log => eta.exp().max(EPS),
            Link::Logit => {
                let t = if eta < -LOGIT_THRESH {
                    EPS
                } else if eta > LOGIT_THRESH {
                    1.0 / EPS
                } else {
                    eta.exp()
                };
                t / (1.0 + t)
            }
            Link::Probit => {
                let thresh = probit_threshold();
                std_normal().map_or(f64::NAN, |n| n.cdf(eta.clamp(-thresh, thresh)))
            }
            Link::Cloglog => (-(-eta.exp()).exp_m1()).clamp(EPS, 1.0 - EPS),
            Link::Inverse => 1.0 / eta,
            Link::InverseSquared => 1.0 / eta.sqrt(),
            Link::Sqrt => eta * eta,
        }
    }

    /// dμ/dη evaluated at η.
    pub fn derivative(&self, eta: f64) -> f64 {
        match self {
            Link::Identity => 1.0,
            Link::Log => eta.exp().max(EPS),
            Link::Logit => {
                if eta.abs() > LOGIT_THRESH {
                    EPS
                } else {
                    let e = eta.exp();
                    e / ((1.0 + e) * (1.0 + e))
                }
            }
            Link::Probit => std_normal().map_or(f64::NAN, |n| n.pdf(eta).max(EPS)),
            Link::Cloglog => {
                let eta = eta.min(CLOGLOG_ETA_MAX);
                (eta.exp() * (-eta.exp()).exp()).max(EPS)
            }
            Link::Inverse => -1.0 / (eta * eta),
            Link::InverseSquared => -1.0 / (2.0 * eta.powf(1.5)),
            Link::Sqrt => 2.0 * eta,
        }
    }

    /// Whether η lies in the domain of the inverse link.
    pub fn valid_eta(&self, eta: f64) -> bool {
        if !eta.is_finite() {
            return false;
        }
        match self {
            Link::Inverse => eta != 0.0,
            Link::InverseSquared | Link::Sqrt => eta > 0.0,
            _ => true,
        }
    }

    /// Apply g elementwise.
    pub fn link(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(|m| self.link_fn(m))
    }

    /// Apply g⁻¹ elementwise.
    pub fn inverse(&self, eta: &Array1<f64>) -> Array1<f64> {
        eta.mapv(|e| self.link_inverse(e))
    }

    /// dμ/dη elementwise.
    pub fn mu_eta(&self, eta: &Array1<f64>) -> Array1<f64> {
        eta.mapv(|e| self.derivative(e))
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn std_normal() -> Option<Normal> {
    Normal::new(0.0, 1.0).ok()
}

// -Φ⁻¹(ε): past this the normal CDF is within ε of 0 or 1.
fn probit_threshold() -> f64 {
    std_normal().map_or(8.0, |n| -n.inverse_cdf(EPS))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ALL: [Link; 8] = [
        Link::Identity,
        Link::Log,
        Link::Logit,
        Link::Probit,
        Link::Cloglog,
        Link::Inverse,
        Link::InverseSquared,
        Link::Sqrt,
    ];

    #[test]
    fn test_inverse_undoes_link() {
        for link in ALL {
            for &mu in &[0.2, 0.5, 0.7] {
                let eta = link.link_fn(mu);
                assert_abs_diff_eq!(link.link_inverse(eta), mu, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let h = 1e-6;
        for link in ALL {
            let eta = link.link_fn(0.4);
            let numeric = (link.link_inverse(eta + h) - link.link_inverse(eta - h)) / (2.0 * h);
            assert_abs_diff_eq!(link.derivative(eta), numeric, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_logit_saturates_inside_unit_interval() {
        let low = Link::Logit.link_inverse(-1000.0);
        let high = Link::Logit.link_inverse(1000.0);
        assert!(low > 0.0 && low < 1e-15);
        assert!(high < 1.0 && high > 1.0 - 1e-15);
        assert!(Link::Logit.derivative(1000.0) > 0.0);
    }

    #[test]
    fn test_logit_sigmoid_values() {
        assert_abs_diff_eq!(Link::Logit.link_inverse(0.0), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(Link::Logit.derivative(0.0), 0.25, epsilon = 1e-15);
    }

    #[test]
    fn test_cloglog_stays_in_range() {
        assert!(Link::Cloglog.link_inverse(50.0) < 1.0);
        assert!(Link::Cloglog.link_inverse(-50.0) > 0.0);
        assert!(Link::Cloglog.derivative(1e6) > 0.0);
    }

    #[test]
    fn test_valid_eta() {
        assert!(!Link::Inverse.valid_eta(0.0));
        assert!(!Link::Sqrt.valid_eta(-1.0));
        assert!(!Link::InverseSquared.valid_eta(-0.5));
        assert!(!Link::Identity.valid_eta(f64::NAN));
        assert!(Link::Logit.valid_eta(-80.0));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Link::from_name("LOGIT").unwrap(), Link::Logit);
        assert_eq!(Link::from_name("1/mu^2").unwrap(), Link::InverseSquared);
        assert!(Link::from_name("tanh").is_err());
    }

    #[test]
    fn test_array_helpers() {
        let mu = ndarray::array![1.0, std::f64::consts::E];
        let eta = Link::Log.link(&mu);
        assert_abs_diff_eq!(eta[1], 1.0, epsilon = 1e-12);
        let back = Link::Log.inverse(&eta);
        assert_abs_diff_eq!(back[1], mu[1], epsilon = 1e-12);
        assert_abs_diff_eq!(Link::Log.mu_eta(&eta)[0], 1.0, epsilon = 1e-12);
    }
}
