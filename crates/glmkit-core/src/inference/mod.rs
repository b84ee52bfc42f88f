// =============================================================================
// Statistical Inference
// =============================================================================
//
// Distribution helpers behind the coefficient table, the ANOVA table and
// profile intervals:
//   - P-values: Wald z / t tests, likelihood-ratio χ² and F tests
//   - Confidence intervals: Wald intervals from z or t critical values
//   - Quantiles used to size profiling grids
//
// Binomial and Poisson fits have a known dispersion, so their Wald tests use
// the normal distribution. Families with an estimated dispersion use
// Student's t with the residual degrees of freedom.
//
// Every function returns NaN rather than panicking when its inputs do not
// define a distribution (non-finite statistic, df ≤ 0, ...).
//
// =============================================================================

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};
use statrs::function::gamma::gamma_ur;

fn std_normal() -> Option<Normal> {
    Normal::new(0.0, 1.0).ok()
}

// =============================================================================
// P-Value Calculation
// =============================================================================

/// Two-tailed p-value of a z-statistic.
///
/// P(|Z| > |z|) = 2 × (1 − Φ(|z|))
pub fn pvalue_z(z: f64) -> f64 {
    if !z.is_finite() {
        return f64::NAN;
    }
    match std_normal() {
        Some(normal) => 2.0 * (1.0 - normal.cdf(z.abs())),
        None => f64::NAN,
    }
}

/// Two-tailed p-value of a t-statistic with `df` degrees of freedom.
pub fn pvalue_t(t: f64, df: f64) -> f64 {
    if !t.is_finite() || df <= 0.0 {
        return f64::NAN;
    }

    let t_dist = match StudentsT::new(0.0, 1.0, df) {
        Ok(d) => d,
        Err(_) => return f64::NAN,
    };

    2.0 * (1.0 - t_dist.cdf(t.abs()))
}

/// Upper-tail p-value P(χ²_df > x).
///
/// Uses the regularized upper incomplete gamma function directly, which
/// keeps precision for very small p-values. A non-positive statistic (no
/// reduction in deviance) gives p = 1.
pub fn pvalue_chisq(x: f64, df: f64) -> f64 {
    if x.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    if x.is_infinite() {
        return 0.0;
    }
    gamma_ur(df / 2.0, x / 2.0)
}

/// Upper-tail p-value P(F_{df1, df2} > f).
pub fn pvalue_f(f: f64, df1: f64, df2: f64) -> f64 {
    if f.is_nan() || df1 <= 0.0 || df2 <= 0.0 {
        return f64::NAN;
    }
    if f <= 0.0 {
        return 1.0;
    }
    match FisherSnedecor::new(df1, df2) {
        Ok(dist) => 1.0 - dist.cdf(f),
        Err(_) => f64::NAN,
    }
}

// =============================================================================
// Quantiles
// =============================================================================

/// Standard normal quantile Φ⁻¹(p).
pub fn quantile_normal(p: f64) -> f64 {
    std_normal().map_or(f64::NAN, |n| n.inverse_cdf(p))
}

/// χ² quantile with `df` degrees of freedom.
pub fn quantile_chisq(p: f64, df: f64) -> f64 {
    ChiSquared::new(df).map_or(f64::NAN, |d| d.inverse_cdf(p))
}

/// F quantile with (df1, df2) degrees of freedom.
pub fn quantile_f(p: f64, df1: f64, df2: f64) -> f64 {
    FisherSnedecor::new(df1, df2).map_or(f64::NAN, |d| d.inverse_cdf(p))
}

// =============================================================================
// Confidence Intervals
// =============================================================================

/// Wald confidence interval using the normal distribution.
///
/// Returns (lower, upper); (NaN, NaN) when the standard error is undefined.
pub fn confidence_interval_z(estimate: f64, std_error: f64, confidence: f64) -> (f64, f64) {
    if !estimate.is_finite() || !std_error.is_finite() || std_error <= 0.0 {
        return (f64::NAN, f64::NAN);
    }

    // For 95% CI, alpha = 0.05, so we need z_{0.975}
    let alpha = 1.0 - confidence;
    let z_critical = quantile_normal(1.0 - alpha / 2.0);

    let margin = z_critical * std_error;
    (estimate - margin, estimate + margin)
}

/// Wald confidence interval using Student's t with `df` degrees of freedom.
pub fn confidence_interval_t(
    estimate: f64,
    std_error: f64,
    df: f64,
    confidence: f64,
) -> (f64, f64) {
    if !estimate.is_finite() || !std_error.is_finite() || std_error <= 0.0 || df <= 0.0 {
        return (f64::NAN, f64::NAN);
    }

    let t_dist = match StudentsT::new(0.0, 1.0, df) {
        Ok(d) => d,
        Err(_) => return (f64::NAN, f64::NAN),
    };

    let alpha = 1.0 - confidence;
    let t_critical = t_dist.inverse_cdf(1.0 - alpha / 2.0);

    let margin = t_critical * std_error;
    (estimate - margin, estimate + margin)
}

// =============================================================================
// Significance Stars (for summary tables)
// =============================================================================

/// Significance stars for a p-value, R's codes:
/// `***` < 0.001 < `**` < 0.01 < `*` < 0.05 < `.` < 0.1
pub fn significance_stars(pvalue: f64) -> &'static str {
    if pvalue < 0.001 {
        "***"
    } else if pvalue < 0.01 {
        "**"
    } else if pvalue < 0.05 {
        "*"
    } else if pvalue < 0.1 {
        "."
    } else {
        ""
    }
}

// =============================================================================
// Tests
// =============================================================================
