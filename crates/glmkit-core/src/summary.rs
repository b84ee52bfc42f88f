// =============================================================================
// Model Summary
// =============================================================================
//
// The coefficient table and the printable summary of a fit, laid out the way
// R's `summary.glm` prints it.
//
// Wald statistics are β / SE. Families with a fixed dispersion (binomial,
// Poisson) report z values against the normal distribution; the others
// report t values against Student's t with the residual degrees of freedom.
//
// Estimates and standard errors print in fixed notation to five significant
// digits, switching to scientific notation outside [1e-4, 1e6). P-values
// below machine precision print as "<2e-16".
//
// =============================================================================

use std::fmt;

use crate::constants::MIN_STD_ERROR;
use crate::families::Family;
use crate::inference::{
    confidence_interval_t, confidence_interval_z, pvalue_t, pvalue_z, significance_stars,
};
use crate::links::Link;
use crate::model::FitResult;

const SIGNIFICANT_DIGITS: i32 = 5;

/// Smallest p-value printed as a number.
const PVALUE_FLOOR: f64 = 2.2e-16;

/// `v` to `SIGNIFICANT_DIGITS` significant digits.
fn format_signif(v: f64) -> String {
    if !v.is_finite() {
        return format!("{}", v);
    }
    if v == 0.0 {
        return "0".to_string();
    }
    let magnitude = v.abs();
    if !(1e-4..1e6).contains(&magnitude) {
        return format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, v);
    }
    let decimals = (SIGNIFICANT_DIGITS - 1 - magnitude.log10().floor() as i32).max(0) as usize;
    format!("{:.*}", decimals, v)
}

fn format_pvalue(p: f64) -> String {
    if p < PVALUE_FLOOR {
        "<2e-16".to_string()
    } else if p >= 1e-4 {
        format!("{:.4}", p)
    } else {
        format!("{:.2e}", p)
    }
}

/// Which reference distribution the Wald statistics use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatistic {
    Z,
    T,
}

impl TestStatistic {
    fn label(&self) -> (&'static str, &'static str) {
        match self {
            TestStatistic::Z => ("z value", "Pr(>|z|)"),
            TestStatistic::T => ("t value", "Pr(>|t|)"),
        }
    }
}

/// One row of the coefficient table.
#[derive(Debug, Clone)]
pub struct CoefficientRow {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub statistic: f64,
    pub p_value: f64,
    pub conf_low: f64,
    pub conf_high: f64,
    pub aliased: bool,
}

impl CoefficientRow {
    pub fn stars(&self) -> &'static str {
        significance_stars(self.p_value)
    }
}

/// Printable summary of a fitted model.
#[derive(Debug, Clone)]
pub struct Summary {
    pub family: Family,
    pub link: Link,
    pub statistic: TestStatistic,
    pub level: f64,
    pub coefficients: Vec<CoefficientRow>,
    pub dispersion: f64,
    pub deviance: f64,
    pub null_deviance: f64,
    pub df_residual: usize,
    pub df_null: usize,
    pub aic: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl FitResult {
    /// Summary with 95% Wald intervals.
    pub fn summary(&self) -> Summary {
        self.summary_with_level(0.95)
    }

    /// Summary with Wald intervals at the given confidence level.
    pub fn summary_with_level(&self, level: f64) -> Summary {
        let statistic = if self.dispersion_estimated() {
            TestStatistic::T
        } else {
            TestStatistic::Z
        };
        let df = self.df_residual as f64;

        let coefficients = self
            .column_names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let estimate = self.coefficients[j];
                let se = self.std_errors[j];
                let aliased = self.aliased.contains(&j);
                let stat = if se.is_finite() && se > MIN_STD_ERROR {
                    estimate / se
                } else {
                    f64::NAN
                };
                let (p_value, (conf_low, conf_high)) = match statistic {
                    TestStatistic::Z => (pvalue_z(stat), confidence_interval_z(estimate, se, level)),
                    TestStatistic::T => (
                        pvalue_t(stat, df),
                        confidence_interval_t(estimate, se, df, level),
                    ),
                };
                CoefficientRow {
                    name: name.clone(),
                    estimate,
                    std_error: se,
                    statistic: stat,
                    p_value,
                    conf_low,
                    conf_high,
                    aliased,
                }
            })
            .collect();

        Summary {
            family: self.family,
            link: self.link,
            statistic,
            level,
            coefficients,
            dispersion: self.dispersion,
            deviance: self.deviance,
            null_deviance: self.null_deviance,
            df_residual: self.df_residual,
            df_null: self.df_null,
            aic: self.aic,
            iterations: self.iterations,
            converged: self.converged,
        }
    }

    /// Wald confidence intervals, one (lower, upper) pair per coefficient.
    pub fn conf_int(&self, level: f64) -> Vec<(f64, f64)> {
        self.summary_with_level(level)
            .coefficients
            .iter()
            .map(|row| (row.conf_low, row.conf_high))
            .collect()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Family: {}  Link: {}", self.family, self.link)?;
        writeln!(f)?;

        let n_aliased = self.coefficients.iter().filter(|r| r.aliased).count();
        if n_aliased > 0 {
            writeln!(
                f,
                "Coefficients: ({} not defined because of singularities)",
                n_aliased
            )?;
        } else {
            writeln!(f, "Coefficients:")?;
        }

        let width = self
            .coefficients
            .iter()
            .map(|r| r.name.len())
            .max()
            .unwrap_or(0)
            .max(11);
        let (stat_label, p_label) = self.statistic.label();
        writeln!(
            f,
            "{:<width$} {:>12} {:>12} {:>9} {:>10}",
            "",
            "Estimate",
            "Std. Error",
            stat_label,
            p_label,
            width = width
        )?;
        for row in &self.coefficients {
            if row.aliased {
                writeln!(
                    f,
                    "{:<width$} {:>12} {:>12} {:>9} {:>10}",
                    row.name,
                    "NA",
                    "NA",
                    "NA",
                    "NA",
                    width = width
                )?;
                continue;
            }
            writeln!(
                f,
                "{:<width$} {:>12} {:>12} {:>9.3} {:>10} {}",
                row.name,
                format_signif(row.estimate),
                format_signif(row.std_error),
                row.statistic,
                format_pvalue(row.p_value),
                row.stars(),
                width = width
            )?;
        }
        writeln!(f, "---")?;
        writeln!(
            f,
            "Signif. codes:  0 '***' 0.001 '**' 0.01 '*' 0.05 '.' 0.1 ' ' 1"
        )?;
        writeln!(f)?;

        if self.family.fixed_dispersion() {
            writeln!(
                f,
                "(Dispersion parameter for {} family taken to be 1)",
                self.family
            )?;
        } else {
            writeln!(
                f,
                "(Dispersion parameter for {} family taken to be {:.6})",
                self.family, self.dispersion
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "    Null deviance: {:.4}  on {} degrees of freedom",
            self.null_deviance, self.df_null
        )?;
        writeln!(
            f,
            "Residual deviance: {:.4}  on {} degrees of freedom",
            self.deviance, self.df_residual
        )?;
        writeln!(f, "AIC: {:.4}", self.aic)?;
        writeln!(f)?;
        if self.converged {
            write!(f, "Number of Fisher Scoring iterations: {}", self.iterations)
        } else {
            write!(
                f,
                "Number of Fisher Scoring iterations: {} (did not converge)",
                self.iterations
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::DesignMatrix;
    use crate::model::fit;
    use crate::solvers::FitConfig;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_gaussian_uses_t_statistics() {
        let x = DesignMatrix::from_columns(&[("x", &[1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        let y = array![5.1, 7.9, 11.2, 13.8, 17.1];
        let result = fit(&x, &y, Family::Gaussian, Link::Identity, &FitConfig::default()).unwrap();
        let summary = result.summary();

        assert_eq!(summary.statistic, TestStatistic::T);
        let row = &summary.coefficients[1];
        assert_abs_diff_eq!(row.statistic, row.estimate / row.std_error, epsilon = 1e-12);
        assert!(row.p_value < 0.001);
        assert_eq!(row.stars(), "***");
        assert!(row.conf_low < row.estimate && row.estimate < row.conf_high);
    }

    #[test]
    fn test_poisson_uses_z_statistics() {
        let x = DesignMatrix::from_columns(&[("x", &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        let y = array![2.0, 2.0, 3.0, 4.0, 5.0, 7.0];
        let result = fit(&x, &y, Family::Poisson, Link::Log, &FitConfig::default()).unwrap();
        let summary = result.summary();
        assert_eq!(summary.statistic, TestStatistic::Z);

        let ci = result.conf_int(0.95);
        let row = &summary.coefficients[1];
        assert_abs_diff_eq!(ci[1].0, row.estimate - 1.959963984540054 * row.std_error, epsilon = 1e-8);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_signif(-1.0), "-1.0000");
        assert_eq!(format_signif(123.456), "123.46");
        assert_eq!(format_signif(0.00123456), "0.0012346");
        assert_eq!(format_signif(0.0), "0");
        assert_eq!(format_signif(1.5e-7), "1.5000e-7");
        assert_eq!(format_signif(2.5e8), "2.5000e8");

        assert_eq!(format_pvalue(0.04321), "0.0432");
        assert_eq!(format_pvalue(3.2e-6), "3.20e-6");
        assert_eq!(format_pvalue(1e-20), "<2e-16");
    }

    #[test]
    fn test_coefficients_print_in_fixed_notation() {
        // exact line y = 3 − x plus a small wiggle
        let x = DesignMatrix::from_columns(&[("x", &[0.0, 1.0, 2.0, 3.0, 4.0])]).unwrap();
        let y = array![3.01, 1.99, 1.0, 0.01, -0.99];
        let result = fit(&x, &y, Family::Gaussian, Link::Identity, &FitConfig::default()).unwrap();
        let text = result.summary().to_string();

        let x_line = text.lines().find(|l| l.starts_with("x ")).unwrap();
        assert!(x_line.contains("-1.0000") || x_line.contains("-0.99"), "{}", x_line);
        assert!(!x_line.contains("e0"), "{}", x_line);
    }

    #[test]
    fn test_display_layout() {
        let x = DesignMatrix::from_columns(&[("dose", &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        let y = array![1.0, 0.0, 1.0, 0.0, 1.0, 1.0];
        let result = fit(&x, &y, Family::Binomial, Link::Logit, &FitConfig::default()).unwrap();
        let text = result.summary().to_string();

        assert!(text.contains("Family: binomial  Link: logit"));
        assert!(text.contains("(Intercept)"));
        assert!(text.contains("dose"));
        assert!(text.contains("Pr(>|z|)"));
        assert!(text.contains("taken to be 1)"));
        assert!(text.contains("on 5 degrees of freedom"));
        assert!(text.contains("on 4 degrees of freedom"));
    }
}
