// =============================================================================
// Analysis of Deviance
// =============================================================================
//
// Compares an ordered sequence of nested models. Model k+1 must contain every
// column of model k (same name, identical values); this is checked for the
// whole sequence BEFORE anything is fitted, so a bad sequence fails fast with
// `NotNested`.
//
// For each step:
//
//     Df        = df_residual(k) − df_residual(k+1)
//     Deviance  = deviance(k) − deviance(k+1)
//
// and the likelihood-ratio test compares Deviance / φ against χ²(Df), with φ
// taken from the largest model. The optional F test uses
// (Deviance / Df) / φ against F(Df, df_residual of the largest model).
//
// The models are independent, so they are fitted in parallel on rayon's
// pool. Results are collected in input order, which makes the table
// identical to a sequential run.
//
// =============================================================================

use std::fmt;

use log::warn;
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::design::DesignMatrix;
use crate::error::{FitError, Result};
use crate::families::Family;
use crate::inference::{pvalue_chisq, pvalue_f};
use crate::links::Link;
use crate::model::{fit, FitResult};
use crate::solvers::FitConfig;

/// Test used for the deviance reductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnovaTest {
    /// Likelihood-ratio χ² test.
    #[default]
    Chisq,
    /// F test, for families with an estimated dispersion.
    F,
}

/// One line of the analysis-of-deviance table.
#[derive(Debug, Clone)]
pub struct AnovaRow {
    pub label: String,
    pub df_residual: usize,
    pub deviance: f64,
    /// Degrees of freedom consumed relative to the previous row.
    pub df: Option<usize>,
    /// Deviance explained relative to the previous row.
    pub deviance_reduction: Option<f64>,
    /// F statistic (F test only).
    pub f_statistic: Option<f64>,
    pub p_value: Option<f64>,
}

/// Analysis-of-deviance table over nested models.
#[derive(Debug, Clone)]
pub struct AnovaTable {
    pub family: Family,
    pub link: Link,
    pub test: AnovaTest,
    /// φ of the largest model, used to scale every test.
    pub dispersion: f64,
    pub rows: Vec<AnovaRow>,
    /// The fitted models, in input order.
    pub fits: Vec<FitResult>,
}

/// Analysis of deviance over `models` with the likelihood-ratio test.
pub fn anova(
    models: &[DesignMatrix],
    y: &Array1<f64>,
    family: Family,
    link: Link,
    config: &FitConfig,
) -> Result<AnovaTable> {
    anova_with_test(models, y, family, link, config, AnovaTest::Chisq)
}

/// Analysis of deviance over `models` with a chosen test.
pub fn anova_with_test(
    models: &[DesignMatrix],
    y: &Array1<f64>,
    family: Family,
    link: Link,
    config: &FitConfig,
    test: AnovaTest,
) -> Result<AnovaTable> {
    let labels = (1..=models.len()).map(|k| format!("Model {}", k)).collect();
    build_table(models, labels, y, family, link, config, test)
}

/// Sequential analysis of deviance: add the columns of `x` one at a time.
///
/// The first row is the intercept-only model (or the first column alone when
/// the intercept is switched off).
pub fn anova_sequential(
    x: &DesignMatrix,
    y: &Array1<f64>,
    family: Family,
    link: Link,
    config: &FitConfig,
    test: AnovaTest,
) -> Result<AnovaTable> {
    let start = usize::from(!config.include_intercept);
    if start > x.ncols() {
        return Err(FitError::EmptyInput(
            "no columns to add and no intercept".to_string(),
        ));
    }
    let models: Vec<DesignMatrix> = (start..=x.ncols()).map(|k| x.leading_columns(k)).collect();
    let labels = (start..=x.ncols())
        .map(|k| match k {
            0 => "NULL".to_string(),
            k => x.names()[k - 1].clone(),
        })
        .collect();
    build_table(&models, labels, y, family, link, config, test)
}

fn build_table(
    models: &[DesignMatrix],
    labels: Vec<String>,
    y: &Array1<f64>,
    family: Family,
    link: Link,
    config: &FitConfig,
    test: AnovaTest,
) -> Result<AnovaTable> {
    if models.is_empty() {
        return Err(FitError::EmptyInput("no models to compare".to_string()));
    }
    for (k, pair) in models.windows(2).enumerate() {
        pair[0].is_nested_in(&pair[1]).map_err(|reason| {
            FitError::NotNested(format!("model {} is not contained in model {}: {}", k + 1, k + 2, reason))
        })?;
    }
    if test == AnovaTest::F && family.fixed_dispersion() {
        warn!(
            "F test requested for the {} family, whose dispersion is fixed at 1",
            family
        );
    }

    let fits = models
        .par_iter()
        .map(|x| fit(x, y, family, link, config))
        .collect::<Result<Vec<FitResult>>>()?;

    // `models` is non-empty, so `fits` is too.
    let largest = &fits[fits.len() - 1];
    let dispersion = largest.dispersion;
    let df_scale = largest.df_residual as f64;

    let mut rows: Vec<AnovaRow> = Vec::with_capacity(fits.len());
    for (k, (result, label)) in fits.iter().zip(labels).enumerate() {
        let mut row = AnovaRow {
            label,
            df_residual: result.df_residual,
            deviance: result.deviance,
            df: None,
            deviance_reduction: None,
            f_statistic: None,
            p_value: None,
        };
        if k > 0 {
            let previous = &fits[k - 1];
            let df = previous.df_residual.saturating_sub(result.df_residual);
            let reduction = previous.deviance - result.deviance;
            row.df = Some(df);
            row.deviance_reduction = Some(reduction);
            if df > 0 {
                match test {
                    AnovaTest::Chisq => {
                        row.p_value = Some(pvalue_chisq(reduction / dispersion, df as f64));
                    }
                    AnovaTest::F => {
                        let f = (reduction / df as f64) / dispersion;
                        row.f_statistic = Some(f);
                        row.p_value = Some(pvalue_f(f, df as f64, df_scale));
                    }
                }
            }
        }
        rows.push(row);
    }

    Ok(AnovaTable {
        family,
        link,
        test,
        dispersion,
        rows,
        fits,
    })
}

impl fmt::Display for AnovaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis of Deviance Table")?;
        writeln!(f)?;
        writeln!(f, "Model: {}, link: {}", self.family, self.link)?;
        writeln!(f)?;

        let width = self.rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
        let p_label = match self.test {
            AnovaTest::Chisq => "Pr(>Chi)",
            AnovaTest::F => "Pr(>F)",
        };
        write!(
            f,
            "{:<width$} {:>9} {:>12} {:>4} {:>12}",
            "",
            "Resid. Df",
            "Resid. Dev",
            "Df",
            "Deviance",
            width = width
        )?;
        if self.test == AnovaTest::F {
            write!(f, " {:>9}", "F")?;
        }
        writeln!(f, " {:>10}", p_label)?;

        for row in &self.rows {
            write!(
                f,
                "{:<width$} {:>9} {:>12.4}",
                row.label,
                row.df_residual,
                row.deviance,
                width = width
            )?;
            match (row.df, row.deviance_reduction) {
                (Some(df), Some(dev)) => write!(f, " {:>4} {:>12.4}", df, dev)?,
                _ => write!(f, " {:>4} {:>12}", "", "")?,
            }
            if self.test == AnovaTest::F {
                match row.f_statistic {
                    Some(v) => write!(f, " {:>9.4}", v)?,
                    None => write!(f, " {:>9}", "")?,
                }
            }
            match row.p_value {
                Some(p) => writeln!(f, " {:>10.4e}", p)?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}
