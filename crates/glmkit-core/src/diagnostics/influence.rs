// =============================================================================
// Influence Diagnostics
// =============================================================================
//
// Leverage and the case-deletion measures built on it, following R's
// `influence.measures` for glm objects.
//
// LEVERAGE
// --------
// The hat values are the diagonal of W^½X (X'WX)⁻¹ X'W^½. With the thin QR
// W^½X = QR this is the squared row norm of Q:
//
//     hᵢ = Σⱼ Qᵢⱼ²
//
// with W the working weights at the final fit. Aliased columns are dropped
// before factorizing. Values within a few ulps of 1 are snapped to 1, and
// every measure is NaN for an observation with h = 1 (it is fitted exactly,
// so deleting it is not defined).
//
// LEAVE-ONE-OUT SCALE
// -------------------
//     σ₍ᵢ₎² = (Σ dⱼ² − dᵢ² / (1 − hᵢ)) / (n − p − 1)
//
// with d the deviance residuals.
//
// DFBETA
// ------
// The change in β when observation i is deleted, to first order:
//
//     β − β₍ᵢ₎ = (X'WX)⁻¹ xᵢ √wᵢ dᵢ / (1 − hᵢ)
//
// =============================================================================

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::constants::LEVERAGE_ONE_TOL;
use crate::convert::weighted_system;

/// Which residual `rstandard` standardizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResidualKind {
    #[default]
    Deviance,
    Pearson,
}

fn finite_or_nan(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        f64::NAN
    }
}

/// xᵀ C x restricted to the `kept` columns.
pub(crate) fn quadratic_form(x: ArrayView1<'_, f64>, cov: &Array2<f64>, kept: &[usize]) -> f64 {
    kept.iter()
        .map(|&a| {
            let row: f64 = kept.iter().map(|&b| cov[[a, b]] * x[b]).sum();
            x[a] * row
        })
        .sum()
}

/// Column indices that are not aliased.
pub(crate) fn kept_columns(p: usize, aliased: &[usize]) -> Vec<usize> {
    (0..p).filter(|j| !aliased.contains(j)).collect()
}

/// Hat values of the weighted fit, from the QR of W^½X.
pub fn leverage(x: &Array2<f64>, working_weights: &Array1<f64>, aliased: &[usize]) -> Array1<f64> {
    let n = x.nrows();
    let kept = kept_columns(x.ncols(), aliased);
    if kept.is_empty() {
        return Array1::zeros(n);
    }
    let x_kept = x.select(Axis(1), &kept);
    let (xw, _) = weighted_system(&x_kept, &Array1::zeros(n), working_weights);
    let q = xw.qr().q();

    Array1::from_shape_fn(n, |i| {
        let h: f64 = q.row(i).iter().map(|v| v * v).sum();
        if h > 1.0 - LEVERAGE_ONE_TOL {
            1.0
        } else {
            h.max(0.0)
        }
    })
}

/// rᵢ / √(φ (1 − hᵢ)).
pub fn standardized_residuals(
    residuals: &Array1<f64>,
    hat: &Array1<f64>,
    dispersion: f64,
) -> Array1<f64> {
    Array1::from_shape_fn(residuals.len(), |i| {
        if hat[i] >= 1.0 {
            return f64::NAN;
        }
        finite_or_nan(residuals[i] / (dispersion * (1.0 - hat[i])).sqrt())
    })
}

/// σ₍ᵢ₎, the scale estimated with observation i deleted.
///
/// NaN everywhere when fewer than two residual degrees of freedom remain.
pub fn leave_one_out_sigma(
    deviance_residuals: &Array1<f64>,
    hat: &Array1<f64>,
    df_residual: usize,
) -> Array1<f64> {
    let n = deviance_residuals.len();
    if df_residual < 2 {
        return Array1::from_elem(n, f64::NAN);
    }
    let denom = (df_residual - 1) as f64;
    let sum_sq: f64 = deviance_residuals.iter().map(|d| d * d).sum();

    Array1::from_shape_fn(n, |i| {
        let d = deviance_residuals[i];
        let s2 = if hat[i] >= 1.0 {
            sum_sq
        } else {
            sum_sq - d * d / (1.0 - hat[i])
        };
        (s2.max(0.0) / denom).sqrt()
    })
}

/// Studentized residuals, as R's `rstudent.glm`.
///
/// sign(dᵢ) √(dᵢ² + hᵢ pᵢ² / (1 − hᵢ)), divided by σ₍ᵢ₎ unless the family's
/// dispersion is fixed.
pub fn studentized_residuals(
    deviance_residuals: &Array1<f64>,
    pearson_residuals: &Array1<f64>,
    hat: &Array1<f64>,
    sigma: &Array1<f64>,
    fixed_dispersion: bool,
) -> Array1<f64> {
    Array1::from_shape_fn(deviance_residuals.len(), |i| {
        let h = hat[i];
        if h >= 1.0 {
            return f64::NAN;
        }
        let d = deviance_residuals[i];
        let p = pearson_residuals[i];
        let mut r = d.signum() * (d * d + h * p * p / (1.0 - h)).sqrt();
        if !fixed_dispersion {
            r /= sigma[i];
        }
        finite_or_nan(r)
    })
}

/// Cook's distance (pᵢ / (1 − hᵢ))² hᵢ / (φ k), with k the model rank.
pub fn cooks_distance(
    pearson_residuals: &Array1<f64>,
    hat: &Array1<f64>,
    dispersion: f64,
    rank: usize,
) -> Array1<f64> {
    Array1::from_shape_fn(pearson_residuals.len(), |i| {
        let h = hat[i];
        if h >= 1.0 {
            return f64::NAN;
        }
        let r = pearson_residuals[i] / (1.0 - h);
        finite_or_nan(r * r * h / (dispersion * rank as f64))
    })
}

/// DFFITS dᵢ √hᵢ / (σ₍ᵢ₎ (1 − hᵢ)).
pub fn dffits(
    deviance_residuals: &Array1<f64>,
    hat: &Array1<f64>,
    sigma: &Array1<f64>,
) -> Array1<f64> {
    Array1::from_shape_fn(deviance_residuals.len(), |i| {
        let h = hat[i];
        if h >= 1.0 {
            return f64::NAN;
        }
        finite_or_nan(deviance_residuals[i] * h.sqrt() / (sigma[i] * (1.0 - h)))
    })
}

/// Covariance ratio (σ₍ᵢ₎ / s)^(2k) / (1 − hᵢ), s² = Σ dⱼ² / df_residual.
pub fn covratio(
    deviance_residuals: &Array1<f64>,
    hat: &Array1<f64>,
    sigma: &Array1<f64>,
    df_residual: usize,
    rank: usize,
) -> Array1<f64> {
    let sum_sq: f64 = deviance_residuals.iter().map(|d| d * d).sum();
    let s = (sum_sq / df_residual as f64).sqrt();
    Array1::from_shape_fn(deviance_residuals.len(), |i| {
        let h = hat[i];
        if h >= 1.0 {
            return f64::NAN;
        }
        finite_or_nan((sigma[i] / s).powi(2 * rank as i32) / (1.0 - h))
    })
}

/// β − β₍ᵢ₎ for every observation (rows) and coefficient (columns).
///
/// Aliased coefficients and observations with h = 1 are NaN.
pub fn dfbeta(
    x: &Array2<f64>,
    working_weights: &Array1<f64>,
    cov_unscaled: &Array2<f64>,
    aliased: &[usize],
    deviance_residuals: &Array1<f64>,
    hat: &Array1<f64>,
) -> Array2<f64> {
    let (n, p) = x.dim();
    let kept = kept_columns(p, aliased);
    let mut out = Array2::from_elem((n, p), f64::NAN);

    for i in 0..n {
        if hat[i] >= 1.0 {
            continue;
        }
        let scale = working_weights[i].sqrt() * deviance_residuals[i] / (1.0 - hat[i]);
        for &a in &kept {
            let cx: f64 = kept.iter().map(|&b| cov_unscaled[[a, b]] * x[[i, b]]).sum();
            out[[i, a]] = finite_or_nan(cx * scale);
        }
    }
    out
}

/// DFBETA scaled by σ₍ᵢ₎ √(X'WX)⁻¹ⱼⱼ.
pub fn dfbetas(dfbeta: &Array2<f64>, cov_unscaled: &Array2<f64>, sigma: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn(dfbeta.dim(), |(i, j)| {
        finite_or_nan(dfbeta[[i, j]] / (sigma[i] * cov_unscaled[[j, j]].sqrt()))
    })
}
