// =============================================================================
// Weighted Least Squares via QR
// =============================================================================
//
// Each IRLS step is a weighted least-squares problem:
//
//     β = argmin Σ wᵢ (zᵢ − xᵢᵀβ)²
//
// Scaling every row by √wᵢ turns it into an ordinary least-squares problem
// on X_w = W^½X and z_w = W^½z, which we solve with a Householder QR:
//
//     X_w = QR   →   Rβ = Qᵀz_w
//
// QR works on X_w directly instead of forming X'WX, so the condition number
// is not squared. That matters for the nearly separable binomial fits where
// the weights span many orders of magnitude.
//
// RANK DETECTION
// --------------
// The factorization is NOT pivoted. Column j is declared redundant when
//
//     |R_jj| ≤ rank_tolerance × max_i |R_ii|
//
// i.e. when column j is (numerically) a combination of the columns before
// it. Because the column order is kept, it is always the LATER of two
// collinear columns that gets reported, and reruns report the same one.
//
// COVARIANCE
// ----------
// The unscaled covariance (X'WX)⁻¹ equals R⁻¹R⁻ᵀ, computed from the same
// triangular factor.
//
// =============================================================================

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

use crate::convert::{to_array1, to_array2, weighted_system};

/// Solution of one weighted least-squares problem.
#[derive(Debug, Clone)]
pub struct WlsSolution {
    pub coefficients: Array1<f64>,
    /// Upper-triangular p × p factor of W^½X.
    pub r: DMatrix<f64>,
}

/// The weighted design lost rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankDeficiency {
    /// Redundant column indices, ascending.
    pub columns: Vec<usize>,
}

/// Solve min Σ wᵢ (zᵢ − xᵢᵀβ)² by QR of W^½X.
///
/// `x` is never modified. Fails with the redundant columns when the
/// weighted design is rank deficient at `rank_tolerance`.
pub fn solve_wls(
    x: &Array2<f64>,
    z: &Array1<f64>,
    w: &Array1<f64>,
    rank_tolerance: f64,
) -> Result<WlsSolution, RankDeficiency> {
    let p = x.ncols();
    let (xw, zw) = weighted_system(x, z, w);

    let qr = xw.qr();
    let r = qr.r();

    let columns = redundant_columns(&r, rank_tolerance);
    if !columns.is_empty() {
        return Err(RankDeficiency { columns });
    }

    let qtz = qr.q().transpose() * zw;
    let beta = r
        .solve_upper_triangular(&qtz)
        .ok_or_else(|| RankDeficiency {
            columns: (0..p).filter(|&j| r[(j, j)] == 0.0).collect(),
        })?;

    Ok(WlsSolution {
        coefficients: to_array1(&beta),
        r,
    })
}

/// Columns whose diagonal entry in R is negligible relative to the largest.
pub fn redundant_columns(r: &DMatrix<f64>, rank_tolerance: f64) -> Vec<usize> {
    let k = r.nrows().min(r.ncols());
    let max_diag = (0..k).map(|i| r[(i, i)].abs()).fold(0.0_f64, f64::max);
    let threshold = rank_tolerance * max_diag;

    (0..r.ncols())
        .filter(|&j| j >= k || r[(j, j)].abs() <= threshold || !r[(j, j)].is_finite())
        .collect()
}

/// (X'WX)⁻¹ = R⁻¹R⁻ᵀ from a full-rank triangular factor.
pub fn covariance_from_r(r: &DMatrix<f64>) -> Option<Array2<f64>> {
    let p = r.ncols();
    let r_inv = r.solve_upper_triangular(&DMatrix::identity(p, p))?;
    Some(to_array2(&(&r_inv * r_inv.transpose())))
}

/// Unscaled covariance (X'WX)⁻¹ that tolerates rank deficiency.
///
/// Redundant columns are dropped, the covariance of the remaining columns is
/// computed, and the rows/columns of the dropped ones are filled with NaN.
/// Returns the covariance and the redundant column indices.
pub fn covariance_with_redundancy(
    x: &Array2<f64>,
    w: &Array1<f64>,
    rank_tolerance: f64,
) -> (Array2<f64>, Vec<usize>) {
    let p = x.ncols();
    let zeros = Array1::zeros(x.nrows());

    let (xw, _) = weighted_system(x, &zeros, w);
    let r = xw.qr().r();
    let redundant = redundant_columns(&r, rank_tolerance);

    let kept: Vec<usize> = (0..p).filter(|j| !redundant.contains(j)).collect();
    let mut cov = Array2::from_elem((p, p), f64::NAN);
    if kept.is_empty() {
        return (cov, redundant);
    }

    let sub_cov = if redundant.is_empty() {
        covariance_from_r(&r)
    } else {
        let x_sub = x.select(ndarray::Axis(1), &kept);
        let (xw_sub, _) = weighted_system(&x_sub, &zeros, w);
        covariance_from_r(&xw_sub.qr().r())
    };

    match sub_cov {
        Some(sub) => {
            for (a, &i) in kept.iter().enumerate() {
                for (b, &j) in kept.iter().enumerate() {
                    cov[[i, j]] = sub[[a, b]];
                }
            }
            (cov, redundant)
        }
        None => (cov, (0..p).collect()),
    }
}

// =============================================================================
// Tests
// =============================================================================
