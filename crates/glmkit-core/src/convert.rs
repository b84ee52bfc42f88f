// =============================================================================
// ndarray ↔ nalgebra Conversion Utilities
// =============================================================================
//
// Data lives in ndarray (the public API, fitted values, residuals) while the
// factorizations run on nalgebra. Every crossing between the two goes through
// this module.
//
// =============================================================================

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, Axis};

// =============================================================================
// ndarray → nalgebra
// =============================================================================

/// Convert an ndarray Array2 to a nalgebra DMatrix.
///
/// Works for any memory layout; nalgebra stores column-major.
#[inline]
pub fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Convert an ndarray Array1 to a nalgebra DVector.
#[inline]
pub fn to_dvector(v: &Array1<f64>) -> DVector<f64> {
    DVector::from_iterator(v.len(), v.iter().copied())
}

/// Build √W·X and √W·z in nalgebra storage.
///
/// This is the row scaling that turns a weighted least-squares problem into
/// an ordinary one. Negative weights are treated as zero.
pub fn weighted_system(
    x: &Array2<f64>,
    z: &Array1<f64>,
    w: &Array1<f64>,
) -> (DMatrix<f64>, DVector<f64>) {
    let sqrt_w = w.mapv(|wi| wi.max(0.0).sqrt());
    let xw = x * &sqrt_w.view().insert_axis(Axis(1));
    let zw = z * &sqrt_w;
    (to_dmatrix(&xw), to_dvector(&zw))
}

// =============================================================================
// nalgebra → ndarray
// =============================================================================

/// Convert a nalgebra DMatrix to an ndarray Array2.
#[inline]
pub fn to_array2(m: &DMatrix<f64>) -> Array2<f64> {
    let (nrows, ncols) = m.shape();
    Array2::from_shape_fn((nrows, ncols), |(i, j)| m[(i, j)])
}

/// Convert a nalgebra DVector to an ndarray Array1.
#[inline]
pub fn to_array1(v: &DVector<f64>) -> Array1<f64> {
    Array1::from_iter(v.iter().copied())
}

// =============================================================================
// Tests
// =============================================================================
