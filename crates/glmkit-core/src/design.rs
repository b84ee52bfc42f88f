// =============================================================================
// Design Matrix
// =============================================================================
//
// The numeric matrix of predictors handed to the engine. The caller is in
// charge of building it (categorical encoding, transformations, ...); the
// engine only ever borrows it.
//
// The intercept is NOT stored here. Whether the fitted model gets one is a
// fitting decision (`FitConfig::include_intercept`), and the engine builds
// its own model matrix `[1 | X]` from the borrowed predictors.
//
// =============================================================================

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::error::{FitError, Result};

/// Name given to the intercept column of a model matrix.
pub const INTERCEPT_NAME: &str = "(Intercept)";

/// Named predictor columns, n observations × p predictors.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    values: Array2<f64>,
    names: Vec<String>,
}

impl DesignMatrix {
    /// Wrap a matrix, naming the columns `x1, x2, ...`.
    pub fn new(values: Array2<f64>) -> Self {
        let names = (1..=values.ncols()).map(|j| format!("x{}", j)).collect();
        Self { values, names }
    }

    /// Wrap a matrix with explicit column names.
    pub fn with_names(values: Array2<f64>, names: Vec<String>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(FitError::DimensionMismatch(format!(
                "{} column names for {} columns",
                names.len(),
                values.ncols()
            )));
        }
        Ok(Self { values, names })
    }

    /// Build from named columns of equal length.
    ///
    /// The number of rows comes from the first column; with no columns at
    /// all, use [`DesignMatrix::empty`] instead so the row count is known.
    pub fn from_columns(columns: &[(&str, &[f64])]) -> Result<Self> {
        let n = match columns.first() {
            Some((_, c)) => c.len(),
            None => return Err(FitError::EmptyInput("no columns given".to_string())),
        };
        let mut values = Array2::zeros((n, columns.len()));
        for (j, (name, col)) in columns.iter().enumerate() {
            if col.len() != n {
                return Err(FitError::DimensionMismatch(format!(
                    "column '{}' has {} values, expected {}",
                    name,
                    col.len(),
                    n
                )));
            }
            values.column_mut(j).assign(&ArrayView1::from(*col));
        }
        let names = columns.iter().map(|(name, _)| name.to_string()).collect();
        Ok(Self { values, names })
    }

    /// A design with `n` rows and no predictors. Fitted with an intercept
    /// this is the intercept-only model.
    pub fn empty(n: usize) -> Self {
        Self {
            values: Array2::zeros((n, 0)),
            names: Vec::new(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, j: usize) -> ArrayView1<'_, f64> {
        self.values.column(j)
    }

    /// Position of the column called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// The first `k` predictor columns, as used for sequential term addition.
    pub fn leading_columns(&self, k: usize) -> DesignMatrix {
        let k = k.min(self.ncols());
        DesignMatrix {
            values: self.values.slice(ndarray::s![.., ..k]).to_owned(),
            names: self.names[..k].to_vec(),
        }
    }

    /// Materialize the model matrix, optionally prefixed by an intercept
    /// column of ones. Returns the matrix and its column names.
    pub fn model_matrix(&self, include_intercept: bool) -> (Array2<f64>, Vec<String>) {
        if !include_intercept {
            return (self.values.clone(), self.names.clone());
        }
        let n = self.nrows();
        let ones = Array1::<f64>::ones(n).insert_axis(Axis(1));
        let mut x = Array2::zeros((n, self.ncols() + 1));
        x.slice_mut(ndarray::s![.., 0..1]).assign(&ones);
        x.slice_mut(ndarray::s![.., 1..]).assign(&self.values);

        let mut names = Vec::with_capacity(self.ncols() + 1);
        names.push(INTERCEPT_NAME.to_string());
        names.extend(self.names.iter().cloned());
        (x, names)
    }

    /// Check that every column of `self` appears in `larger` under the same
    /// name with identical values.
    pub(crate) fn is_nested_in(&self, larger: &DesignMatrix) -> std::result::Result<(), String> {
        if self.nrows() != larger.nrows() {
            return Err(format!(
                "designs have {} and {} rows",
                self.nrows(),
                larger.nrows()
            ));
        }
        for (j, name) in self.names.iter().enumerate() {
            let k = larger
                .position(name)
                .ok_or_else(|| format!("column '{}' is missing from the larger model", name))?;
            if self.column(j) != larger.column(k) {
                return Err(format!("column '{}' differs between models", name));
            }
        }
        Ok(())
    }
}
