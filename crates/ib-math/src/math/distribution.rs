//! Dense distributions over one or two discrete variables.
//!
//! A joint distribution P(x, y) is stored as a row-major [`Matrix`] with one
//! row per x value and one column per y value. Conditionals such as P(y|x)
//! or an encoder Q(t|x) use the same layout with each row summing to 1.

use serde::{Deserialize, Serialize};

/// Which direction a reduction or normalization runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// One result per row (reduce across the columns of each row).
    Rows,
    /// One result per column (reduce down the rows of each column).
    Cols,
}

/// Row-major dense matrix of probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build from a flat row-major buffer.
    ///
    /// Returns None for an empty shape or if the buffer length does not
    /// match it.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        if rows == 0 || cols == 0 || rows.checked_mul(cols)? != data.len() {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    /// All-zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from nested rows.
    ///
    /// Returns None for an empty matrix, an empty row, or ragged rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let cols = rows.first()?.len();
        if cols == 0 || rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let n_rows = rows.len();
        let data = rows.into_iter().flatten().collect();
        Some(Self {
            rows: n_rows,
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, value: f64) {
        self.data[r * self.cols + c] = value;
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Iterate over rows as slices. A matrix with no columns has no rows
    /// to yield.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols.max(1))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Sum of every entry.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Copy out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }

    /// Sums along `axis`, unnormalized.
    pub fn sums(&self, axis: Axis) -> Vec<f64> {
        match axis {
            Axis::Rows => self.iter_rows().map(|r| r.iter().sum()).collect(),
            Axis::Cols => {
                let mut out = vec![0.0; self.cols];
                for row in self.iter_rows() {
                    for (acc, v) in out.iter_mut().zip(row) {
                        *acc += v;
                    }
                }
                out
            }
        }
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = String;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Matrix::from_rows(rows).ok_or_else(|| "matrix must be non-empty and rectangular".to_string())
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(m: Matrix) -> Self {
        m.to_rows()
    }
}

/// Scale a non-negative vector so it sums to 1.
///
/// Returns None if any entry is negative or NaN, or the total mass is not a
/// finite positive number.
pub fn normalize(values: &[f64]) -> Option<Vec<f64>> {
    if values.iter().any(|v| v.is_nan() || *v < 0.0) {
        return None;
    }
    let total: f64 = values.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some(values.iter().map(|v| v / total).collect())
}

/// Normalize every row (`Axis::Rows`) or column (`Axis::Cols`) to sum to 1.
///
/// Lines with zero mass are left as zeros.
pub fn normalize_matrix(m: &Matrix, axis: Axis) -> Matrix {
    let sums = m.sums(axis);
    let mut out = m.clone();
    for r in 0..m.rows() {
        for c in 0..m.cols() {
            let total = match axis {
                Axis::Rows => sums[r],
                Axis::Cols => sums[c],
            };
            let v = if total > 0.0 { m.get(r, c) / total } else { 0.0 };
            out.set(r, c, v);
        }
    }
    out
}

/// Normalized marginal along `axis`: `Axis::Rows` gives P(x) for a P(x, y)
/// matrix, `Axis::Cols` gives P(y).
///
/// Returns None when the matrix carries no mass.
pub fn marginal(m: &Matrix, axis: Axis) -> Option<Vec<f64>> {
    normalize(&m.sums(axis))
}

/// Row conditional P(col | row), e.g. P(y|x) from P(x, y).
pub fn conditional_rows(m: &Matrix) -> Matrix {
    normalize_matrix(m, Axis::Rows)
}
