//! Marginals and axis bounds derived from the joint distribution.

use ib_math::{conditional_rows, marginal, mutual_information, renyi_entropy, shannon_entropy, Axis, Matrix};
use serde::Serialize;

use crate::error::{CurveError, CurveResult};

/// Quantities derived once per request from P(x, y).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preprocessed {
    /// Marginal P(x).
    pub px: Vec<f64>,
    /// Conditional P(y|x), one row per x.
    pub pygx: Matrix,
    /// Shannon entropy H(X).
    pub hx: f64,
    /// Renyi entropy H_gamma(X): the horizontal-axis ceiling.
    pub hgx: f64,
    /// I(X;Y): the vertical-axis ceiling.
    pub ixy: f64,
}

/// Derive marginals and bounds.
///
/// Fails with [`CurveError::DegenerateDistribution`] when P(x) carries no
/// mass or a bound is not finite.
pub fn preprocess(pxy: &Matrix, gamma: f64) -> CurveResult<Preprocessed> {
    let px = marginal(pxy, Axis::Rows).ok_or_else(|| {
        CurveError::DegenerateDistribution("marginal P(x) has no non-zero entry".to_string())
    })?;
    let pygx = conditional_rows(pxy);

    let hx = shannon_entropy(&px);
    let hgx = renyi_entropy(&px, gamma);
    let ixy = mutual_information(&pygx, &px);

    for (name, value) in [("H(X)", hx), ("H_gamma(X)", hgx), ("I(X;Y)", ixy)] {
        if !value.is_finite() {
            return Err(CurveError::DegenerateDistribution(format!(
                "{name} is not finite ({value})"
            )));
        }
    }

    Ok(Preprocessed {
        px,
        pygx,
        hx,
        hgx,
        ixy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfectly_correlated_bounds_are_one_bit() {
        let pxy = Matrix::from_rows(vec![vec![0.5, 0.0], vec![0.0, 0.5]]).unwrap();
        let d = preprocess(&pxy, 1.0).unwrap();
        assert!((d.hx - 1.0).abs() < 1e-12);
        assert!((d.hgx - 1.0).abs() < 1e-12);
        assert!((d.ixy - 1.0).abs() < 1e-12);
        assert_eq!(d.pygx.row(0), &[1.0, 0.0]);
    }

    #[test]
    fn independent_variables_have_no_information() {
        let pxy = Matrix::from_rows(vec![vec![0.12, 0.28], vec![0.18, 0.42]]).unwrap();
        let d = preprocess(&pxy, 2.0).unwrap();
        assert!(d.ixy.abs() < 1e-12);
        assert!(d.hgx > 0.0 && d.hgx <= d.hx + 1e-12);
    }

    #[test]
    fn zero_mass_is_degenerate() {
        let pxy = Matrix::zeros(3, 2);
        assert!(matches!(
            preprocess(&pxy, 1.0),
            Err(CurveError::DegenerateDistribution(_))
        ));
    }

    #[test]
    fn massless_rows_are_tolerated() {
        let pxy = Matrix::from_rows(vec![vec![0.5, 0.5], vec![0.0, 0.0]]).unwrap();
        let d = preprocess(&pxy, 1.0).unwrap();
        assert_eq!(d.px, vec![1.0, 0.0]);
        assert_eq!(d.hx, 0.0);
    }
}
