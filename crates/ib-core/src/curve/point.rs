//! Curve points and the statistics derived from an encoder.

use ib_math::{mutual_information, renyi_entropy, shannon_entropy, Matrix};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::preprocess::Preprocessed;
use crate::solver::SolverFailure;

/// Encoder rows may deviate this much from summing to 1.
const ENCODER_ROW_TOLERANCE: f64 = 1e-6;

/// Why a point is only approximate.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointDegradation {
    #[error(
        "search for Hga={target} did not converge after {evaluations} solver calls \
         (best beta={best_beta}, residual={residual})"
    )]
    NotConverged {
        target: f64,
        best_beta: f64,
        evaluations: usize,
        residual: f64,
    },

    #[error("solver failed at beta={beta}: {message}")]
    SolverFailed {
        beta: f64,
        target: Option<f64>,
        message: String,
    },
}

impl PointDegradation {
    pub fn is_solver_failure(&self) -> bool {
        matches!(self, PointDegradation::SolverFailed { .. })
    }
}

impl From<PointDegradation> for crate::error::CurveError {
    fn from(d: PointDegradation) -> Self {
        match d {
            PointDegradation::NotConverged {
                target,
                best_beta,
                evaluations,
                residual,
            } => crate::error::CurveError::SearchDidNotConverge {
                target,
                best_beta,
                evaluations,
                residual,
            },
            PointDegradation::SolverFailed {
                beta,
                target,
                message,
            } => crate::error::CurveError::Solver {
                beta,
                target,
                message,
            },
        }
    }
}

/// How a point's coordinates were obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "degradation", rename_all = "snake_case")]
pub enum PointStatus {
    /// beta = 0 or beta = ∞, filled analytically.
    Endpoint,
    /// Solved at this beta; for searched points, within delta of the target.
    Exact,
    /// Best available candidate; see the degradation.
    Approximate(PointDegradation),
}

/// One point of the information curve. All statistics are in bits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    #[serde(with = "beta_format")]
    pub beta: f64,
    /// Generalized cost H_gamma(T) - alpha * H(T|X).
    pub hga: f64,
    pub ixt: f64,
    pub ht: f64,
    pub hgt: f64,
    pub iyt: f64,
    pub status: PointStatus,
}

impl CurvePoint {
    /// The beta = 0 point: a single cluster, nothing encoded.
    pub fn lower_endpoint() -> Self {
        CurvePoint {
            beta: 0.0,
            hga: 0.0,
            ixt: 0.0,
            ht: 0.0,
            hgt: 0.0,
            iyt: 0.0,
            status: PointStatus::Endpoint,
        }
    }

    /// The beta = ∞ point: T = X.
    pub fn upper_endpoint(dist: &Preprocessed) -> Self {
        CurvePoint {
            beta: f64::INFINITY,
            hga: dist.hgx,
            ixt: dist.hx,
            ht: dist.hx,
            hgt: dist.hgx,
            iyt: dist.ixy,
            status: PointStatus::Endpoint,
        }
    }

    /// Derive every statistic from an encoder Q(t|x) solved at `beta`.
    ///
    /// Fails if the encoder has the wrong shape, is not a conditional
    /// distribution, or yields a non-finite statistic.
    pub fn from_encoder(
        beta: f64,
        encoder: &Matrix,
        dist: &Preprocessed,
        alpha: f64,
        gamma: f64,
    ) -> Result<Self, SolverFailure> {
        let nx = dist.px.len();
        if encoder.rows() != nx || encoder.cols() == 0 {
            return Err(SolverFailure::new(format!(
                "encoder has shape {}x{}, expected {} rows",
                encoder.rows(),
                encoder.cols(),
                nx
            )));
        }
        for (x, row) in encoder.iter_rows().enumerate() {
            if row.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(SolverFailure::new(format!("encoder row {x} is not a distribution")));
            }
            let total: f64 = row.iter().sum();
            if dist.px[x] > 0.0 && (total - 1.0).abs() > ENCODER_ROW_TOLERANCE {
                return Err(SolverFailure::new(format!("encoder row {x} sums to {total}")));
            }
        }

        let nt = encoder.cols();
        let ny = dist.pygx.cols();
        let mut qt = vec![0.0; nt];
        let mut qyt = Matrix::zeros(nt, ny);
        for (x, &px) in dist.px.iter().enumerate() {
            if px <= 0.0 {
                continue;
            }
            for t in 0..nt {
                let w = px * encoder.get(x, t);
                qt[t] += w;
                for (y, &pyx) in dist.pygx.row(x).iter().enumerate() {
                    let cur = qyt.get(t, y);
                    qyt.set(t, y, cur + w * pyx);
                }
            }
        }
        for (t, &mass) in qt.iter().enumerate() {
            if mass > 0.0 {
                for v in qyt.row_mut(t) {
                    *v /= mass;
                }
            }
        }

        let ht = shannon_entropy(&qt);
        let hgt = renyi_entropy(&qt, gamma);
        let ixt = mutual_information(encoder, &dist.px).min(ht);
        let iyt = mutual_information(&qyt, &qt);
        let ht_given_x = (ht - ixt).max(0.0);
        let hga = hgt - alpha * ht_given_x;

        let point = CurvePoint {
            beta,
            hga,
            ixt,
            ht,
            hgt,
            iyt,
            status: PointStatus::Exact,
        };
        if [point.hga, point.ixt, point.ht, point.hgt, point.iyt]
            .iter()
            .any(|v| !v.is_finite())
        {
            return Err(SolverFailure::new(format!(
                "non-finite statistics at beta={beta}"
            )));
        }
        Ok(point)
    }

    pub fn is_approximate(&self) -> bool {
        matches!(self.status, PointStatus::Approximate(_))
    }

    pub fn degradation(&self) -> Option<&PointDegradation> {
        match &self.status {
            PointStatus::Approximate(d) => Some(d),
            _ => None,
        }
    }

    /// Same point, flagged approximate.
    pub fn degraded(mut self, degradation: PointDegradation) -> Self {
        self.status = PointStatus::Approximate(degradation);
        self
    }
}

/// Serde helpers that keep +∞ representable in JSON as `"inf"`.
pub mod beta_format {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Finite(f64),
        Named(String),
    }

    fn to_repr(beta: f64) -> Repr {
        if beta == f64::INFINITY {
            Repr::Named("inf".to_string())
        } else {
            Repr::Finite(beta)
        }
    }

    fn from_repr<E: serde::de::Error>(repr: Repr) -> Result<f64, E> {
        match repr {
            Repr::Finite(v) => Ok(v),
            Repr::Named(s) if s.eq_ignore_ascii_case("inf") || s.eq_ignore_ascii_case("infinity") => {
                Ok(f64::INFINITY)
            }
            Repr::Named(s) => Err(E::custom(format!("invalid beta {s:?}"))),
        }
    }

    pub fn serialize<S: Serializer>(beta: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        to_repr(*beta).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        from_repr(Repr::deserialize(deserializer)?)
    }

    /// The same encoding for a sequence of betas.
    pub mod seq {
        use super::*;

        pub fn serialize<S: Serializer>(betas: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
            let reprs: Vec<Repr> = betas.iter().map(|b| to_repr(*b)).collect();
            reprs.serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
            Vec::<Repr>::deserialize(deserializer)?
                .into_iter()
                .map(from_repr::<D::Error>)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::preprocess::preprocess;

    fn diagonal() -> Preprocessed {
        let pxy = Matrix::from_rows(vec![vec![0.5, 0.0], vec![0.0, 0.5]]).unwrap();
        preprocess(&pxy, 1.0).unwrap()
    }

    #[test]
    fn identity_encoder_reaches_upper_bounds() {
        let dist = diagonal();
        let q = Matrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let p = CurvePoint::from_encoder(5.0, &q, &dist, 1.0, 1.0).unwrap();
        assert!((p.ixt - 1.0).abs() < 1e-12);
        assert!((p.iyt - 1.0).abs() < 1e-12);
        assert!((p.hga - 1.0).abs() < 1e-12);
        assert_eq!(p.status, PointStatus::Exact);
    }

    #[test]
    fn independent_encoder_has_zero_cost_for_ib() {
        let dist = diagonal();
        let q = Matrix::from_rows(vec![vec![0.5, 0.5], vec![0.5, 0.5]]).unwrap();
        let p = CurvePoint::from_encoder(0.5, &q, &dist, 1.0, 1.0).unwrap();
        assert!(p.hga.abs() < 1e-12);
        assert!(p.iyt.abs() < 1e-12);
        // DIB cost ignores H(T|X)
        let dib = CurvePoint::from_encoder(0.5, &q, &dist, 0.0, 1.0).unwrap();
        assert!((dib.hga - 1.0).abs() < 1e-12);
    }

    #[test]
    fn malformed_encoders_are_solver_failures() {
        let dist = diagonal();
        let wrong_shape = Matrix::from_rows(vec![vec![1.0]]).unwrap();
        assert!(CurvePoint::from_encoder(1.0, &wrong_shape, &dist, 1.0, 1.0).is_err());
        let unnormalized = Matrix::from_rows(vec![vec![0.7, 0.7], vec![0.0, 1.0]]).unwrap();
        assert!(CurvePoint::from_encoder(1.0, &unnormalized, &dist, 1.0, 1.0).is_err());
        let nan = Matrix::from_rows(vec![vec![f64::NAN, 1.0], vec![0.0, 1.0]]).unwrap();
        assert!(CurvePoint::from_encoder(1.0, &nan, &dist, 1.0, 1.0).is_err());
    }

    #[test]
    fn upper_endpoint_uses_bounds() {
        let dist = diagonal();
        let p = CurvePoint::upper_endpoint(&dist);
        assert!(p.beta.is_infinite());
        assert_eq!(p.hga, dist.hgx);
        assert_eq!(p.iyt, dist.ixy);
    }

    #[test]
    fn infinite_beta_round_trips_through_json() {
        let dist = diagonal();
        let json = serde_json::to_string(&CurvePoint::upper_endpoint(&dist)).unwrap();
        assert!(json.contains("\"beta\":\"inf\""));
        let back: CurvePoint = serde_json::from_str(&json).unwrap();
        assert!(back.beta.is_infinite());
        assert!(serde_json::from_str::<CurvePoint>(&json.replace("\"inf\"", "\"huge\"")).is_err());
    }

    #[test]
    fn degradation_converts_to_curve_error() {
        let d = PointDegradation::NotConverged {
            target: 0.5,
            best_beta: 2.0,
            evaluations: 10,
            residual: 0.01,
        };
        let p = CurvePoint::lower_endpoint().degraded(d.clone());
        assert!(p.is_approximate());
        assert_eq!(p.degradation(), Some(&d));
        let err: crate::error::CurveError = d.into();
        assert!(matches!(
            err,
            crate::error::CurveError::SearchDidNotConverge { .. }
        ));
    }
}
