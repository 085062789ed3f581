//! Merge endpoints and search outcomes into an ordered curve.

use serde::Serialize;
use tracing::{debug, warn};

use super::point::{CurvePoint, PointDegradation};
use super::preprocess::Preprocessed;
use super::search::Outcome;
use crate::config::DisplayMode;
use crate::error::{CurveError, CurveResult};
use crate::logging::{event_names, Stage};

/// A traced curve, ordered by non-decreasing beta.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub gamma: f64,
    pub alpha: f64,
    pub display: DisplayMode,
    pub solver: String,
    /// H(X)
    pub hx: f64,
    /// H_gamma(X)
    pub hgx: f64,
    /// I(X;Y)
    pub ixy: f64,
    pub points: Vec<CurvePoint>,
    /// Every degradation raised while computing the curve, in job order.
    /// Includes failed explicit betas that produced no point.
    pub degradations: Vec<PointDegradation>,
}

/// The curve as parallel columns, one entry per point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveColumns {
    pub hga: Vec<f64>,
    pub ixt: Vec<f64>,
    pub ht: Vec<f64>,
    pub hgt: Vec<f64>,
    pub iyt: Vec<f64>,
    pub bs: Vec<f64>,
}

impl Curve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn betas(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.beta).collect()
    }

    pub fn columns(&self) -> CurveColumns {
        let mut cols = CurveColumns::default();
        for p in &self.points {
            cols.hga.push(p.hga);
            cols.ixt.push(p.ixt);
            cols.ht.push(p.ht);
            cols.hgt.push(p.hgt);
            cols.iyt.push(p.iyt);
            cols.bs.push(p.beta);
        }
        cols
    }

    /// True when no point is approximate and no explicit beta failed.
    pub fn is_exact(&self) -> bool {
        self.degradations.is_empty()
    }

    /// Indices into `points` of approximate points.
    pub fn approximate_indices(&self) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_approximate())
            .map(|(i, _)| i)
            .collect()
    }

    /// Reject the curve if anything about it is approximate.
    pub fn require_exact(&self) -> CurveResult<&Self> {
        match self.degradations.first() {
            Some(d) => Err(d.clone().into()),
            None => Ok(self),
        }
    }
}

/// Ordered points plus the degradations collected on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub points: Vec<CurvePoint>,
    pub degradations: Vec<PointDegradation>,
}

/// Build the point list from the two analytic endpoints and `outcomes`.
///
/// Points are stable-sorted by beta and equal betas collapse to the first
/// occurrence, so the endpoints win over explicit 0 / ∞ and the earlier
/// job wins otherwise. If every solver-backed job failed in the solver the
/// request fails with the first failure.
pub fn assemble(dist: &Preprocessed, outcomes: Vec<Outcome>) -> CurveResult<Assembled> {
    let solved: Vec<&Outcome> = outcomes.iter().filter(|o| !o.is_endpoint()).collect();
    if !solved.is_empty()
        && solved
            .iter()
            .all(|o| o.degradation().is_some_and(PointDegradation::is_solver_failure))
    {
        let first = solved[0].degradation().cloned();
        return Err(match first {
            Some(d) => d.into(),
            None => CurveError::Internal("solver failure without degradation".to_string()),
        });
    }

    let mut degradations = Vec::new();
    let mut points = Vec::with_capacity(outcomes.len() + 2);
    points.push(CurvePoint::lower_endpoint());
    points.push(CurvePoint::upper_endpoint(dist));
    for outcome in outcomes {
        match outcome {
            Outcome::Point(point) => {
                if let Some(d) = point.degradation() {
                    degradations.push(d.clone());
                }
                points.push(point);
            }
            Outcome::Failed(d) => degradations.push(d),
        }
    }

    points.sort_by(|a, b| a.beta.total_cmp(&b.beta));
    let before = points.len();
    points.dedup_by(|later, earlier| later.beta == earlier.beta);
    if points.len() < before {
        debug!(
            stage = %Stage::Assemble,
            collapsed = before - points.len(),
            "collapsed points with equal beta"
        );
    }

    for pair in points.windows(2) {
        if pair[1].hga < pair[0].hga {
            warn!(
                stage = %Stage::Assemble,
                event = event_names::MONOTONICITY_VIOLATED,
                beta_low = pair[0].beta,
                beta_high = pair[1].beta,
                hga_low = pair[0].hga,
                hga_high = pair[1].hga,
                "Hga decreases with beta"
            );
        }
    }

    Ok(Assembled {
        points,
        degradations,
    })
}
