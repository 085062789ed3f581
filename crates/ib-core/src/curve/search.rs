//! Beta search: find the beta whose solved Hga hits a target.
//!
//! beta has no finite a-priori upper bound, so each search first grows a
//! bracket `[low, high]` with `Hga(low) <= target <= Hga(high)` by doubling
//! `high`, then bisects. Correctness relies on the solver's Hga being
//! non-decreasing in beta.
//!
//! Budget overruns and solver failures do not fail the request: the best
//! candidate seen so far is returned, flagged with a [`PointDegradation`].
//! Only cancellation and the whole-request deadline abort a search.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use ib_math::Matrix;
use tracing::{debug, trace, warn};

use super::cancel::CancelToken;
use super::point::{CurvePoint, PointDegradation, PointStatus};
use super::preprocess::Preprocessed;
use crate::config::{CurveConfig, SearchConfig};
use crate::error::{CurveError, CurveResult};
use crate::logging::{event_names, Stage};
use crate::solver::{SolveRequest, Solver, SolverFailure};

/// One unit of independent work.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Job {
    /// Search for this horizontal-axis value.
    Target(f64),
    /// Solve at exactly this beta.
    Beta(f64),
}

/// Result of one job.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A point, exact or flagged approximate.
    Point(CurvePoint),
    /// An explicit beta whose solve failed; there is nothing to plot.
    Failed(PointDegradation),
}

impl Outcome {
    pub fn degradation(&self) -> Option<&PointDegradation> {
        match self {
            Outcome::Point(p) => p.degradation(),
            Outcome::Failed(d) => Some(d),
        }
    }

    /// True for analytic endpoints, which never reach the solver.
    pub fn is_endpoint(&self) -> bool {
        matches!(self, Outcome::Point(p) if p.status == PointStatus::Endpoint)
    }
}

/// Whole-request wall-clock budget.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    pub at: Instant,
    pub budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Deadline {
            at: Instant::now() + budget,
            budget,
        }
    }
}

/// Bracket for a single target; owned by one search.
#[derive(Debug, Clone, Copy)]
struct SearchState {
    target: f64,
    low_beta: f64,
    high_beta: f64,
    delta: f64,
}

impl SearchState {
    fn new(target: f64, seed: f64, delta: f64) -> Self {
        SearchState {
            target,
            low_beta: 0.0,
            high_beta: seed,
            delta,
        }
    }

    /// Where `hga` sits relative to the accepted band around the target.
    fn classify(&self, hga: f64) -> Ordering {
        if hga < self.target - self.delta {
            Ordering::Less
        } else if hga > self.target + self.delta {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

/// Closest point to the target seen so far.
struct BestCandidate {
    point: CurvePoint,
    residual: f64,
}

impl BestCandidate {
    fn new(point: CurvePoint, target: f64) -> Self {
        let residual = (point.hga - target).abs();
        BestCandidate { point, residual }
    }

    fn consider(&mut self, point: &CurvePoint, target: f64) {
        let residual = (point.hga - target).abs();
        if residual < self.residual {
            self.point = point.clone();
            self.residual = residual;
        }
    }
}

/// Everything a search needs; shared read-only by all workers.
pub struct SearchContext<'a, S: Solver + ?Sized> {
    solver: &'a S,
    pxy: &'a Matrix,
    dist: &'a Preprocessed,
    alpha: f64,
    gamma: f64,
    delta: f64,
    epsilon: f64,
    search: &'a SearchConfig,
    cancel: &'a CancelToken,
    deadline: Option<Deadline>,
}

impl<'a, S: Solver + ?Sized> SearchContext<'a, S> {
    pub fn new(
        solver: &'a S,
        pxy: &'a Matrix,
        dist: &'a Preprocessed,
        config: &'a CurveConfig,
        cancel: &'a CancelToken,
        deadline: Option<Deadline>,
    ) -> Self {
        SearchContext {
            solver,
            pxy,
            dist,
            alpha: config.alpha,
            gamma: config.gamma,
            delta: config.delta,
            epsilon: config.epsilon,
            search: &config.search,
            cancel,
            deadline,
        }
    }

    /// Run one job.
    pub fn run(&self, job: Job) -> CurveResult<Outcome> {
        match job {
            Job::Target(target) => self.resolve_target(target).map(Outcome::Point),
            Job::Beta(beta) => self.resolve_beta(beta),
        }
    }

    /// Fail fast on cancellation or an expired request deadline.
    pub fn checkpoint(&self) -> CurveResult<()> {
        if self.cancel.is_cancelled() {
            return Err(CurveError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline.at {
                return Err(CurveError::TimedOut(deadline.budget));
            }
        }
        Ok(())
    }

    /// Solve at `beta` (finite, > 0) and derive the point's statistics.
    pub fn evaluate(&self, beta: f64) -> Result<CurvePoint, SolverFailure> {
        let request = SolveRequest {
            pxy: self.pxy,
            px: &self.dist.px,
            pygx: &self.dist.pygx,
            beta,
            alpha: self.alpha,
            gamma: self.gamma,
            epsilon: self.epsilon,
        };
        let encoder = self.solver.solve(&request)?;
        CurvePoint::from_encoder(beta, &encoder, self.dist, self.alpha, self.gamma)
    }

    /// Resolve an explicit beta; 0 and ∞ map to the analytic endpoints.
    pub fn resolve_beta(&self, beta: f64) -> CurveResult<Outcome> {
        self.checkpoint()?;
        if beta == 0.0 {
            return Ok(Outcome::Point(CurvePoint::lower_endpoint()));
        }
        if beta == f64::INFINITY {
            return Ok(Outcome::Point(CurvePoint::upper_endpoint(self.dist)));
        }
        match self.evaluate(beta) {
            Ok(point) => {
                debug!(stage = %Stage::Search, beta, hga = point.hga, iyt = point.iyt, "explicit beta solved");
                Ok(Outcome::Point(point))
            }
            Err(failure) => {
                let degradation = PointDegradation::SolverFailed {
                    beta,
                    target: None,
                    message: failure.message,
                };
                warn!(
                    stage = %Stage::Search,
                    event = event_names::SEARCH_DEGRADED,
                    beta,
                    reason = %degradation,
                    "explicit beta failed"
                );
                Ok(Outcome::Failed(degradation))
            }
        }
    }

    /// Find a beta whose Hga lies within `delta` of `target`.
    pub fn resolve_target(&self, target: f64) -> CurveResult<CurvePoint> {
        let started = Instant::now();
        let mut state = SearchState::new(target, self.search.beta_seed, self.delta);
        let mut best = BestCandidate::new(CurvePoint::lower_endpoint(), target);
        let mut evaluations = 0usize;

        // Grow the bracket until Hga(high) exceeds the target.
        let mut expansions = 0usize;
        loop {
            self.checkpoint()?;
            if self.search_expired(started) {
                return Ok(self.not_converged(best, target, evaluations));
            }
            let beta = state.high_beta;
            let point = match self.evaluate(beta) {
                Ok(point) => point,
                Err(failure) => return Ok(self.solver_failed(best, target, beta, failure)),
            };
            evaluations += 1;
            trace!(target, beta, hga = point.hga, "bracket step");

            match state.classify(point.hga) {
                Ordering::Equal => return Ok(self.converged(point, target, evaluations)),
                Ordering::Greater => {
                    best.consider(&point, target);
                    break;
                }
                Ordering::Less => {
                    best.consider(&point, target);
                    if expansions >= self.search.max_expansions {
                        return Ok(self.not_converged(best, target, evaluations));
                    }
                    expansions += 1;
                    state.low_beta = state.high_beta;
                    state.high_beta *= 2.0;
                    if !state.high_beta.is_finite() {
                        return Ok(self.not_converged(best, target, evaluations));
                    }
                }
            }
        }
        debug!(
            stage = %Stage::Search,
            event = event_names::SEARCH_BRACKETED,
            target,
            low = state.low_beta,
            high = state.high_beta,
            expansions,
            "bracket established"
        );

        for _ in 0..self.search.max_iterations {
            self.checkpoint()?;
            if self.search_expired(started) {
                break;
            }
            let mid = 0.5 * (state.low_beta + state.high_beta);
            if mid <= state.low_beta || mid >= state.high_beta {
                // bracket narrower than f64 resolution
                break;
            }
            let point = match self.evaluate(mid) {
                Ok(point) => point,
                Err(failure) => return Ok(self.solver_failed(best, target, mid, failure)),
            };
            evaluations += 1;
            trace!(target, beta = mid, hga = point.hga, "bisection step");

            match state.classify(point.hga) {
                Ordering::Less => {
                    best.consider(&point, target);
                    state.low_beta = mid;
                }
                Ordering::Greater => {
                    best.consider(&point, target);
                    state.high_beta = mid;
                }
                Ordering::Equal => return Ok(self.converged(point, target, evaluations)),
            }
        }

        Ok(self.not_converged(best, target, evaluations))
    }

    fn search_expired(&self, started: Instant) -> bool {
        self.search
            .search_timeout
            .is_some_and(|limit| started.elapsed() >= limit)
    }

    fn converged(&self, point: CurvePoint, target: f64, evaluations: usize) -> CurvePoint {
        debug!(
            stage = %Stage::Search,
            event = event_names::SEARCH_CONVERGED,
            target,
            beta = point.beta,
            hga = point.hga,
            evaluations,
            "target resolved"
        );
        point
    }

    fn not_converged(&self, best: BestCandidate, target: f64, evaluations: usize) -> CurvePoint {
        let degradation = PointDegradation::NotConverged {
            target,
            best_beta: best.point.beta,
            evaluations,
            residual: best.residual,
        };
        warn!(
            stage = %Stage::Search,
            event = event_names::SEARCH_DEGRADED,
            target,
            reason = %degradation,
            "search budget exhausted; keeping best candidate"
        );
        best.point.degraded(degradation)
    }

    fn solver_failed(
        &self,
        best: BestCandidate,
        target: f64,
        beta: f64,
        failure: SolverFailure,
    ) -> CurvePoint {
        let degradation = PointDegradation::SolverFailed {
            beta,
            target: Some(target),
            message: failure.message,
        };
        warn!(
            stage = %Stage::Search,
            event = event_names::SEARCH_DEGRADED,
            target,
            reason = %degradation,
            "solver failed; keeping best candidate"
        );
        best.point.degraded(degradation)
    }
}
