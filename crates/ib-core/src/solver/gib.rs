//! Generalized information bottleneck fixed-point solver.
//!
//! Alternates the self-consistent equations
//!
//! - `q(t)   = Σ_x p(x) q(t|x)`
//! - `q(y|t) = Σ_x q(t|x) p(x) p(y|x) / q(t)`
//! - `d(x,t) = KL(p(y|x) || q(y|t))` (nats)
//! - `q(t|x) ∝ exp((ln q(t) - β d(x,t)) / α)` for α > 0
//! - `q(t|x) = 1[t = argmax_t ln q(t) - β d(x,t)]` for α = 0 (DIB)
//!
//! starting from a softened identity encoder with |T| = |X| so results are
//! reproducible. `gamma` does not enter the updates.

use ib_math::{kl_divergence_nats, softmax_in_place, Matrix};
use tracing::{debug, trace};

use super::{SolveRequest, Solver, SolverFailure};

/// Default cap on fixed-point sweeps.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;
/// Default mass moved off the diagonal in the initial encoder.
pub const DEFAULT_INIT_SMOOTHING: f64 = 0.5;

/// Iterative generalized-IB solver.
#[derive(Debug, Clone)]
pub struct GibSolver {
    /// Cap on fixed-point sweeps; hitting it returns the last iterate.
    pub max_iterations: usize,
    /// Off-diagonal mass of the initial encoder, in [0, 1).
    pub init_smoothing: f64,
}

impl Default for GibSolver {
    fn default() -> Self {
        GibSolver {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            init_smoothing: DEFAULT_INIT_SMOOTHING,
        }
    }
}

impl GibSolver {
    fn initial_encoder(&self, n: usize) -> Matrix {
        let s = self.init_smoothing.clamp(0.0, 1.0);
        let mut q = Matrix::zeros(n, n);
        for x in 0..n {
            for t in 0..n {
                let diag = if x == t { 1.0 - s } else { 0.0 };
                q.set(x, t, diag + s / n as f64);
            }
        }
        q
    }

    /// One fixed-point sweep; returns the updated encoder.
    fn sweep(&self, q: &Matrix, request: &SolveRequest<'_>) -> Result<Matrix, SolverFailure> {
        let nx = request.px.len();
        let nt = q.cols();
        let ny = request.pygx.cols();

        let mut qt = vec![0.0; nt];
        for (x, &px) in request.px.iter().enumerate() {
            for (t, acc) in qt.iter_mut().enumerate() {
                *acc += px * q.get(x, t);
            }
        }

        let mut qygt = Matrix::zeros(nt, ny);
        for x in 0..nx {
            let px = request.px[x];
            if px <= 0.0 {
                continue;
            }
            for t in 0..nt {
                let w = q.get(x, t) * px;
                if w <= 0.0 {
                    continue;
                }
                for (y, &pyx) in request.pygx.row(x).iter().enumerate() {
                    let cur = qygt.get(t, y);
                    qygt.set(t, y, cur + w * pyx);
                }
            }
        }
        for (t, &mass) in qt.iter().enumerate() {
            if mass > 0.0 {
                for v in qygt.row_mut(t) {
                    *v /= mass;
                }
            }
        }

        let mut next = Matrix::zeros(nx, nt);
        let mut scores = vec![f64::NEG_INFINITY; nt];
        for x in 0..nx {
            for t in 0..nt {
                scores[t] = if qt[t] > 0.0 {
                    let d = kl_divergence_nats(request.pygx.row(x), qygt.row(t));
                    let penalty = if request.beta == 0.0 { 0.0 } else { request.beta * d };
                    qt[t].ln() - penalty
                } else {
                    f64::NEG_INFINITY
                };
            }

            if request.alpha == 0.0 {
                let best = scores
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.is_finite())
                    .fold(None::<(usize, f64)>, |acc, (t, &s)| match acc {
                        Some((_, bs)) if bs >= s => acc,
                        _ => Some((t, s)),
                    });
                let (t, _) = best.ok_or_else(|| {
                    SolverFailure::new(format!("no reachable cluster for x={x}"))
                })?;
                next.set(x, t, 1.0);
            } else {
                for s in scores.iter_mut() {
                    *s /= request.alpha;
                }
                if !softmax_in_place(&mut scores) {
                    return Err(SolverFailure::new(format!(
                        "encoder row for x={x} has no finite weight"
                    )));
                }
                next.row_mut(x).copy_from_slice(&scores);
            }
        }
        Ok(next)
    }
}

impl Solver for GibSolver {
    fn name(&self) -> &'static str {
        "gib"
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<Matrix, SolverFailure> {
        let n = request.px.len();
        if n == 0 || request.pygx.rows() != n {
            return Err(SolverFailure::new("marginal and conditional disagree on |X|"));
        }
        if request.beta.is_nan() || request.beta < 0.0 || request.beta.is_infinite() {
            return Err(SolverFailure::new(format!(
                "beta must be finite and >= 0, got {}",
                request.beta
            )));
        }

        let mut q = self.initial_encoder(n);
        for iteration in 0..self.max_iterations {
            let next = self.sweep(&q, request)?;
            let change = q
                .as_slice()
                .iter()
                .zip(next.as_slice())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            q = next;
            if !change.is_finite() {
                return Err(SolverFailure::new(format!(
                    "non-finite encoder update at beta={}",
                    request.beta
                )));
            }
            if change < request.epsilon {
                trace!(beta = request.beta, iteration, "gib solver converged");
                return Ok(q);
            }
        }

        debug!(
            beta = request.beta,
            max_iterations = self.max_iterations,
            "gib solver hit its iteration cap; returning last iterate"
        );
        Ok(q)
    }
}
