//! Deterministic solvers and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use ib_core::{CancelToken, SolveRequest, Solver, SolverFailure};
use ib_math::Matrix;

/// q(t|x) = (1 - e) 1[t = x] + e / |X| with e = exp(-beta).
///
/// Continuous and strictly increasing in beta for IB costs, trivial at
/// beta = 0 and the identity as beta grows.
#[derive(Debug, Default)]
pub struct SoftIdentity {
    calls: AtomicUsize,
}

impl SoftIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Solver for SoftIdentity {
    fn name(&self) -> &'static str {
        "soft-identity"
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<Matrix, SolverFailure> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let n = request.px.len();
        let e = (-request.beta).exp();
        let mut q = Matrix::zeros(n, n);
        for x in 0..n {
            for t in 0..n {
                let diag = if x == t { 1.0 - e } else { 0.0 };
                q.set(x, t, diag + e / n as f64);
            }
        }
        Ok(q)
    }
}

/// Behaves like [`SoftIdentity`] and cancels `token` once `after` solves
/// have completed, so the request is cancelled mid-search.
#[derive(Debug)]
pub struct CancelsAfter {
    after: usize,
    token: CancelToken,
    inner: SoftIdentity,
}

impl CancelsAfter {
    pub fn new(after: usize, token: CancelToken) -> Self {
        CancelsAfter {
            after,
            token,
            inner: SoftIdentity::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

impl Solver for CancelsAfter {
    fn name(&self) -> &'static str {
        "cancels-after"
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<Matrix, SolverFailure> {
        let encoder = self.inner.solve(request);
        if self.inner.calls() >= self.after {
            self.token.cancel();
        }
        encoder
    }
}

/// Fails every call.
#[derive(Debug, Default)]
pub struct AlwaysFails;

impl Solver for AlwaysFails {
    fn name(&self) -> &'static str {
        "always-fails"
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<Matrix, SolverFailure> {
        Err(SolverFailure::new(format!("refusing beta={}", request.beta)))
    }
}

/// Fails above a beta threshold and behaves like [`SoftIdentity`] below.
#[derive(Debug)]
pub struct FailsAbove {
    pub threshold: f64,
    inner: SoftIdentity,
}

impl FailsAbove {
    pub fn new(threshold: f64) -> Self {
        FailsAbove {
            threshold,
            inner: SoftIdentity::new(),
        }
    }
}

impl Solver for FailsAbove {
    fn name(&self) -> &'static str {
        "fails-above"
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<Matrix, SolverFailure> {
        if request.beta > self.threshold {
            return Err(SolverFailure::new("unstable"));
        }
        self.inner.solve(request)
    }
}

/// Panics on every call.
#[derive(Debug, Default)]
pub struct Panics;

impl Solver for Panics {
    fn name(&self) -> &'static str {
        "panics"
    }

    fn solve(&self, _request: &SolveRequest<'_>) -> Result<Matrix, SolverFailure> {
        panic!("solver bug");
    }
}

/// X and Y perfectly correlated over two symbols.
pub fn perfectly_correlated() -> Matrix {
    Matrix::from_rows(vec![vec![0.5, 0.0], vec![0.0, 0.5]]).unwrap()
}

/// X and Y independent with uneven marginals.
pub fn independent() -> Matrix {
    let px = [0.2, 0.3, 0.5];
    let py = [0.6, 0.4];
    Matrix::from_rows(
        px.iter()
            .map(|a| py.iter().map(|b| a * b).collect())
            .collect(),
    )
    .unwrap()
}

/// A noisy 3x3 channel.
pub fn noisy_channel() -> Matrix {
    Matrix::from_rows(vec![
        vec![0.25, 0.05, 0.0333333333333333],
        vec![0.05, 0.2, 0.0833333333333333],
        vec![0.0, 0.0833333333333334, 0.25],
    ])
    .unwrap()
}

pub fn assert_close(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "{a} vs {b} (tol {tol})");
}
