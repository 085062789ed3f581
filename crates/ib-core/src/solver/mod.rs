//! Inner solvers: the optimal encoder Q(T|X) for one fixed beta.
//!
//! The curve tracer treats the solver as a collaborator. Its only
//! obligations are determinism up to `epsilon` and, for the beta search to
//! be meaningful, a generalized cost Hga that is non-decreasing in beta.
//! Neither property is re-checked here; violations show up as
//! non-converged points and as monotonicity warnings during assembly.

pub mod gib;

pub use gib::GibSolver;

use ib_math::Matrix;
use thiserror::Error;

/// Inputs for a single solver call.
#[derive(Debug, Clone, Copy)]
pub struct SolveRequest<'a> {
    /// Joint distribution P(x, y).
    pub pxy: &'a Matrix,
    /// Marginal P(x).
    pub px: &'a [f64],
    /// Conditional P(y|x), one row per x.
    pub pygx: &'a Matrix,
    pub beta: f64,
    pub alpha: f64,
    pub gamma: f64,
    /// Convergence threshold.
    pub epsilon: f64,
}

/// A solver could not produce a usable encoder.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SolverFailure {
    pub message: String,
}

impl SolverFailure {
    pub fn new(message: impl Into<String>) -> Self {
        SolverFailure {
            message: message.into(),
        }
    }
}

/// Computes the optimal encoder Q(t|x) for a fixed beta.
///
/// The returned matrix has one row per x value and one column per cluster;
/// each row with positive P(x) must sum to 1. Implementations must be safe
/// to call concurrently from several search workers.
pub trait Solver: Sync {
    /// Short name for logs and run records.
    fn name(&self) -> &'static str;

    fn solve(&self, request: &SolveRequest<'_>) -> Result<Matrix, SolverFailure>;
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<Matrix, SolverFailure> {
        (**self).solve(request)
    }
}
