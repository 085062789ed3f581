//! Generalized Information Bottleneck curve tracing.
//!
//! This library provides:
//! - Exit codes and the error taxonomy for curve requests
//! - Configuration defaults, file loading and validation
//! - The inner GIB solver behind the [`solver::Solver`] trait
//! - Curve tracing: per-target beta search over a worker pool
//! - The persisted run record consumed by downstream analysis
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod curve;
pub mod error;
pub mod exit_codes;
pub mod input;
pub mod logging;
pub mod record;
pub mod solver;

pub use config::{CurveConfig, DisplayMode, SearchConfig, SolverKind};
pub use curve::{compute_curve, CancelToken, Curve, CurvePoint, PointDegradation, PointStatus};
pub use error::{CurveError, CurveResult};
pub use exit_codes::ExitCode;
pub use record::RunRecord;
pub use solver::{GibSolver, SolveRequest, Solver, SolverFailure};
