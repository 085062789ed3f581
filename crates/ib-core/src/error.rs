//! Error types for curve tracing.
//!
//! Fatal conditions surface as [`CurveError`] and reject the whole request.
//! Per-point problems that the curve tolerates are recorded as
//! [`crate::curve::PointDegradation`] instead and only become a
//! `CurveError` when a caller asks for an exact curve.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Result type alias for curve operations.
pub type CurveResult<T> = std::result::Result<T, CurveError>;

/// Errors raised while configuring or computing a curve.
#[derive(Error, Debug)]
pub enum CurveError {
    #[error("invalid parameter {field}: {constraint}")]
    InvalidParameter { field: String, constraint: String },

    #[error("degenerate distribution: {0}")]
    DegenerateDistribution(String),

    #[error(
        "search for Hga={target} did not converge after {evaluations} solver calls \
         (best beta={best_beta}, residual={residual})"
    )]
    SearchDidNotConverge {
        target: f64,
        best_beta: f64,
        evaluations: usize,
        residual: f64,
    },

    #[error("solver failed at beta={beta}{}: {message}", target_suffix(.target))]
    Solver {
        beta: f64,
        target: Option<f64>,
        message: String,
    },

    #[error("curve request cancelled")]
    Cancelled,

    #[error("curve request exceeded its time budget of {0:?}")]
    TimedOut(Duration),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

fn target_suffix(target: &Option<f64>) -> String {
    match target {
        Some(t) => format!(" (target Hga={t})"),
        None => String::new(),
    }
}

impl CurveError {
    /// Shorthand for [`CurveError::InvalidParameter`].
    pub fn invalid(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        CurveError::InvalidParameter {
            field: field.into(),
            constraint: constraint.into(),
        }
    }

    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            CurveError::InvalidParameter { .. } => 10,
            CurveError::DegenerateDistribution(_) => 11,
            CurveError::SearchDidNotConverge { .. } => 12,
            CurveError::Solver { .. } => 13,
            CurveError::Cancelled => 14,
            CurveError::TimedOut(_) => 15,
            CurveError::Io { .. } => 20,
            CurveError::Parse { .. } => 21,
            CurveError::Internal(_) => 30,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CurveError::InvalidParameter { .. } => ExitCode::ArgsError,
            CurveError::DegenerateDistribution(_) => ExitCode::DegenerateInput,
            CurveError::SearchDidNotConverge { .. } => ExitCode::NotConverged,
            CurveError::Solver { .. } => ExitCode::SolverError,
            CurveError::Cancelled => ExitCode::Cancelled,
            CurveError::TimedOut(_) => ExitCode::TimeoutError,
            CurveError::Io { .. } | CurveError::Parse { .. } => ExitCode::IoError,
            CurveError::Internal(_) => ExitCode::InternalError,
        }
    }

    /// Whether the error rejects the request before any numeric work.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CurveError::InvalidParameter { .. } | CurveError::DegenerateDistribution(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_names_field_and_constraint() {
        let err = CurveError::invalid("gamma", "must be > 0, got -1");
        assert_eq!(err.to_string(), "invalid parameter gamma: must be > 0, got -1");
        assert_eq!(err.exit_code(), ExitCode::ArgsError);
        assert!(err.is_input_error());
    }

    #[test]
    fn solver_error_mentions_target_when_known() {
        let err = CurveError::Solver {
            beta: 2.5,
            target: Some(0.5),
            message: "non-finite encoder".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("beta=2.5"));
        assert!(text.contains("target Hga=0.5"));

        let bare = CurveError::Solver {
            beta: 2.5,
            target: None,
            message: "boom".to_string(),
        };
        assert!(!bare.to_string().contains("target"));
    }

    #[test]
    fn codes_are_distinct() {
        let errors = [
            CurveError::invalid("n", "x"),
            CurveError::DegenerateDistribution("x".into()),
            CurveError::SearchDidNotConverge {
                target: 0.1,
                best_beta: 1.0,
                evaluations: 3,
                residual: 0.01,
            },
            CurveError::Cancelled,
            CurveError::TimedOut(Duration::from_secs(1)),
            CurveError::Internal("x".into()),
        ];
        let mut codes: Vec<u32> = errors.iter().map(CurveError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
