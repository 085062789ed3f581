//! Exit codes for the `ib-curve` CLI.
//!
//! Exit code ranges:
//! - 0-1: Success outcomes (parse outcome from code, not output)
//! - 10-19: Input/parameter errors (recoverable by user action)
//! - 20-29: Runtime/internal errors

/// Exit codes for `ib-curve` operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Success Outcomes (0-1)
    // ========================================================================
    /// Every curve point resolved exactly
    Clean = 0,

    /// Curve produced, but some points are flagged approximate
    Approximate = 1,

    // ========================================================================
    // Input / Parameter Errors (10-19)
    // ========================================================================
    /// Invalid arguments or configuration values
    ArgsError = 10,

    /// Joint distribution has no usable marginal
    DegenerateInput = 11,

    /// Solver failed systematically across every target
    SolverError = 12,

    /// A point did not converge and strict mode was requested
    NotConverged = 13,

    // ========================================================================
    // Runtime / Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O or parse error
    IoError = 21,

    /// Request exceeded its time budget
    TimeoutError = 22,

    /// Request was cancelled
    Cancelled = 23,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates a produced curve (codes 0-1).
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::Approximate)
    }

    /// Check if this exit code is a user/input error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Approximate => "OK_APPROXIMATE",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::DegenerateInput => "ERR_DEGENERATE",
            ExitCode::SolverError => "ERR_SOLVER",
            ExitCode::NotConverged => "ERR_NOT_CONVERGED",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::TimeoutError => "ERR_TIMEOUT",
            ExitCode::Cancelled => "ERR_CANCELLED",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
