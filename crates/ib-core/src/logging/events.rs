//! Stage and event vocabulary for structured logs.
//!
//! Every log line emitted by the curve pipeline carries a `stage` field and,
//! for lifecycle events, an `event` field drawn from [`event_names`].

use serde::{Deserialize, Serialize};

/// Processing stages in the curve pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration loading.
    Init,
    /// Parameter validation.
    Validate,
    /// Marginals and axis bounds.
    Preprocess,
    /// Partition of the horizontal axis.
    Plan,
    /// Per-target beta search.
    Search,
    /// Sorting and collapsing curve points.
    Assemble,
    /// Writing the run record.
    Output,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Validate => "validate",
            Stage::Preprocess => "preprocess",
            Stage::Plan => "plan",
            Stage::Search => "search",
            Stage::Assemble => "assemble",
            Stage::Output => "output",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Request lifecycle
    pub const CURVE_STARTED: &str = "curve.started";
    pub const CURVE_FINISHED: &str = "curve.finished";
    pub const CURVE_REJECTED: &str = "curve.rejected";
    pub const CURVE_CANCELLED: &str = "curve.cancelled";

    // Preprocess / plan
    pub const BOUNDS_COMPUTED: &str = "preprocess.bounds";
    pub const PLAN_READY: &str = "plan.ready";

    // Search
    pub const SEARCH_BRACKETED: &str = "search.bracketed";
    pub const SEARCH_CONVERGED: &str = "search.converged";
    pub const SEARCH_DEGRADED: &str = "search.degraded";

    // Assemble
    pub const MONOTONICITY_VIOLATED: &str = "assemble.monotonicity_violated";

    // Output
    pub const RECORD_WRITTEN: &str = "output.record_written";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_display_matches_serde() {
        for stage in [Stage::Init, Stage::Search, Stage::Assemble] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn event_names_are_dotted() {
        for name in [
            event_names::CURVE_STARTED,
            event_names::SEARCH_DEGRADED,
            event_names::RECORD_WRITTEN,
        ] {
            assert!(name.contains('.'), "{name}");
        }
    }
}
