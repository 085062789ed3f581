//! Configuration for curve requests.
//!
//! This module handles:
//! - The documented default table for every curve parameter
//! - Display-mode and solver selectors
//! - Loading partial overrides from TOML or JSON files
//! - Validation (see [`validation`]), run once before any numeric work

pub mod validation;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};
use crate::solver::{GibSolver, Solver};

pub use validation::{validate_config, validate_joint};

/// Default number of segments along the horizontal axis.
pub const DEFAULT_POINTS: usize = 10;
/// Default GIB trade-off between H(T) and H(T|X).
pub const DEFAULT_ALPHA: f64 = 1.0;
/// Default Renyi order (Shannon).
pub const DEFAULT_GAMMA: f64 = 1.0;
/// Default tolerance on |Hga - target|.
pub const DEFAULT_DELTA: f64 = 1e-8;
/// Default solver convergence threshold.
pub const DEFAULT_EPSILON: f64 = 1e-8;
/// Default first upper bracket for beta.
pub const DEFAULT_BETA_SEED: f64 = 1.0;
/// Default cap on bracket doublings per target.
pub const DEFAULT_MAX_EXPANSIONS: usize = 64;
/// Default cap on bisection steps per target.
pub const DEFAULT_MAX_ITERATIONS: usize = 200;

/// Which information planes a downstream renderer should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Information bottleneck plane: I(X;T) vs I(T;Y).
    Ib,
    /// Deterministic IB plane: H(T) vs I(T;Y).
    Dib,
    /// Generalized plane: Hga vs I(T;Y).
    Gib,
    /// All three planes (default).
    #[default]
    All,
    /// Compute only.
    None,
}

/// A single information plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InformationPlane {
    Ib,
    Dib,
    Gib,
}

impl DisplayMode {
    /// Planes selected by this mode, in rendering order.
    pub fn planes(self) -> &'static [InformationPlane] {
        match self {
            DisplayMode::Ib => &[InformationPlane::Ib],
            DisplayMode::Dib => &[InformationPlane::Dib],
            DisplayMode::Gib => &[InformationPlane::Gib],
            DisplayMode::All => &[
                InformationPlane::Ib,
                InformationPlane::Dib,
                InformationPlane::Gib,
            ],
            DisplayMode::None => &[],
        }
    }
}

impl FromStr for DisplayMode {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ib" => Ok(DisplayMode::Ib),
            "dib" => Ok(DisplayMode::Dib),
            "gib" => Ok(DisplayMode::Gib),
            "all" => Ok(DisplayMode::All),
            "none" => Ok(DisplayMode::None),
            _ => Err(CurveError::invalid(
                "display",
                format!("must be one of ib, dib, gib, all, none; got {s:?}"),
            )),
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DisplayMode::Ib => "ib",
            DisplayMode::Dib => "dib",
            DisplayMode::Gib => "gib",
            DisplayMode::All => "all",
            DisplayMode::None => "none",
        };
        write!(f, "{}", s)
    }
}

impl std::fmt::Display for InformationPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InformationPlane::Ib => write!(f, "ib"),
            InformationPlane::Dib => write!(f, "dib"),
            InformationPlane::Gib => write!(f, "gib"),
        }
    }
}

/// Inner solver used for each trial beta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Generalized IB fixed-point iteration.
    #[default]
    Gib,
}

impl SolverKind {
    /// Instantiate the solver with its default settings.
    pub fn build(self) -> Box<dyn Solver> {
        match self {
            SolverKind::Gib => Box::new(GibSolver::default()),
        }
    }
}

impl FromStr for SolverKind {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gib" => Ok(SolverKind::Gib),
            _ => Err(CurveError::invalid(
                "solver",
                format!("must be one of gib; got {s:?}"),
            )),
        }
    }
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverKind::Gib => write!(f, "gib"),
        }
    }
}

/// Budgets and bracketing for the per-target beta search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// First upper bracket tried for beta.
    pub beta_seed: f64,
    /// Maximum number of bracket doublings.
    pub max_expansions: usize,
    /// Maximum number of bisection steps.
    pub max_iterations: usize,
    /// Wall-clock cap for a single target.
    pub search_timeout: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            beta_seed: DEFAULT_BETA_SEED,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            search_timeout: None,
        }
    }
}

/// A complete, validated-once description of one curve request.
///
/// | field | default |
/// |---|---|
/// | `points` (N) | 10 |
/// | `alpha` | 1 |
/// | `gamma` | 1 |
/// | `delta` | 1e-8 |
/// | `epsilon` | 1e-8 |
/// | `display` | `all` |
/// | `betas` | empty |
#[derive(Debug, Clone, PartialEq)]
pub struct CurveConfig {
    /// Number of equal-width segments along [0, H_gamma(X)]; ignored when
    /// `betas` is non-empty.
    pub points: usize,
    pub alpha: f64,
    pub gamma: f64,
    /// Accepted |Hga - target| for a searched point.
    pub delta: f64,
    /// Convergence threshold handed to the solver.
    pub epsilon: f64,
    pub display: DisplayMode,
    /// Explicit beta values; when non-empty, no search is performed.
    pub betas: Vec<f64>,
    pub search: SearchConfig,
    pub solver: SolverKind,
    /// Wall-clock cap for the whole request.
    pub request_timeout: Option<Duration>,
    /// Worker threads for independent searches (None = available cores).
    pub workers: Option<usize>,
}

impl Default for CurveConfig {
    fn default() -> Self {
        CurveConfig {
            points: DEFAULT_POINTS,
            alpha: DEFAULT_ALPHA,
            gamma: DEFAULT_GAMMA,
            delta: DEFAULT_DELTA,
            epsilon: DEFAULT_EPSILON,
            display: DisplayMode::default(),
            betas: Vec::new(),
            search: SearchConfig::default(),
            solver: SolverKind::default(),
            request_timeout: None,
            workers: None,
        }
    }
}

impl CurveConfig {
    /// Set the number of segments.
    pub fn with_points(mut self, points: usize) -> Self {
        self.points = points;
        self
    }

    /// Set alpha and gamma together.
    pub fn with_alpha_gamma(mut self, alpha: f64, gamma: f64) -> Self {
        self.alpha = alpha;
        self.gamma = gamma;
        self
    }

    /// Use explicit betas instead of a partition.
    pub fn with_betas(mut self, betas: Vec<f64>) -> Self {
        self.betas = betas;
        self
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Resolved worker count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Check every parameter; see [`validate_config`].
    pub fn validate(&self) -> CurveResult<()> {
        validate_config(self)
    }

    /// Defaults overlaid with a config file.
    pub fn load(path: &Path) -> CurveResult<Self> {
        let mut config = CurveConfig::default();
        config.apply(ConfigFile::load(path)?)?;
        Ok(config)
    }

    /// Overlay every value present in `file`.
    pub fn apply(&mut self, file: ConfigFile) -> CurveResult<()> {
        if let Some(points) = file.points {
            self.points = points;
        }
        if let Some(alpha) = file.alpha {
            self.alpha = alpha;
        }
        if let Some(gamma) = file.gamma {
            self.gamma = gamma;
        }
        if let Some(delta) = file.delta {
            self.delta = delta;
        }
        if let Some(epsilon) = file.epsilon {
            self.epsilon = epsilon;
        }
        if let Some(display) = file.display {
            self.display = display.parse()?;
        }
        if let Some(betas) = file.betas {
            self.betas = betas;
        }
        if let Some(solver) = file.solver {
            self.solver = solver.parse()?;
        }
        if let Some(seed) = file.beta_seed {
            self.search.beta_seed = seed;
        }
        if let Some(n) = file.max_expansions {
            self.search.max_expansions = n;
        }
        if let Some(n) = file.max_iterations {
            self.search.max_iterations = n;
        }
        if let Some(secs) = file.search_timeout_secs {
            self.search.search_timeout = Some(duration_from_secs("search_timeout_secs", secs)?);
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Some(duration_from_secs("request_timeout_secs", secs)?);
        }
        if let Some(workers) = file.workers {
            self.workers = Some(workers);
        }
        Ok(())
    }
}

/// Convert a seconds value from a file or flag into a [`Duration`].
pub fn duration_from_secs(field: &str, secs: f64) -> CurveResult<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| CurveError::invalid(field, format!("must be a non-negative number of seconds, got {secs}")))
}

/// On-disk configuration: every field optional, overlaid on the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub points: Option<usize>,
    pub alpha: Option<f64>,
    pub gamma: Option<f64>,
    pub delta: Option<f64>,
    pub epsilon: Option<f64>,
    pub display: Option<String>,
    pub betas: Option<Vec<f64>>,
    pub solver: Option<String>,
    pub beta_seed: Option<f64>,
    pub max_expansions: Option<usize>,
    pub max_iterations: Option<usize>,
    pub search_timeout_secs: Option<f64>,
    pub request_timeout_secs: Option<f64>,
    pub workers: Option<usize>,
}

impl ConfigFile {
    /// Load from `.toml` or `.json` (chosen by extension; TOML otherwise).
    pub fn load(path: &Path) -> CurveResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CurveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| CurveError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_table() {
        let config = CurveConfig::default();
        assert_eq!(config.points, 10);
        assert_eq!(config.alpha, 1.0);
        assert_eq!(config.gamma, 1.0);
        assert_eq!(config.delta, 1e-8);
        assert_eq!(config.epsilon, 1e-8);
        assert_eq!(config.display, DisplayMode::All);
        assert!(config.betas.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn display_mode_parse_and_planes() {
        assert_eq!("DIB".parse::<DisplayMode>().unwrap(), DisplayMode::Dib);
        assert_eq!(DisplayMode::All.planes().len(), 3);
        assert!(DisplayMode::None.planes().is_empty());
        assert_eq!(DisplayMode::Gib.planes(), &[InformationPlane::Gib]);
        assert_eq!(DisplayMode::Ib.to_string(), "ib");
    }

    #[test]
    fn unknown_display_is_invalid_parameter() {
        let err = "plot".parse::<DisplayMode>().unwrap_err();
        match err {
            CurveError::InvalidParameter { field, .. } => assert_eq!(field, "display"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_toml_overlays_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "points = 4\ngamma = 2.0\ndisplay = \"dib\"\nrequest_timeout_secs = 1.5"
        )
        .unwrap();
        let config = CurveConfig::load(file.path()).unwrap();
        assert_eq!(config.points, 4);
        assert_eq!(config.gamma, 2.0);
        assert_eq!(config.alpha, 1.0);
        assert_eq!(config.display, DisplayMode::Dib);
        assert_eq!(config.request_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn load_json_betas() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"betas": [0.5, 2.0], "workers": 2}}"#).unwrap();
        let config = CurveConfig::load(file.path()).unwrap();
        assert_eq!(config.betas, vec![0.5, 2.0]);
        assert_eq!(config.worker_count(), 2);
    }

    #[test]
    fn unknown_fields_are_parse_errors() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "pionts = 4").unwrap();
        assert!(matches!(
            CurveConfig::load(file.path()),
            Err(CurveError::Parse { .. })
        ));
    }

    #[test]
    fn bad_display_in_file_is_invalid_parameter() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "display = \"3d\"").unwrap();
        assert!(matches!(
            CurveConfig::load(file.path()),
            Err(CurveError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn negative_timeout_rejected() {
        assert!(duration_from_secs("t", -1.0).is_err());
        assert!(duration_from_secs("t", f64::NAN).is_err());
        assert_eq!(duration_from_secs("t", 2.0).unwrap(), Duration::from_secs(2));
    }
}
