//! Turns a request into concrete work: search targets or explicit betas.

use crate::config::CurveConfig;

/// What the search engine has to resolve.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Interior horizontal-axis targets `k * Hgx / N` for k = 1..N-1.
    Targets(Vec<f64>),
    /// Explicit betas, ascending.
    Betas(Vec<f64>),
}

impl Plan {
    pub fn len(&self) -> usize {
        match self {
            Plan::Targets(v) | Plan::Betas(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the plan for `config` given the horizontal-axis ceiling `hgx`.
///
/// Explicit betas win over `points`. The k=0 and k=N boundaries are the
/// analytic endpoints and never become targets. A zero-width axis has no
/// interior.
pub fn plan(config: &CurveConfig, hgx: f64) -> Plan {
    if !config.betas.is_empty() {
        let mut betas = config.betas.clone();
        betas.sort_by(f64::total_cmp);
        return Plan::Betas(betas);
    }

    if hgx <= 0.0 {
        return Plan::Targets(Vec::new());
    }

    let n = config.points;
    let targets = (1..n).map(|k| k as f64 * hgx / n as f64).collect();
    Plan::Targets(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_boundaries_only() {
        let config = CurveConfig::default().with_points(4);
        assert_eq!(plan(&config, 1.0), Plan::Targets(vec![0.25, 0.5, 0.75]));
    }

    #[test]
    fn single_segment_has_no_targets() {
        let config = CurveConfig::default().with_points(1);
        assert!(plan(&config, 2.0).is_empty());
    }

    #[test]
    fn explicit_betas_sorted_and_points_ignored() {
        let config = CurveConfig::default()
            .with_points(7)
            .with_betas(vec![3.0, f64::INFINITY, 0.5, 0.0]);
        assert_eq!(
            plan(&config, 1.0),
            Plan::Betas(vec![0.0, 0.5, 3.0, f64::INFINITY])
        );
    }

    #[test]
    fn flat_axis_has_no_targets() {
        let config = CurveConfig::default();
        assert!(plan(&config, 0.0).is_empty());
    }
}
