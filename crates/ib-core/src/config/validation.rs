//! Parameter and input validation.
//!
//! Every check runs before any numeric work; the first violation is
//! reported as [`CurveError::InvalidParameter`] naming the field.

use std::time::Duration;

use ib_math::Matrix;

use super::CurveConfig;
use crate::error::{CurveError, CurveResult};

/// Allowed deviation of the joint distribution's total mass from 1.
pub const JOINT_MASS_TOLERANCE: f64 = 1e-6;

/// Validate a curve configuration.
pub fn validate_config(config: &CurveConfig) -> CurveResult<()> {
    if config.points == 0 {
        return Err(CurveError::invalid("points", "must be a positive integer, got 0"));
    }

    if !config.alpha.is_finite() || config.alpha < 0.0 {
        return Err(CurveError::invalid(
            "alpha",
            format!("must be finite and >= 0, got {}", config.alpha),
        ));
    }

    // gamma = +inf is the min-entropy limit and stays allowed
    if config.gamma.is_nan() || config.gamma <= 0.0 {
        return Err(CurveError::invalid(
            "gamma",
            format!("must be > 0, got {}", config.gamma),
        ));
    }

    validate_positive_finite("delta", config.delta)?;
    validate_positive_finite("epsilon", config.epsilon)?;

    for (i, &beta) in config.betas.iter().enumerate() {
        if beta.is_nan() || beta < 0.0 {
            return Err(CurveError::invalid(
                format!("betas[{i}]"),
                format!("must be >= 0, got {beta}"),
            ));
        }
    }

    validate_positive_finite("beta_seed", config.search.beta_seed)?;

    if config.search.max_expansions == 0 {
        return Err(CurveError::invalid("max_expansions", "must be >= 1, got 0"));
    }
    if config.search.max_iterations == 0 {
        return Err(CurveError::invalid("max_iterations", "must be >= 1, got 0"));
    }

    validate_timeout("search_timeout", config.search.search_timeout)?;
    validate_timeout("request_timeout", config.request_timeout)?;

    if config.workers == Some(0) {
        return Err(CurveError::invalid("workers", "must be >= 1, got 0"));
    }

    Ok(())
}

/// Validate that a joint distribution holds probabilities.
///
/// The matrix needs at least one row and one column. Entries must be finite
/// and non-negative with total mass within [`JOINT_MASS_TOLERANCE`] of 1.
/// An all-zero matrix passes here and is rejected by preprocessing as
/// degenerate.
pub fn validate_joint(pxy: &Matrix) -> CurveResult<()> {
    if pxy.rows() == 0 || pxy.cols() == 0 {
        return Err(CurveError::invalid(
            "pxy",
            format!("must be a non-empty matrix, got {}x{}", pxy.rows(), pxy.cols()),
        ));
    }

    for r in 0..pxy.rows() {
        for (c, &v) in pxy.row(r).iter().enumerate() {
            if !v.is_finite() || v < 0.0 {
                return Err(CurveError::invalid(
                    format!("pxy[{r}][{c}]"),
                    format!("must be a finite probability >= 0, got {v}"),
                ));
            }
        }
    }

    let total = pxy.sum();
    if total > 0.0 && (total - 1.0).abs() > JOINT_MASS_TOLERANCE {
        return Err(CurveError::invalid(
            "pxy",
            format!("entries must sum to 1, got {total}"),
        ));
    }

    Ok(())
}

fn validate_positive_finite(field: &str, value: f64) -> CurveResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CurveError::invalid(
            field,
            format!("must be finite and > 0, got {value}"),
        ));
    }
    Ok(())
}

fn validate_timeout(field: &str, timeout: Option<Duration>) -> CurveResult<()> {
    if timeout == Some(Duration::ZERO) {
        return Err(CurveError::invalid(field, "must be > 0 when set"));
    }
    Ok(())
}
