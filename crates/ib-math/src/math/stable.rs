//! Numerically stable primitives for log-domain probability math.

use std::f64::consts::LN_2;

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// Replace natural-log weights with their normalized probabilities.
///
/// Returns false (leaving `logits` untouched) when every entry is -inf or
/// any entry is NaN, since no distribution can be formed.
pub fn softmax_in_place(logits: &mut [f64]) -> bool {
    let lse = log_sum_exp(logits);
    if !lse.is_finite() {
        return false;
    }
    for v in logits.iter_mut() {
        *v = (*v - lse).exp();
    }
    true
}

/// `p * log2(p)` with the 0 log 0 = 0 convention.
pub fn xlog2x(p: f64) -> f64 {
    if p <= 0.0 {
        0.0
    } else {
        p * p.ln() / LN_2
    }
}

/// Convert nats to bits.
pub fn nats_to_bits(nats: f64) -> f64 {
    nats / LN_2
}
