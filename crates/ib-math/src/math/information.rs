//! Divergences and mutual information.

use super::distribution::Matrix;
use super::stable::nats_to_bits;

/// KL divergence D(P || Q) in nats.
///
/// Returns +inf when P puts mass where Q has none, and NaN on length mismatch.
pub fn kl_divergence_nats(p: &[f64], q: &[f64]) -> f64 {
    if p.len() != q.len() {
        return f64::NAN;
    }
    let mut total = 0.0;
    for (&pi, &qi) in p.iter().zip(q) {
        if pi <= 0.0 {
            continue;
        }
        if qi <= 0.0 {
            return f64::INFINITY;
        }
        total += pi * (pi / qi).ln();
    }
    total.max(0.0)
}

/// KL divergence D(P || Q) in bits.
pub fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    nats_to_bits(kl_divergence_nats(p, q))
}

/// Mutual information I(A;B) in bits from P(B|A) and P(A).
///
/// `conditional` holds one row per value of A. Computed as
/// `Σ_a p(a) D(P(B|a) || P(B))` with `P(B) = Σ_a p(a) P(B|a)`.
pub fn mutual_information(conditional: &Matrix, marginal: &[f64]) -> f64 {
    if conditional.rows() != marginal.len() {
        return f64::NAN;
    }
    let mut pb = vec![0.0; conditional.cols()];
    for (row, &pa) in conditional.iter_rows().zip(marginal) {
        for (acc, &v) in pb.iter_mut().zip(row) {
            *acc += pa * v;
        }
    }
    let info: f64 = conditional
        .iter_rows()
        .zip(marginal)
        .filter(|(_, &pa)| pa > 0.0)
        .map(|(row, &pa)| pa * kl_divergence(row, &pb))
        .sum();
    info.max(0.0)
}
