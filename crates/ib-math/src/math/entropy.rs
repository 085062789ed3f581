//! Shannon and Renyi entropies of discrete distributions, in bits.
//!
//! Inputs are assumed to be normalized; zero-probability outcomes contribute
//! nothing (0 log 0 = 0).

use super::distribution::Matrix;
use super::stable::xlog2x;

/// Orders within this distance of 1 are evaluated as Shannon entropy.
const RENYI_SHANNON_EPS: f64 = 1e-12;

/// Shannon entropy H(P) = -Σ p log2 p.
pub fn shannon_entropy(p: &[f64]) -> f64 {
    let h: f64 = -p.iter().map(|&v| xlog2x(v)).sum::<f64>();
    // -0.0 for point masses reads badly downstream
    h.max(0.0)
}

/// Renyi entropy of order `gamma`.
///
/// `H_γ(P) = log2(Σ p^γ) / (1 - γ)`, with the limits γ=0 (Hartley: log2 of
/// the support size), γ=1 (Shannon) and γ=∞ (min-entropy: -log2 max p).
/// Returns NaN for negative or NaN orders.
pub fn renyi_entropy(p: &[f64], gamma: f64) -> f64 {
    if gamma.is_nan() || gamma < 0.0 {
        return f64::NAN;
    }
    if (gamma - 1.0).abs() < RENYI_SHANNON_EPS {
        return shannon_entropy(p);
    }
    if gamma == f64::INFINITY {
        let max = p.iter().cloned().fold(0.0, f64::max);
        if max <= 0.0 {
            return 0.0;
        }
        return (-max.log2()).max(0.0);
    }
    if gamma == 0.0 {
        let support = p.iter().filter(|&&v| v > 0.0).count();
        if support == 0 {
            return 0.0;
        }
        return (support as f64).log2();
    }
    let power_sum: f64 = p.iter().filter(|&&v| v > 0.0).map(|&v| v.powf(gamma)).sum();
    if power_sum <= 0.0 {
        return 0.0;
    }
    (power_sum.log2() / (1.0 - gamma)).max(0.0)
}

/// Conditional entropy H(B|A) = Σ_a p(a) H(P(·|a)).
///
/// `conditional` holds one row per value of A; `marginal` is P(A).
pub fn conditional_entropy(conditional: &Matrix, marginal: &[f64]) -> f64 {
    conditional
        .iter_rows()
        .zip(marginal)
        .filter(|(_, &pa)| pa > 0.0)
        .map(|(row, &pa)| pa * shannon_entropy(row))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn shannon_known_values() {
        assert!(approx_eq(shannon_entropy(&[0.5, 0.5]), 1.0, 1e-12));
        assert!(approx_eq(shannon_entropy(&[0.25; 4]), 2.0, 1e-12));
        assert_eq!(shannon_entropy(&[1.0, 0.0]), 0.0);
        assert!(shannon_entropy(&[1.0]).is_sign_positive());
    }

    #[test]
    fn renyi_of_uniform_is_log_support() {
        let p = [0.125; 8];
        for gamma in [0.0, 0.5, 1.0, 2.0, 7.5, f64::INFINITY] {
            assert!(approx_eq(renyi_entropy(&p, gamma), 3.0, 1e-10), "gamma={gamma}");
        }
    }

    #[test]
    fn renyi_order_two_is_collision_entropy() {
        let p = [0.75, 0.25];
        let expected = -(0.75f64 * 0.75 + 0.25 * 0.25).log2();
        assert!(approx_eq(renyi_entropy(&p, 2.0), expected, 1e-12));
    }

    #[test]
    fn renyi_near_one_matches_shannon() {
        let p = [0.6, 0.3, 0.1];
        let h = shannon_entropy(&p);
        assert!(approx_eq(renyi_entropy(&p, 1.0 + 1e-7), h, 1e-5));
        assert!(approx_eq(renyi_entropy(&p, 1.0 - 1e-7), h, 1e-5));
    }

    #[test]
    fn renyi_limits() {
        let p = [0.5, 0.25, 0.25, 0.0];
        assert!(approx_eq(renyi_entropy(&p, 0.0), 3.0f64.log2(), 1e-12));
        assert!(approx_eq(renyi_entropy(&p, f64::INFINITY), 1.0, 1e-12));
        assert!(renyi_entropy(&p, -1.0).is_nan());
        assert!(renyi_entropy(&p, f64::NAN).is_nan());
    }

    #[test]
    fn conditional_entropy_weights_rows() {
        let cond = Matrix::from_rows(vec![vec![0.5, 0.5], vec![1.0, 0.0]]).unwrap();
        let h = conditional_entropy(&cond, &[0.5, 0.5]);
        assert!(approx_eq(h, 0.5, 1e-12));
    }
}
