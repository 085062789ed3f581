//! Information bottleneck math utilities.
//!
//! All entropies and informations are reported in bits.

pub mod math;

pub use math::distribution::{conditional_rows, marginal, normalize, normalize_matrix, Axis, Matrix};
pub use math::entropy::{conditional_entropy, renyi_entropy, shannon_entropy};
pub use math::information::{kl_divergence, kl_divergence_nats, mutual_information};
pub use math::stable::*;
