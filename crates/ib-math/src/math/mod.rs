//! Core math modules.

pub mod distribution;
pub mod entropy;
pub mod information;
pub mod stable;
