//! Numerical utilities: least squares, log-space conversion, and statistics.

pub mod lm;
pub mod logspace;
pub mod ols;
pub mod stats;

pub use lm::*;
pub use logspace::*;
pub use ols::*;
pub use stats::*;
