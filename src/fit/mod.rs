//! Curve fitting.
//!
//! Responsibilities:
//!
//! - cut the fit window out of a curve
//! - build the near-corrosion weight distribution
//! - run the linear, activation-control and mixed-control fits
//! - sweep the mixed fit over its weighting parameters

pub mod fitter;
pub mod sweep;
pub mod weights;
pub mod window;

pub use fitter::*;
pub use sweep::*;
pub use weights::*;
pub use window::*;
