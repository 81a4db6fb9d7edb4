//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - the normalized measurement (`PolarizationCurve`)
//! - fit options and outputs (`FitResult`, `MixedFitOptions`, etc.)
//! - sensitivity-sweep settings and tables (`SweepConfig`, `SensitivityReport`)

pub mod curve;
pub mod types;

pub use curve::*;
pub use types::*;
