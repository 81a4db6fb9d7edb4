//! Polarization-curve forward models.
//!
//! Models are implemented as small, pure functions so that the fitting code can
//! stay generic over them.

pub mod model;

pub use model::*;
