//! Plotting.
//!
//! - `ascii`: a fixed-size terminal plot of observed vs fitted `log10|i|`
//! - `svg`: diagnostic figures written to disk with Plotters

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;
