//! `polcurve-fit` library crate.
//!
//! Fits electrochemical polarization curves with a Tafel line, an
//! activation-control model, or a mixed activation-diffusion model, and
//! measures how sensitive the mixed fit is to its weighting settings.
//!
//! The binary (`polfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fit entry points can be called directly from other Rust code

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
