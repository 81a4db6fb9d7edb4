//! Input/output helpers.
//!
//! - CSV ingest of measured curves (`ingest`)
//! - sweep table exports (`export`)
//! - fit JSON read/write (`curve`)

pub mod curve;
pub mod export;
pub mod ingest;

pub use curve::*;
pub use export::*;
pub use ingest::*;
