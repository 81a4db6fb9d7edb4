//! Read/write fit JSON files.
//!
//! A fit file is the portable form of one [`FitResult`]: the fitted
//! parameters (current densities in log10 space), the fit window's modeled
//! curve, plus a little provenance.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::FitResult;
use crate::error::{PolError, Result};

/// On-disk wrapper around a [`FitResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub created_at: DateTime<Utc>,
    pub resistance: f64,
    pub sample_surface: f64,
    pub result: FitResult,
}

impl FitFile {
    pub fn new(result: FitResult, resistance: f64, sample_surface: f64) -> Self {
        Self {
            tool: "polfit".to_string(),
            created_at: Utc::now(),
            resistance,
            sample_surface,
            result,
        }
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, fit: &FitFile) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| PolError::io(format!("failed to create fit JSON '{}'", path.display()), e))?;
    serde_json::to_writer_pretty(file, fit)
        .map_err(|e| PolError::json(format!("failed to write fit JSON '{}'", path.display()), e))?;
    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile> {
    let file = File::open(path)
        .map_err(|e| PolError::io(format!("failed to open fit JSON '{}'", path.display()), e))?;
    serde_json::from_reader(file)
        .map_err(|e| PolError::json(format!("invalid fit JSON '{}'", path.display()), e))
}
