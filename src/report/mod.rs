//! Reporting: the text report of a fit and terminal summaries.

pub mod format;

pub use format::*;

use std::path::Path;

use crate::domain::FitResult;
use crate::error::{PolError, Result};

/// Write the text report of `result` to `path`.
pub fn save_to_txt(path: &Path, result: &FitResult) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| PolError::io(format!("failed to create '{}'", parent.display()), e))?;
    }
    std::fs::write(path, format_fit_report(result))
        .map_err(|e| PolError::io(format!("failed to write report '{}'", path.display()), e))
}
