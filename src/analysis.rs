//! A stateful analysis session around one polarization curve.
//!
//! The fit entry points in [`crate::fit`] are pure; `Analysis` adds the
//! bookkeeping a workflow needs: it remembers the last fit and the last
//! sensitivity sweep so reports and figures can be produced afterwards.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::{
    ActiveFitOptions, FitResult, LinearFitOptions, MixedFitOptions, PolarizationCurve,
    SensitivityReport, SweepConfig,
};
use crate::error::{PolError, Result};

const NO_FIT: &str = "No fitting results found. Run one of the fits first.";
const NO_SWEEP: &str = "No results found of the sensitivity analysis. Run the sensitivity analysis first.";

#[derive(Debug, Clone)]
pub struct Analysis {
    curve: PolarizationCurve,
    last_fit: Option<FitResult>,
    last_sweep: Option<SensitivityReport>,
}

impl Analysis {
    /// Build the curve (see [`PolarizationCurve::new`]) and start a session.
    pub fn new(e: &[f64], i: &[f64], resistance: f64, sample_surface: f64) -> Result<Self> {
        Ok(Self::from_curve(PolarizationCurve::new(e, i, resistance, sample_surface)?))
    }

    pub fn from_curve(curve: PolarizationCurve) -> Self {
        Self {
            curve,
            last_fit: None,
            last_sweep: None,
        }
    }

    pub fn curve(&self) -> &PolarizationCurve {
        &self.curve
    }

    pub fn linear_fit(&mut self, opts: &LinearFitOptions) -> Result<&FitResult> {
        let fit = crate::fit::linear_fit(&self.curve, opts)?;
        Ok(self.last_fit.insert(fit))
    }

    pub fn active_pol_fit(&mut self, opts: &ActiveFitOptions) -> Result<&FitResult> {
        let fit = crate::fit::active_pol_fit(&self.curve, opts)?;
        Ok(self.last_fit.insert(fit))
    }

    pub fn mixed_pol_fit(&mut self, opts: &MixedFitOptions) -> Result<&FitResult> {
        let fit = crate::fit::mixed_pol_fit(&self.curve, opts)?;
        Ok(self.last_fit.insert(fit))
    }

    /// Run the sweep. A failed sweep leaves the previous one in place.
    pub fn sens_analysis(&mut self, config: &SweepConfig) -> Result<&SensitivityReport> {
        let report = crate::fit::sens_analysis(&self.curve, config)?;
        Ok(self.last_sweep.insert(report))
    }

    pub fn last_fit(&self) -> Result<&FitResult> {
        self.last_fit.as_ref().ok_or_else(|| PolError::validation(NO_FIT))
    }

    pub fn last_sweep(&self) -> Result<&SensitivityReport> {
        self.last_sweep
            .as_ref()
            .ok_or_else(|| PolError::validation(NO_SWEEP))
    }

    /// Write the text report of the last fit.
    pub fn save_to_txt(&self, path: &Path) -> Result<()> {
        let fit = self.last_fit()?;
        crate::report::save_to_txt(path, fit)?;
        info!(path = %path.display(), "report written");
        Ok(())
    }

    /// Write the diagnostic figures of the last fit into `dir`.
    pub fn plotting(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let fit = self.last_fit()?;
        let written = crate::plot::plot_fit(dir, &self.curve, fit)?;
        info!(dir = %dir.display(), figures = written.len(), "fit figures written");
        Ok(written)
    }

    /// Write the sweep tables and the stability figures into `dir`.
    pub fn save_sens_analysis(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let report = self.last_sweep()?;
        warn_if_populated(dir);
        crate::io::write_sweep_tables(dir, report)?;
        let mut written = vec![
            dir.join(crate::io::FITTED_PARAMETERS_FILE),
            dir.join(crate::io::VARIABILITY_FILE),
        ];
        written.extend(crate::plot::plot_sweep_variability(dir, report)?);
        info!(dir = %dir.display(), files = written.len(), "sensitivity analysis written");
        Ok(written)
    }

    /// Write `b_c` / `i_L` against the cathodic window for every `W` and `w_ac`.
    pub fn plotting_sens_analysis(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let report = self.last_sweep()?;
        let written = crate::plot::plot_sweep_effects(dir, report)?;
        info!(dir = %dir.display(), figures = written.len(), "sweep figures written");
        Ok(written)
    }
}

fn warn_if_populated(dir: &Path) {
    let populated = std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    if populated {
        warn!(dir = %dir.display(), "output directory is not empty, files will be overwritten");
    }
}
