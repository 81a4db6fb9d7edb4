//! Shared domain types.
//!
//! These types are kept serializable so they can be:
//!
//! - returned from the fit entry points
//! - exported to JSON / tab-separated text
//! - reloaded later for plotting or reports

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::math::from_log10;

/// Which fitting technique produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FitKind {
    /// Tafel line through one branch.
    Linear,
    /// Activation control on both branches.
    Activation,
    /// Mixed activation–diffusion control.
    Mixed,
}

impl FitKind {
    pub fn display_name(self) -> &'static str {
        match self {
            FitKind::Linear => "linear fit",
            FitKind::Activation => "activation control fit",
            FitKind::Mixed => "mixed diffusion-activation control fit",
        }
    }
}

/// The model evaluated at the fit window's potentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitCurve {
    pub potential: Vec<f64>,
    pub current: Vec<f64>,
}

/// Near-corrosion weighting applied to a mixed fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSettings {
    /// Half-width of the activation-control window around `E_corr` [V].
    pub w_ac: f64,
    /// Target weight percentage `W` [%].
    pub w_percent: f64,
}

/// Outcome of one fit.
///
/// Current densities are stored as base-10 logarithms, the space the solver
/// works in; the accessors convert them back to linear units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub kind: FitKind,
    pub fit_curve: FitCurve,
    /// Corrosion potential [V vs ref].
    pub e_corr: f64,
    pub log_i_corr: f64,
    /// Anodic Tafel slope [V/dec].
    ///
    /// For [`FitKind::Linear`] this is the signed slope `b = 1/slope` of the
    /// fitted line, negative on a cathodic branch.
    pub b_anodic: f64,
    /// Cathodic Tafel slope magnitude [V/dec]; reported negated.
    pub b_cathodic: Option<f64>,
    pub log_i_l: Option<f64>,
    pub gamma: Option<f64>,
    /// Root-mean-squared error in linear current units over the fit window.
    pub rmse: f64,
    /// log10 of the anodic exchange current density (the single `io` of a
    /// linear fit lives here too).
    pub log_io_anodic: Option<f64>,
    pub log_io_cathodic: Option<f64>,
    pub weighting: Option<WeightSettings>,
}

impl FitResult {
    /// Corrosion current density `10^log_i_corr`.
    pub fn i_corr(&self) -> f64 {
        from_log10(self.log_i_corr)
    }

    /// Tafel slope of a linear fit (same as `b_anodic`).
    pub fn tafel_slope(&self) -> f64 {
        self.b_anodic
    }

    /// Cathodic Tafel slope with the physical sign (negative).
    pub fn cathodic_tafel_slope(&self) -> Option<f64> {
        self.b_cathodic.map(|b| -b)
    }

    /// Limiting current density `10^log_i_l`.
    pub fn i_l(&self) -> Option<f64> {
        self.log_i_l.map(from_log10)
    }

    pub fn io_anodic(&self) -> Option<f64> {
        self.log_io_anodic.map(from_log10)
    }

    pub fn io_cathodic(&self) -> Option<f64> {
        self.log_io_cathodic.map(from_log10)
    }
}

/// Options of the linear (Tafel) fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFitOptions {
    /// `[low, high]` in absolute potential [V vs ref].
    pub window: [f64; 2],
    /// Corrosion potential at which the fitted line is evaluated.
    pub e_corr: f64,
    /// Reversible potential for the exchange current; `None` skips it.
    pub e_rev: Option<f64>,
}

impl LinearFitOptions {
    pub fn new(window: [f64; 2]) -> Self {
        Self {
            window,
            e_corr: 0.0,
            e_rev: None,
        }
    }
}

/// Options of the activation-control fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveFitOptions {
    /// `[low, high]` relative to `E_corr` [V].
    pub window: [f64; 2],
    /// Initial guess for `i_corr`; defaults to the mean current density.
    pub i_corr_guess: Option<f64>,
    /// `(E_rev_an, E_rev_cath)`; `None` skips the exchange currents.
    pub e_rev: Option<(f64, f64)>,
}

impl ActiveFitOptions {
    pub fn new(window: [f64; 2]) -> Self {
        Self {
            window,
            i_corr_guess: None,
            e_rev: None,
        }
    }
}

/// Options of the mixed activation–diffusion fit.
#[derive(Debug, Clone, PartialEq)]
pub struct MixedFitOptions {
    /// `[low, high]` relative to `E_corr` [V].
    pub window: [f64; 2],
    pub i_corr_guess: Option<f64>,
    pub i_l_guess: Option<f64>,
    /// Pin `log10 i_L` to `log10|i_l_guess| ± 0.01`.
    pub fix_i_l: bool,
    /// Near-corrosion weighting; `None` fits every point with unit sigma.
    pub weighting: Option<WeightSettings>,
    pub e_rev: Option<(f64, f64)>,
}

impl MixedFitOptions {
    pub const DEFAULT_W_AC: f64 = 0.04;
    pub const DEFAULT_W: f64 = 75.0;

    pub fn new(window: [f64; 2]) -> Self {
        Self {
            window,
            i_corr_guess: None,
            i_l_guess: None,
            fix_i_l: false,
            weighting: None,
            e_rev: None,
        }
    }

    /// Enable weighting with the usual `w_ac = 0.04 V`, `W = 75 %`.
    pub fn with_default_weighting(mut self) -> Self {
        self.weighting = Some(WeightSettings {
            w_ac: Self::DEFAULT_W_AC,
            w_percent: Self::DEFAULT_W,
        });
        self
    }
}

/// Settings of the sensitivity sweep.
///
/// Empty `w_ac` / `window_cathodic` lists are generated from `w_dc` and the
/// step sizes (see [`crate::fit::sweep_ranges`]).
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// `[low, high]` relative to `E_corr` [V]; `high` is kept for every fit.
    pub window: [f64; 2],
    /// Start of the diffusion-controlled domain, relative to `E_corr` (< 0).
    pub w_dc: f64,
    pub dw_c: f64,
    pub dw_ac: f64,
    /// Weight percentages; `0` means an unweighted fit.
    pub w_percent: Vec<f64>,
    pub w_ac: Option<Vec<f64>>,
    pub window_cathodic: Option<Vec<f64>>,
    pub i_corr_guess: Option<f64>,
    pub i_l_guess: Option<f64>,
    pub fix_i_l: bool,
}

impl SweepConfig {
    /// `[50, 55, ..., 95, 0]`.
    pub fn default_w_percent() -> Vec<f64> {
        let mut w: Vec<f64> = (0..10).map(|k| 50.0 + 5.0 * k as f64).collect();
        w.push(0.0);
        w
    }

    pub fn new(window: [f64; 2], w_dc: f64) -> Self {
        Self {
            window,
            w_dc,
            dw_c: 0.01,
            dw_ac: 0.01,
            w_percent: Self::default_w_percent(),
            w_ac: None,
            window_cathodic: None,
            i_corr_guess: None,
            i_l_guess: None,
            fix_i_l: false,
        }
    }
}

/// One successful fit of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub w_ac: f64,
    pub w_percent: f64,
    pub window_cathodic: f64,
    /// Cathodic Tafel slope with the physical sign (negative).
    pub b_cathodic: f64,
    /// Limiting current density (linear units).
    pub i_l: f64,
}

/// Variability of `b_c` in the diffusion-dominated regime for one `(w_ac, W)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityRow {
    pub w_ac: f64,
    pub w_percent: f64,
    /// Sample standard deviation; `None` with fewer than two samples.
    pub std_dev: Option<f64>,
}

/// Mean and spread of the per-`w_ac` standard deviations for one `W`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVariability {
    pub w_percent: f64,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

/// Full output of a sensitivity sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub window: [f64; 2],
    pub w_dc: f64,
    /// The parameter grid actually swept.
    pub w_ac: Vec<f64>,
    pub w_percent: Vec<f64>,
    pub window_cathodic: Vec<f64>,
    pub rows: Vec<SensitivityRow>,
    pub stability: Vec<StabilityRow>,
    pub by_weight: Vec<WeightVariability>,
    /// Combinations attempted but skipped because the fit failed.
    pub skipped: usize,
}

impl SensitivityReport {
    /// Rows for one `(w_ac, W)` pair, in cathodic-window order.
    pub fn rows_for(&self, w_ac: f64, w_percent: f64) -> impl Iterator<Item = &SensitivityRow> {
        self.rows
            .iter()
            .filter(move |r| r.w_ac == w_ac && r.w_percent == w_percent)
    }

    pub fn stability_for(&self, w_ac: f64, w_percent: f64) -> Option<f64> {
        self.stability
            .iter()
            .find(|s| s.w_ac == w_ac && s.w_percent == w_percent)
            .and_then(|s| s.std_dev)
    }
}
