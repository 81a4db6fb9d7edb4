//! Sensitivity of the mixed fit to its weighting parameters.
//!
//! For every `(w_ac, W, w_c)` combination with `w_c < −w_ac` the mixed fit is
//! run on the window `[w_c, window[1]]` (unweighted when `W = 0`). The fitted
//! cathodic slope and limiting current are tabulated, and for each
//! `(w_ac, W)` the spread of `b_c` over the cathodic windows beyond `w_dc`
//! measures how stable that weighting choice is.
//!
//! Failed combinations are logged and skipped; the sweep itself only fails
//! on invalid settings, before any fit is attempted.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{
    MixedFitOptions, PolarizationCurve, SensitivityReport, SensitivityRow, StabilityRow,
    SweepConfig, WeightSettings, WeightVariability,
};
use crate::error::{PolError, Result};
use crate::fit::fitter::check_guess;
use crate::fit::mixed_pol_fit;
use crate::math::{arange, mean, round_to, sample_std};

/// The grid a sweep runs over.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRanges {
    pub w_percent: Vec<f64>,
    pub w_ac: Vec<f64>,
    pub window_cathodic: Vec<f64>,
}

/// Resolve the `(W, w_ac, w_c)` grid of a sweep.
///
/// - `w_ac` defaults to `dw_ac, 2·dw_ac, ...` below `round(|w_dc/2| + dw_ac, 2)`
/// - `w_c` defaults to `w_dc, w_dc − dw_c, ...` above `round(window[0] − dw_c, 2)`
pub fn sweep_ranges(config: &SweepConfig) -> Result<SweepRanges> {
    let w_ac = match &config.w_ac {
        Some(values) => values.clone(),
        None => {
            if !(config.dw_ac.is_finite() && config.dw_ac > 0.0) {
                return Err(PolError::validation(
                    "dw_ac, the increment of the activation-control window, must be > 0 [V]",
                ));
            }
            arange(
                config.dw_ac,
                round_to((0.5 * config.w_dc).abs() + config.dw_ac, 2),
                config.dw_ac,
            )
        }
    };

    let window_cathodic = match &config.window_cathodic {
        Some(values) => values.clone(),
        None => {
            if !(config.dw_c.is_finite() && config.dw_c > 0.0) {
                return Err(PolError::validation(
                    "dw_c, the increment of the sweep of the cathodic window, must be > 0 [V]",
                ));
            }
            arange(
                config.w_dc,
                round_to(config.window[0] - config.dw_c, 2),
                -config.dw_c,
            )
        }
    };

    if config.w_percent.iter().any(|w| !(0.0..=100.0).contains(w)) {
        return Err(PolError::validation("Values for W should be in the range of 0-100 %"));
    }
    if w_ac.iter().any(|w| !(*w >= 0.0)) {
        return Err(PolError::validation("Values for w_ac should be larger than 0"));
    }
    if window_cathodic.iter().any(|w| !w.is_finite()) {
        return Err(PolError::validation("Values for the cathodic window must be finite"));
    }

    Ok(SweepRanges {
        w_percent: config.w_percent.clone(),
        w_ac,
        window_cathodic,
    })
}

/// Run the sensitivity sweep of the mixed fit.
pub fn sens_analysis(curve: &PolarizationCurve, config: &SweepConfig) -> Result<SensitivityReport> {
    validate(curve, config)?;
    let ranges = sweep_ranges(config)?;

    let mean_i = curve.mean_current_density();
    let i_corr_guess = config.i_corr_guess.unwrap_or(mean_i);
    let i_l_guess = config.i_l_guess.unwrap_or(mean_i);

    let mut combos = Vec::new();
    for &w_ac in &ranges.w_ac {
        for &w_percent in &ranges.w_percent {
            for &window_cat in &ranges.window_cathodic {
                if -w_ac > window_cat {
                    combos.push((w_ac, w_percent, window_cat));
                }
            }
        }
    }
    info!(
        combinations = combos.len(),
        w_ac = ranges.w_ac.len(),
        w = ranges.w_percent.len(),
        w_c = ranges.window_cathodic.len(),
        "running sensitivity sweep"
    );

    // Each fit is independent; collect keeps the sequential order.
    let outcomes: Vec<Option<SensitivityRow>> = combos
        .par_iter()
        .map(|&(w_ac, w_percent, window_cat)| {
            let opts = MixedFitOptions {
                window: [window_cat, config.window[1]],
                i_corr_guess: Some(i_corr_guess),
                i_l_guess: Some(i_l_guess),
                fix_i_l: config.fix_i_l,
                weighting: (w_percent != 0.0).then_some(WeightSettings { w_ac, w_percent }),
                e_rev: None,
            };
            match mixed_pol_fit(curve, &opts) {
                Ok(fit) => Some(SensitivityRow {
                    w_ac,
                    w_percent,
                    window_cathodic: window_cat,
                    b_cathodic: fit.cathodic_tafel_slope().unwrap_or(f64::NAN),
                    i_l: fit.i_l().unwrap_or(f64::NAN),
                }),
                Err(err) => {
                    warn!(
                        w_percent,
                        w_ac,
                        window_cathodic = window_cat,
                        error = %err,
                        "no fit found, combination skipped"
                    );
                    None
                }
            }
        })
        .collect();

    let skipped = outcomes.iter().filter(|o| o.is_none()).count();
    let rows: Vec<SensitivityRow> = outcomes.into_iter().flatten().collect();

    let stability = stability_table(&rows, &ranges, config.w_dc);
    let by_weight = variability_by_weight(&stability, &ranges.w_percent);

    info!(fitted = rows.len(), skipped, "sensitivity sweep finished");

    Ok(SensitivityReport {
        window: config.window,
        w_dc: config.w_dc,
        w_ac: ranges.w_ac,
        w_percent: ranges.w_percent,
        window_cathodic: ranges.window_cathodic,
        rows,
        stability,
        by_weight,
        skipped,
    })
}

fn validate(curve: &PolarizationCurve, config: &SweepConfig) -> Result<()> {
    if !config.w_dc.is_finite() || config.w_dc >= 0.0 {
        return Err(PolError::validation(format!(
            "w_dc, the start of the diffusion controlled domain, should be negative [V vs E_corr] (got {})",
            config.w_dc
        )));
    }
    if !(config.dw_c >= 0.0) {
        return Err(PolError::validation(
            "dw_c, the increment of the sweep of the cathodic window, should be positive [V]",
        ));
    }
    if !(config.window[0].is_finite() && config.window[1].is_finite()) {
        return Err(PolError::validation("The sweep window must be finite"));
    }

    let mean_i = curve.mean_current_density();
    check_guess(curve, "i_corr_guess", config.i_corr_guess.unwrap_or(mean_i))?;
    check_guess(curve, "i_L_guess", config.i_l_guess.unwrap_or(mean_i))?;
    Ok(())
}

/// Sample std of `b_c` over `w_c < w_dc`, per `(w_ac, W)`.
pub fn stability_table(rows: &[SensitivityRow], ranges: &SweepRanges, w_dc: f64) -> Vec<StabilityRow> {
    let mut out = Vec::with_capacity(ranges.w_ac.len() * ranges.w_percent.len());
    for &w_ac in &ranges.w_ac {
        for &w_percent in &ranges.w_percent {
            let b_c: Vec<f64> = rows
                .iter()
                .filter(|r| r.window_cathodic < w_dc && r.w_ac == w_ac && r.w_percent == w_percent)
                .map(|r| r.b_cathodic)
                .collect();
            let std_dev = sample_std(&b_c);
            debug!(w_ac, w_percent, samples = b_c.len(), ?std_dev, "stability");
            out.push(StabilityRow {
                w_ac,
                w_percent,
                std_dev,
            });
        }
    }
    out
}

/// Mean and sample std of the available per-`w_ac` deviations, per `W`.
pub fn variability_by_weight(stability: &[StabilityRow], w_percent: &[f64]) -> Vec<WeightVariability> {
    w_percent
        .iter()
        .map(|&w| {
            let values: Vec<f64> = stability
                .iter()
                .filter(|s| s.w_percent == w)
                .filter_map(|s| s.std_dev)
                .collect();
            WeightVariability {
                w_percent: w,
                mean: mean(&values),
                std_dev: sample_std(&values),
            }
        })
        .collect()
}
