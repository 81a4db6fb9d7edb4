//! Near-corrosion weight distribution for the mixed fit.
//!
//! The returned vector is used as the solver's per-point `sigma`: residual
//! `k` is divided by `sigma[k]`. Points with `|E − E_corr| ≤ w_ac` get
//!
//! ```text
//! sigma = (100 − W)/W · n_near/(n_total − n_near)
//! ```
//!
//! and every other point gets exactly `1`, so the near-corrosion region ends
//! up carrying roughly `W` percent of the total weight regardless of how
//! densely it was sampled.

use crate::error::{PolError, Result};
use crate::fit::window_count;

/// Per-point sigma for the windowed potentials `e`.
///
/// Fails with [`PolError::DegenerateWeight`] when the formula would divide by
/// zero or produce non-positive sigma: `W ≤ 0`, `W ≥ 100`, or every point of
/// the window lying within `w_ac` of `e_corr`. With no near points at all
/// the scheme has nothing to redistribute and every sigma is `1`.
pub fn weight_distribution(e: &[f64], e_corr: f64, w_ac: f64, w_percent: f64) -> Result<Vec<f64>> {
    let n_total = e.len();
    let n_near = window_count(e, e_corr, [-w_ac, w_ac]);

    let degenerate = |reason: &'static str| PolError::DegenerateWeight {
        w_ac,
        w_percent,
        n_near,
        n_total,
        reason,
    };

    if !(w_percent > 0.0) {
        return Err(degenerate("W must be > 0 %"));
    }
    if w_percent >= 100.0 {
        return Err(degenerate("W must be < 100 %"));
    }
    if n_near == 0 {
        return Ok(vec![1.0; n_total]);
    }
    if n_near == n_total {
        return Err(degenerate("the activation-control window covers the whole fit window"));
    }

    let near_sigma = (100.0 - w_percent) / w_percent * (n_near as f64 / (n_total - n_near) as f64);

    Ok(e
        .iter()
        .map(|&ev| {
            let offset = ev - e_corr;
            if -w_ac <= offset && offset <= w_ac {
                near_sigma
            } else {
                1.0
            }
        })
        .collect())
}
