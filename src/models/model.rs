//! Forward models of a polarization curve.
//!
//! Three families, all parameterized so the fitted current densities live in
//! log10 space:
//!
//! - **Tafel line**: `log10|i| = slope·E + intercept`
//! - **Activation control**:
//!   `i = i_corr·(10^(η/b_a) − 10^(−η/b_c))`, with `η = E − E_corr`
//! - **Mixed activation–diffusion control**: the cathodic term saturates at the
//!   limiting current `i_L` with curvature `γ`:
//!   `i = i_corr·10^(η/b_a) − i_c / (1 + (i_c/i_L)^γ)^(1/γ)`,
//!   `i_c = i_corr·10^(−η/b_c)`
//!
//! Slopes `b_a`, `b_c` are positive magnitudes in V/decade; the cathodic sign
//! convention is applied when results are reported.

use crate::math::from_log10;

/// Stand-in for a modeled current that came out exactly zero.
pub const ZERO_CURRENT_FILL: f64 = 1e-8;

/// Parameters of the mixed activation–diffusion model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixedParams {
    pub log_i_corr: f64,
    pub b_anodic: f64,
    pub b_cathodic: f64,
    pub log_i_l: f64,
    pub gamma: f64,
}

impl MixedParams {
    pub fn from_slice(p: &[f64]) -> Self {
        Self {
            log_i_corr: p[0],
            b_anodic: p[1],
            b_cathodic: p[2],
            log_i_l: p[3],
            gamma: p[4],
        }
    }
}

/// Parameters of the activation-only model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationParams {
    pub log_i_corr: f64,
    pub b_anodic: f64,
    pub b_cathodic: f64,
}

impl ActivationParams {
    pub fn from_slice(p: &[f64]) -> Self {
        Self {
            log_i_corr: p[0],
            b_anodic: p[1],
            b_cathodic: p[2],
        }
    }
}

/// `log10|i|` on a Tafel line.
pub fn tafel_log_current(e: f64, slope: f64, intercept: f64) -> f64 {
    slope * e + intercept
}

/// Current density under pure activation control.
pub fn activation_current(e: f64, e_corr: f64, p: &ActivationParams) -> f64 {
    let i_corr = from_log10(p.log_i_corr);
    let eta = e - e_corr;
    i_corr * (from_log10(eta / p.b_anodic) - from_log10(-eta / p.b_cathodic))
}

/// Current density under mixed activation–diffusion control.
pub fn mixed_current(e: f64, e_corr: f64, p: &MixedParams) -> f64 {
    let i_corr = from_log10(p.log_i_corr);
    let i_l = from_log10(p.log_i_l);
    let eta = e - e_corr;

    let i_anodic = i_corr * from_log10(eta / p.b_anodic);
    let i_cathodic = i_corr * from_log10(-eta / p.b_cathodic);
    let limited = i_cathodic / (1.0 + (i_cathodic / i_l).powf(p.gamma)).powf(1.0 / p.gamma);

    i_anodic - limited
}

/// Replace exact zeros with [`ZERO_CURRENT_FILL`].
pub fn clamp_zero_current(i: f64) -> f64 {
    if i == 0.0 { ZERO_CURRENT_FILL } else { i }
}

/// Evaluate a model over `potentials` and apply the zero clamp.
pub fn reconstruct<F>(potentials: &[f64], model: F) -> Vec<f64>
where
    F: Fn(f64) -> f64,
{
    potentials.iter().map(|&e| clamp_zero_current(model(e))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_vanishes_at_corrosion_potential() {
        let p = ActivationParams {
            log_i_corr: -5.0,
            b_anodic: 0.06,
            b_cathodic: 0.12,
        };
        assert_eq!(activation_current(-0.3, -0.3, &p), 0.0);
        // One decade per b_a on the anodic side (cathodic term negligible).
        let i = activation_current(-0.3 + 0.24, -0.3, &p);
        assert!((i / 1e-1 - 1.0).abs() < 1e-3, "{i}");
    }

    #[test]
    fn mixed_cathodic_branch_saturates_at_limiting_current() {
        let p = MixedParams {
            log_i_corr: -5.0,
            b_anodic: 0.06,
            b_cathodic: 0.12,
            log_i_l: -3.0,
            gamma: 3.0,
        };
        let deep = mixed_current(-1.5, 0.0, &p);
        assert!(deep < 0.0);
        assert!((deep + 1e-3).abs() < 1e-8, "{deep}");
    }

    #[test]
    fn mixed_reduces_to_activation_for_large_limiting_current() {
        let mixed = MixedParams {
            log_i_corr: -5.0,
            b_anodic: 0.06,
            b_cathodic: 0.12,
            log_i_l: 6.0,
            gamma: 3.0,
        };
        let act = ActivationParams {
            log_i_corr: -5.0,
            b_anodic: 0.06,
            b_cathodic: 0.12,
        };
        for &e in &[-0.2, -0.05, 0.05, 0.1] {
            let a = activation_current(e, 0.0, &act);
            let m = mixed_current(e, 0.0, &mixed);
            assert!((a - m).abs() <= a.abs() * 1e-9, "{e}: {a} vs {m}");
        }
    }

    #[test]
    fn reconstruct_fills_exact_zeros() {
        let out = reconstruct(&[0.0, 1.0], |e| e * 2.0);
        assert_eq!(out, vec![ZERO_CURRENT_FILL, 2.0]);
    }
}
