//! The measured polarization curve, normalized for fitting.

use serde::{Deserialize, Serialize};

use crate::error::{PolError, Result};

/// One polarization curve: raw measurement plus IR-corrected working arrays.
///
/// Construction (see [`PolarizationCurve::new`]):
///
/// 1. every sample whose current is exactly `0.0` is dropped
/// 2. both arrays are reversed when the first two potentials are decreasing
/// 3. `E = E_obs − I·R` and `i = I / sample_surface`
///
/// The struct is immutable afterwards; fits borrow it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolarizationCurve {
    e_obs: Vec<f64>,
    i_obs: Vec<f64>,
    e: Vec<f64>,
    i: Vec<f64>,
    resistance: f64,
    sample_surface: f64,
}

impl PolarizationCurve {
    /// Build a curve from measured potentials `e` [V vs ref] and currents `i`
    /// [A or A/area], with ohmic resistance `resistance` [Ohm] and sample
    /// surface area `sample_surface`.
    pub fn new(e: &[f64], i: &[f64], resistance: f64, sample_surface: f64) -> Result<Self> {
        if e.len() != i.len() {
            return Err(PolError::validation(format!(
                "Potential and current sequences must have the same length (got {} and {})",
                e.len(),
                i.len()
            )));
        }
        if let Some(k) = e.iter().position(|v| !v.is_finite()) {
            return Err(PolError::validation(format!(
                "non-real numbers in potential input (index {k})"
            )));
        }
        if let Some(k) = i.iter().position(|v| !v.is_finite()) {
            return Err(PolError::validation(format!(
                "non-real numbers in current input (index {k})"
            )));
        }
        if !resistance.is_finite() {
            return Err(PolError::validation("The resistance R must be a finite number"));
        }
        if !(sample_surface.is_finite() && sample_surface > 0.0) {
            return Err(PolError::validation(
                "The sample surface must be a finite number > 0",
            ));
        }

        let (mut e_obs, mut i_obs): (Vec<f64>, Vec<f64>) = e
            .iter()
            .zip(i.iter())
            .filter(|&(_, &current)| current != 0.0)
            .map(|(&ev, &iv)| (ev, iv))
            .unzip();

        if e_obs.len() < 2 {
            return Err(PolError::validation(format!(
                "At least two non-zero current samples are required (got {})",
                e_obs.len()
            )));
        }

        // Only the first pair decides the orientation.
        if e_obs[0] > e_obs[1] {
            e_obs.reverse();
            i_obs.reverse();
        }

        let e_corrected: Vec<f64> = e_obs
            .iter()
            .zip(i_obs.iter())
            .map(|(&ev, &iv)| ev - iv * resistance)
            .collect();
        let density: Vec<f64> = i_obs.iter().map(|&iv| iv / sample_surface).collect();

        Ok(Self {
            e_obs,
            i_obs,
            e: e_corrected,
            i: density,
            resistance,
            sample_surface,
        })
    }

    /// IR-corrected potentials [V vs ref].
    pub fn potential(&self) -> &[f64] {
        &self.e
    }

    /// Current densities [A/area].
    pub fn current_density(&self) -> &[f64] {
        &self.i
    }

    /// Potentials as measured (zero-filtered and oriented, before IR correction).
    pub fn observed_potential(&self) -> &[f64] {
        &self.e_obs
    }

    /// Currents as measured (zero-filtered and oriented).
    pub fn observed_current(&self) -> &[f64] {
        &self.i_obs
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    pub fn sample_surface(&self) -> f64 {
        self.sample_surface
    }

    pub fn len(&self) -> usize {
        self.i.len()
    }

    pub fn is_empty(&self) -> bool {
        self.i.is_empty()
    }

    /// Corrosion potential: `E` at the minimum `|i|` over the whole curve.
    pub fn corrosion_potential(&self) -> f64 {
        let mut best = 0;
        for k in 1..self.i.len() {
            if self.i[k].abs() < self.i[best].abs() {
                best = k;
            }
        }
        self.e[best]
    }

    /// Signed `(min(i), max(i))`.
    pub fn current_range(&self) -> (f64, f64) {
        let lo = self.i.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = self.i.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (lo, hi)
    }

    /// `(min|i|, max|i|)`.
    pub fn abs_current_range(&self) -> (f64, f64) {
        let lo = self.i.iter().map(|v| v.abs()).fold(f64::INFINITY, f64::min);
        let hi = self.i.iter().map(|v| v.abs()).fold(f64::NEG_INFINITY, f64::max);
        (lo, hi)
    }

    /// Mean current density; the default initial guess for `i_corr` and `i_L`.
    pub fn mean_current_density(&self) -> f64 {
        self.i.iter().sum::<f64>() / self.i.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascending_input_keeps_order() {
        let c = PolarizationCurve::new(&[-0.3, -0.2, -0.1], &[-1e-3, 1e-5, 2e-3], 0.0, 1.0).unwrap();
        assert_eq!(c.potential(), &[-0.3, -0.2, -0.1]);
        assert_eq!(c.current_density(), &[-1e-3, 1e-5, 2e-3]);
    }

    #[test]
    fn descending_first_pair_reverses_both_arrays() {
        let c = PolarizationCurve::new(&[-0.1, -0.2, -0.3], &[2e-3, 1e-5, -1e-3], 0.0, 1.0).unwrap();
        assert_eq!(c.potential(), &[-0.3, -0.2, -0.1]);
        assert_eq!(c.current_density(), &[-1e-3, 1e-5, 2e-3]);
    }

    #[test]
    fn only_first_pair_decides_orientation() {
        // Non-monotone input whose first pair is ascending is left untouched.
        let c = PolarizationCurve::new(&[0.0, 0.1, -0.5], &[1.0, 2.0, 3.0], 0.0, 1.0).unwrap();
        assert_eq!(c.potential(), &[0.0, 0.1, -0.5]);
    }

    #[test]
    fn exact_zero_currents_are_dropped() {
        let c = PolarizationCurve::new(
            &[0.0, 0.1, 0.2, 0.3, 0.4],
            &[1.0, 0.0, 3.0, 0.0, 5.0],
            0.0,
            1.0,
        )
        .unwrap();
        assert_eq!(c.potential(), &[0.0, 0.2, 0.4]);
        assert_eq!(c.current_density(), &[1.0, 3.0, 5.0]);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn near_zero_currents_are_kept() {
        let c = PolarizationCurve::new(&[0.0, 0.1], &[1e-300, 1.0], 0.0, 1.0).unwrap();
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn ir_correction_and_surface_scaling() {
        let c = PolarizationCurve::new(&[0.0, 1.0], &[2.0, 4.0], 0.5, 2.0).unwrap();
        assert_eq!(c.potential(), &[-1.0, -1.0]);
        assert_eq!(c.current_density(), &[1.0, 2.0]);
        assert_eq!(c.observed_potential(), &[0.0, 1.0]);
        assert_eq!(c.observed_current(), &[2.0, 4.0]);
    }

    #[test]
    fn rejects_mismatched_and_non_finite_input() {
        assert!(PolarizationCurve::new(&[0.0, 1.0], &[1.0], 0.0, 1.0).is_err());
        assert!(PolarizationCurve::new(&[0.0, f64::NAN], &[1.0, 2.0], 0.0, 1.0).is_err());
        assert!(PolarizationCurve::new(&[0.0, 1.0], &[1.0, f64::INFINITY], 0.0, 1.0).is_err());
        assert!(PolarizationCurve::new(&[0.0, 1.0], &[0.0, 1.0], 0.0, 1.0).is_err());
    }

    #[test]
    fn corrosion_potential_is_minimum_abs_current() {
        let c = PolarizationCurve::new(&[-0.3, -0.2, -0.1, 0.0], &[-1e-3, -2e-6, 1e-5, 2e-3], 0.0, 1.0)
            .unwrap();
        assert_eq!(c.corrosion_potential(), -0.2);
    }
}
