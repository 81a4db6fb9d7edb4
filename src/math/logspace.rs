//! Conversion boundary between log10-current space and linear current space.
//!
//! The fits optimize `log10(i_corr)` and `log10(i_L)` because current
//! densities span many decades. Everything reported to a user (corrosion
//! current, limiting current, exchange currents) is linear. All crossings of
//! that boundary go through this pair of functions.

/// `log10(|value|)`.
///
/// The sign is dropped: current densities on the cathodic branch are negative
/// but their magnitude is what the models parameterize.
pub fn to_log10(value: f64) -> f64 {
    value.abs().log10()
}

/// `10^exponent`.
pub fn from_log10(exponent: f64) -> f64 {
    10f64.powf(exponent)
}
