//! The three fit entry points.
//!
//! Every fit follows the same steps:
//!
//! 1. pick the reference potential (`0` for the linear fit, the curve's
//!    corrosion potential otherwise) and cut the fit window
//! 2. solve a bounded least-squares problem for the model parameters, with
//!    current densities parameterized as base-10 logarithms
//! 3. rebuild the model over the window and measure RMSE in linear units
//! 4. optionally extrapolate exchange current densities
//!
//! Solver diagnostics propagate unchanged as [`PolError::Solver`].

use tracing::debug;

use crate::domain::{
    ActiveFitOptions, FitCurve, FitKind, FitResult, LinearFitOptions, MixedFitOptions,
    PolarizationCurve,
};
use crate::error::{PolError, Result};
use crate::fit::{weight_distribution, window_cut};
use crate::math::{Bounds, SolverOptions, from_log10, least_squares, to_log10};
use crate::models::{
    ActivationParams, MixedParams, activation_current, mixed_current, reconstruct,
    tafel_log_current,
};

/// Initial Tafel slope guesses `(b_a, b_c)` [V/dec].
const B_ANODIC_GUESS: f64 = 0.06;
const B_CATHODIC_GUESS: f64 = 0.1;
const GAMMA_GUESS: f64 = 3.0;
const GAMMA_BOUNDS: (f64, f64) = (2.0, 4.0);
/// Half-width of the `log10 i_L` box when the limiting current is pinned.
const FIXED_I_L_TOLERANCE: f64 = 0.01;

/// Fit a Tafel line `log10|i| = slope·E + intercept` to one branch.
///
/// The window is absolute (reference potential `0`). `log_i_corr` is the
/// line evaluated at `opts.e_corr`, and the reported slope is `b = 1/slope`.
pub fn linear_fit(curve: &PolarizationCurve, opts: &LinearFitOptions) -> Result<FitResult> {
    let (e_cut, i_cut) = window_cut(curve.potential(), curve.current_density(), 0.0, opts.window);
    let log_i: Vec<f64> = i_cut.iter().map(|&v| to_log10(v)).collect();

    let fit = least_squares(
        |e, p| tafel_log_current(e, p[0], p[1]),
        &e_cut,
        &log_i,
        None,
        &[1.0, 1.0],
        &Bounds::unbounded(2),
        &SolverOptions::default(),
    )?;
    let (slope, intercept) = (fit.params[0], fit.params[1]);

    // The branch's sign is carried by the observed currents.
    let sign = if i_cut.iter().sum::<f64>() < 0.0 { -1.0 } else { 1.0 };
    let fitted = reconstruct(&e_cut, |e| sign * from_log10(tafel_log_current(e, slope, intercept)));
    let rmse = rmse(&i_cut, &fitted);

    let log_i_corr = tafel_log_current(opts.e_corr, slope, intercept);
    let log_io = opts
        .e_rev
        .map(|e_rev| linear_exchange_current(log_i_corr, slope, e_rev));

    debug!(
        points = e_cut.len(),
        slope,
        intercept,
        rmse,
        iterations = fit.iterations,
        "linear fit done"
    );

    Ok(FitResult {
        kind: FitKind::Linear,
        fit_curve: FitCurve {
            potential: e_cut,
            current: fitted,
        },
        e_corr: opts.e_corr,
        log_i_corr,
        b_anodic: 1.0 / slope,
        b_cathodic: None,
        log_i_l: None,
        gamma: None,
        rmse,
        log_io_anodic: log_io,
        log_io_cathodic: None,
        weighting: None,
    })
}

/// Fit the activation-control model around the corrosion potential.
///
/// The window is relative to `E_corr`, the potential of minimum `|i|` over
/// the whole curve.
pub fn active_pol_fit(curve: &PolarizationCurve, opts: &ActiveFitOptions) -> Result<FitResult> {
    let i_corr_guess = opts.i_corr_guess.unwrap_or_else(|| curve.mean_current_density());
    check_guess(curve, "i_corr_guess", i_corr_guess)?;

    let e_corr = curve.corrosion_potential();
    let (e_cut, i_cut) = window_cut(curve.potential(), curve.current_density(), e_corr, opts.window);

    let (log_min, log_max) = log_current_range(curve);
    let bounds = Bounds::new(vec![log_min, 0.0, 0.0], vec![log_max, 1.0, 1.0]);
    let p0 = [to_log10(i_corr_guess), B_ANODIC_GUESS, B_CATHODIC_GUESS];

    let fit = least_squares(
        |e, p| activation_current(e, e_corr, &ActivationParams::from_slice(p)),
        &e_cut,
        &i_cut,
        None,
        &p0,
        &bounds,
        &SolverOptions::default(),
    )?;
    let params = ActivationParams::from_slice(&fit.params);

    let fitted = reconstruct(&e_cut, |e| activation_current(e, e_corr, &params));
    let rmse = rmse(&i_cut, &fitted);

    let exchange = opts.e_rev.map(|(e_rev_an, e_rev_cath)| {
        exchange_currents(
            params.log_i_corr,
            e_corr,
            params.b_anodic,
            e_rev_an,
            params.b_cathodic,
            e_rev_cath,
        )
    });

    debug!(
        points = e_cut.len(),
        e_corr,
        log_i_corr = params.log_i_corr,
        b_a = params.b_anodic,
        b_c = params.b_cathodic,
        rmse,
        iterations = fit.iterations,
        "activation control fit done"
    );

    Ok(FitResult {
        kind: FitKind::Activation,
        fit_curve: FitCurve {
            potential: e_cut,
            current: fitted,
        },
        e_corr,
        log_i_corr: params.log_i_corr,
        b_anodic: params.b_anodic,
        b_cathodic: Some(params.b_cathodic),
        log_i_l: None,
        gamma: None,
        rmse,
        log_io_anodic: exchange.map(|(an, _)| an),
        log_io_cathodic: exchange.map(|(_, cath)| cath),
        weighting: None,
    })
}

/// Fit the mixed activation–diffusion model around the corrosion potential.
///
/// With `opts.weighting` set, the near-corrosion weight distribution is
/// passed to the solver as per-point sigma.
pub fn mixed_pol_fit(curve: &PolarizationCurve, opts: &MixedFitOptions) -> Result<FitResult> {
    let mean = curve.mean_current_density();
    let i_corr_guess = opts.i_corr_guess.unwrap_or(mean);
    let i_l_guess = opts.i_l_guess.unwrap_or(mean);
    check_guess(curve, "i_corr_guess", i_corr_guess)?;
    check_guess(curve, "i_L_guess", i_l_guess)?;

    let e_corr = curve.corrosion_potential();
    let (e_cut, i_cut) = window_cut(curve.potential(), curve.current_density(), e_corr, opts.window);

    let sigma = match opts.weighting {
        Some(w) => Some(weight_distribution(&e_cut, e_corr, w.w_ac, w.w_percent)?),
        None => None,
    };

    let log_i_corr_guess = to_log10(i_corr_guess);
    let log_i_l_guess = to_log10(i_l_guess);
    let (log_min, log_max) = log_current_range(curve);
    let (i_l_lo, i_l_hi) = if opts.fix_i_l {
        (log_i_l_guess - FIXED_I_L_TOLERANCE, log_i_l_guess + FIXED_I_L_TOLERANCE)
    } else {
        (log_min, log_max + 1.0)
    };
    let bounds = Bounds::new(
        vec![log_min, 0.0, 0.0, i_l_lo, GAMMA_BOUNDS.0],
        vec![log_max, 1.0, 1.0, i_l_hi, GAMMA_BOUNDS.1],
    );
    let p0 = [
        log_i_corr_guess,
        B_ANODIC_GUESS,
        B_CATHODIC_GUESS,
        log_i_l_guess,
        GAMMA_GUESS,
    ];

    let fit = least_squares(
        |e, p| mixed_current(e, e_corr, &MixedParams::from_slice(p)),
        &e_cut,
        &i_cut,
        sigma.as_deref(),
        &p0,
        &bounds,
        &SolverOptions::default(),
    )?;
    let params = MixedParams::from_slice(&fit.params);

    let fitted = reconstruct(&e_cut, |e| mixed_current(e, e_corr, &params));
    let rmse = rmse(&i_cut, &fitted);

    let exchange = opts.e_rev.map(|(e_rev_an, e_rev_cath)| {
        exchange_currents(
            params.log_i_corr,
            e_corr,
            params.b_anodic,
            e_rev_an,
            params.b_cathodic,
            e_rev_cath,
        )
    });

    debug!(
        points = e_cut.len(),
        weighted = opts.weighting.is_some(),
        e_corr,
        log_i_corr = params.log_i_corr,
        b_a = params.b_anodic,
        b_c = params.b_cathodic,
        log_i_l = params.log_i_l,
        gamma = params.gamma,
        rmse,
        iterations = fit.iterations,
        "mixed control fit done"
    );

    Ok(FitResult {
        kind: FitKind::Mixed,
        fit_curve: FitCurve {
            potential: e_cut,
            current: fitted,
        },
        e_corr,
        log_i_corr: params.log_i_corr,
        b_anodic: params.b_anodic,
        b_cathodic: Some(params.b_cathodic),
        log_i_l: Some(params.log_i_l),
        gamma: Some(params.gamma),
        rmse,
        log_io_anodic: exchange.map(|(an, _)| an),
        log_io_cathodic: exchange.map(|(_, cath)| cath),
        weighting: opts.weighting,
    })
}

/// `log10 io` of a Tafel line extrapolated from `E = 0` to `e_rev`.
pub fn linear_exchange_current(log_i_corr: f64, slope: f64, e_rev: f64) -> f64 {
    log_i_corr - slope * (e_rev - 0.0)
}

/// `(log10 io_an, log10 io_cath)` extrapolated from the corrosion point along
/// the anodic and cathodic Tafel lines.
pub fn exchange_currents(
    log_i_corr: f64,
    e_corr: f64,
    b_anodic: f64,
    e_rev_an: f64,
    b_cathodic: f64,
    e_rev_cath: f64,
) -> (f64, f64) {
    let io_an = log_i_corr + (e_rev_an - e_corr) / b_anodic;
    let io_cath = log_i_corr - (e_rev_cath - e_corr) / b_cathodic;
    (io_an, io_cath)
}

/// A guess must lie within the signed range of the observed current density.
pub(crate) fn check_guess(curve: &PolarizationCurve, name: &str, guess: f64) -> Result<()> {
    let (lo, hi) = curve.current_range();
    if !guess.is_finite() || guess < lo || guess > hi {
        return Err(PolError::validation(format!(
            "Specified {name} = {guess:e} does not lie within the range of the current density [{lo:e}, {hi:e}]"
        )));
    }
    Ok(())
}

fn log_current_range(curve: &PolarizationCurve) -> (f64, f64) {
    let (lo, hi) = curve.abs_current_range();
    (to_log10(lo), to_log10(hi))
}

fn rmse(observed: &[f64], fitted: &[f64]) -> f64 {
    if observed.is_empty() {
        return 0.0;
    }
    let ss: f64 = observed
        .iter()
        .zip(fitted.iter())
        .map(|(o, f)| (o - f) * (o - f))
        .sum();
    (ss / observed.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SyntheticSpec, generate_curve};
    use crate::domain::WeightSettings;
    use crate::error::SolverError;

    fn tafel_curve(slope: f64, intercept: f64, sign: f64) -> PolarizationCurve {
        let e: Vec<f64> = (-8..=-1).map(|k| k as f64 / 10.0).collect();
        let i: Vec<f64> = e.iter().map(|&v| sign * from_log10(slope * v + intercept)).collect();
        PolarizationCurve::new(&e, &i, 0.0, 1.0).unwrap()
    }

    fn mixed_curve() -> PolarizationCurve {
        let c = generate_curve(&SyntheticSpec::default()).unwrap();
        PolarizationCurve::new(&c.potential, &c.current, 0.0, 1.0).unwrap()
    }

    fn mixed_options() -> MixedFitOptions {
        MixedFitOptions {
            i_corr_guess: Some(1.5e-5),
            i_l_guess: Some(8e-4),
            ..MixedFitOptions::new([-0.6, 0.2])
        }
    }

    #[test]
    fn linear_fit_recovers_cathodic_tafel_slope() {
        let curve = tafel_curve(-16.67, -4.0, 1.0);
        let r = linear_fit(&curve, &LinearFitOptions::new([-0.8, -0.1])).unwrap();

        let b = r.tafel_slope();
        assert!(((b - 1.0 / -16.67) / (1.0 / -16.67)).abs() < 1e-9, "{b}");
        assert!(((b + 0.06) / 0.06).abs() < 0.01, "{b}");
        assert!((r.log_i_corr + 4.0).abs() < 1e-8, "{}", r.log_i_corr);

        let peak = curve.current_density().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(r.rmse / peak < 1e-9, "rmse={} peak={peak}", r.rmse);
        assert_eq!(r.fit_curve.potential.len(), 8);
    }

    #[test]
    fn linear_fit_keeps_sign_of_negative_branch() {
        let curve = tafel_curve(-10.0, -6.0, -1.0);
        let r = linear_fit(&curve, &LinearFitOptions::new([-0.8, -0.1])).unwrap();
        assert!(r.fit_curve.current.iter().all(|&v| v < 0.0));
        assert!(((r.tafel_slope() + 0.1) / 0.1).abs() < 1e-9);
    }

    #[test]
    fn linear_fit_exchange_current_extrapolates_from_zero() {
        let curve = tafel_curve(10.0, -6.0, 1.0);
        let opts = LinearFitOptions {
            e_corr: -0.2,
            e_rev: Some(0.1),
            ..LinearFitOptions::new([-0.8, -0.1])
        };
        let r = linear_fit(&curve, &opts).unwrap();
        // log_i_corr = 10·(-0.2) - 6 = -8; io = -8 - 10·0.1 = -9.
        assert!((r.log_i_corr + 8.0).abs() < 1e-8);
        assert!((r.log_io_anodic.unwrap() + 9.0).abs() < 1e-8);
        assert_eq!(r.log_io_cathodic, None);
    }

    #[test]
    fn empty_window_propagates_solver_error() {
        let curve = tafel_curve(10.0, -6.0, 1.0);
        let err = linear_fit(&curve, &LinearFitOptions::new([5.0, 6.0])).unwrap_err();
        assert!(matches!(
            err,
            PolError::Solver(SolverError::TooFewPoints { params: 2, points: 0 })
        ));
    }

    #[test]
    fn mixed_fit_recovers_generating_parameters() {
        let curve = mixed_curve();
        let r = mixed_pol_fit(&curve, &mixed_options()).unwrap();

        assert_eq!(r.e_corr, -0.4);
        assert_eq!(r.fit_curve.potential.len(), 131);
        assert!((r.log_i_corr + 5.0).abs() < 1e-4, "{}", r.log_i_corr);
        assert!((r.b_anodic - 0.06).abs() < 1e-5, "{}", r.b_anodic);
        assert!((r.b_cathodic.unwrap() - 0.12).abs() < 1e-5, "{:?}", r.b_cathodic);
        assert!((r.log_i_l.unwrap() + 3.0).abs() < 1e-4, "{:?}", r.log_i_l);
        assert!((r.gamma.unwrap() - 3.0).abs() < 1e-3, "{:?}", r.gamma);
        assert!(r.rmse < 1e-9, "{}", r.rmse);
        assert_eq!(r.cathodic_tafel_slope().map(|b| b < 0.0), Some(true));
    }

    #[test]
    fn mixed_fit_with_weighting_records_settings() {
        let curve = mixed_curve();
        let weighting = WeightSettings {
            w_ac: 0.04,
            w_percent: 75.0,
        };
        let opts = MixedFitOptions {
            weighting: Some(weighting),
            ..mixed_options()
        };
        let r = mixed_pol_fit(&curve, &opts).unwrap();
        assert_eq!(r.weighting, Some(weighting));
        // Exact data: the weighted optimum is the same point.
        assert!((r.b_cathodic.unwrap() - 0.12).abs() < 1e-4, "{:?}", r.b_cathodic);
    }

    #[test]
    fn fixed_limiting_current_stays_near_guess() {
        let curve = mixed_curve();
        let opts = MixedFitOptions {
            i_l_guess: Some(5e-4),
            fix_i_l: true,
            ..mixed_options()
        };
        let r = mixed_pol_fit(&curve, &opts).unwrap();
        let log_guess = to_log10(5e-4);
        assert!((r.log_i_l.unwrap() - log_guess).abs() <= 0.01 + 1e-12);
    }

    #[test]
    fn fixed_limiting_current_off_the_optimum_rests_on_its_box() {
        // The generating i_L is 1e-3, above both boxes.
        let curve = mixed_curve();
        for guess in [5e-4, 9e-4] {
            let opts = MixedFitOptions {
                i_l_guess: Some(guess),
                fix_i_l: true,
                ..mixed_options()
            };
            let r = mixed_pol_fit(&curve, &opts).unwrap();
            let upper = to_log10(guess) + FIXED_I_L_TOLERANCE;
            assert!((r.log_i_l.unwrap() - upper).abs() < 1e-9, "{guess}: {:?}", r.log_i_l);
            assert!(r.rmse.is_finite());
            assert!(r.b_cathodic.unwrap() > 0.0 && r.b_cathodic.unwrap() <= 1.0);
        }
    }

    #[test]
    fn diffusion_exponent_beyond_its_range_is_held_at_the_bound() {
        let spec = SyntheticSpec {
            params: MixedParams {
                gamma: 6.0,
                ..SyntheticSpec::default().params
            },
            ..SyntheticSpec::default()
        };
        let c = generate_curve(&spec).unwrap();
        let curve = PolarizationCurve::new(&c.potential, &c.current, 0.0, 1.0).unwrap();

        let r = mixed_pol_fit(&curve, &mixed_options()).unwrap();
        assert!((r.gamma.unwrap() - GAMMA_BOUNDS.1).abs() < 1e-9, "{:?}", r.gamma);
        assert!((r.b_anodic - 0.06).abs() < 0.01, "{}", r.b_anodic);
    }

    #[test]
    fn noisy_mixed_fit_converges_near_generating_slopes() {
        let spec = SyntheticSpec {
            noise: 0.03,
            ..SyntheticSpec::default()
        };
        let c = generate_curve(&spec).unwrap();
        let curve = PolarizationCurve::new(&c.potential, &c.current, 0.0, 1.0).unwrap();

        let r = mixed_pol_fit(&curve, &mixed_options()).unwrap();
        assert!((r.b_anodic - 0.06).abs() < 0.01, "{}", r.b_anodic);
        assert!((r.b_cathodic.unwrap() - 0.12).abs() < 0.02, "{:?}", r.b_cathodic);
        assert!((r.log_i_l.unwrap() + 3.0).abs() < 0.1, "{:?}", r.log_i_l);
        let gamma = r.gamma.unwrap();
        assert!((GAMMA_BOUNDS.0..=GAMMA_BOUNDS.1).contains(&gamma), "{gamma}");
    }

    #[test]
    fn mixed_fit_is_deterministic() {
        let curve = mixed_curve();
        let a = mixed_pol_fit(&curve, &mixed_options()).unwrap();
        let b = mixed_pol_fit(&curve, &mixed_options()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn activation_fit_recovers_slopes() {
        // Zero crossing slightly off the grid point so E_corr lands on it.
        let e_true = -0.3 - 1e-7;
        let params = ActivationParams {
            log_i_corr: -5.0,
            b_anodic: 0.06,
            b_cathodic: 0.12,
        };
        let e: Vec<f64> = (-30..=20).map(|k| -0.3 + 0.005 * k as f64).collect();
        let i: Vec<f64> = e.iter().map(|&v| activation_current(v, e_true, &params)).collect();
        let curve = PolarizationCurve::new(&e, &i, 0.0, 1.0).unwrap();

        let opts = ActiveFitOptions {
            i_corr_guess: Some(2e-5),
            e_rev: Some((0.0, -0.6)),
            ..ActiveFitOptions::new([-0.2, 0.2])
        };
        let r = active_pol_fit(&curve, &opts).unwrap();
        assert!((r.e_corr + 0.3).abs() < 1e-12);
        assert!((r.log_i_corr + 5.0).abs() < 1e-3, "{}", r.log_i_corr);
        assert!((r.b_anodic - 0.06).abs() < 1e-4, "{}", r.b_anodic);
        assert!((r.b_cathodic.unwrap() - 0.12).abs() < 1e-4, "{:?}", r.b_cathodic);
        assert!(r.log_i_l.is_none() && r.gamma.is_none());

        let (an, cath) =
            exchange_currents(r.log_i_corr, r.e_corr, r.b_anodic, 0.0, r.b_cathodic.unwrap(), -0.6);
        assert_eq!(r.log_io_anodic, Some(an));
        assert_eq!(r.log_io_cathodic, Some(cath));
    }

    #[test]
    fn guesses_outside_current_range_are_rejected() {
        let curve = mixed_curve();
        let (lo, hi) = curve.current_range();

        for bad in [lo * 2.0, hi * 2.0] {
            let active = ActiveFitOptions {
                i_corr_guess: Some(bad),
                ..ActiveFitOptions::new([-0.6, 0.2])
            };
            assert!(matches!(active_pol_fit(&curve, &active), Err(PolError::Validation(_))));

            let mixed = MixedFitOptions {
                i_corr_guess: Some(bad),
                ..mixed_options()
            };
            assert!(matches!(mixed_pol_fit(&curve, &mixed), Err(PolError::Validation(_))));

            let mixed_il = MixedFitOptions {
                i_l_guess: Some(bad),
                ..mixed_options()
            };
            assert!(matches!(mixed_pol_fit(&curve, &mixed_il), Err(PolError::Validation(_))));
        }
    }

    #[test]
    fn exchange_current_formulas() {
        let (an, cath) = exchange_currents(-5.0, -0.4, 0.06, -0.1, 0.12, -0.7);
        assert!((an - (-5.0 + 0.3 / 0.06)).abs() < 1e-12);
        assert!((cath - (-5.0 + 0.3 / 0.12)).abs() < 1e-12);
        assert!((linear_exchange_current(-4.0, -16.0, 0.1) + 2.4).abs() < 1e-12);
    }
}
