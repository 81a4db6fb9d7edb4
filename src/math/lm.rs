//! Box-bounded Levenberg–Marquardt solver for small curve-fitting problems.
//!
//! Minimizes
//!
//! ```text
//! Σ ((y_k − f(x_k; p)) / σ_k)²     subject to  lower ≤ p ≤ upper
//! ```
//!
//! Implementation notes:
//! - The Jacobian is approximated with forward differences; the difference
//!   step flips to a backward step when the forward one would leave the box.
//! - Columns of the Jacobian are normalized before each solve (Marquardt
//!   scaling), so the damping acts on every parameter with the same relative
//!   strength regardless of its units (log-currents vs volts vs `γ`).
//! - Bounds are enforced by projection: every trial point is clamped into the
//!   box and accepted only if it lowers the cost.
//! - A parameter resting on a bound with the descent direction pointing out of
//!   the box is frozen for that iteration. Convergence is declared on the
//!   remaining free parameters, so an optimum on the boundary terminates.
//! - Everything is deterministic: same inputs give the same iterates.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::SolverError;
use crate::math::solve_least_squares;

/// Solver tolerances and budget.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    /// Relative cost-reduction tolerance.
    pub ftol: f64,
    /// Relative step-size tolerance.
    pub xtol: f64,
    /// Largest allowed cosine between the residual vector and a free Jacobian
    /// column; below it the point is stationary within the box.
    pub gtol: f64,
    /// Outer-iteration budget; `None` means `200·(n+1)`.
    pub max_iterations: Option<usize>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            ftol: 1e-10,
            xtol: 1e-12,
            gtol: 1e-10,
            max_iterations: None,
        }
    }
}

/// Box constraints, one `[lower, upper]` pair per parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self { lower, upper }
    }

    /// No constraints on `n` parameters.
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    /// Whether parameter `j` sits on a bound that `descent` pushes against.
    fn blocks(&self, j: usize, value: f64, descent: f64) -> bool {
        (value <= self.lower[j] && descent < 0.0) || (value >= self.upper[j] && descent > 0.0)
    }

    fn clamp(&self, p: &mut [f64]) {
        for (j, v) in p.iter_mut().enumerate() {
            *v = v.clamp(self.lower[j], self.upper[j]);
        }
    }
}

/// Converged solution.
#[derive(Debug, Clone)]
pub struct LeastSquaresFit {
    pub params: Vec<f64>,
    /// Weighted sum of squared residuals at `params`.
    pub cost: f64,
    pub iterations: usize,
}

/// Fit `model(x, p)` to `(x, y)` with optional per-point `sigma`.
///
/// `sigma` follows the usual curve-fitting convention: residual `k` is divided
/// by `sigma[k]`, so a smaller sigma gives the point more influence.
pub fn least_squares<F>(
    model: F,
    x: &[f64],
    y: &[f64],
    sigma: Option<&[f64]>,
    p0: &[f64],
    bounds: &Bounds,
    opts: &SolverOptions,
) -> Result<LeastSquaresFit, SolverError>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let n = p0.len();
    let m = x.len().min(y.len());
    if n > m {
        return Err(SolverError::TooFewPoints { params: n, points: m });
    }
    for j in 0..n {
        let (lo, hi) = (bounds.lower[j], bounds.upper[j]);
        if !(lo < hi) {
            return Err(SolverError::InvalidBounds {
                index: j,
                lower: lo,
                upper: hi,
            });
        }
    }

    let inv_sigma: Vec<f64> = match sigma {
        Some(s) => s.iter().take(m).map(|v| 1.0 / v).collect(),
        None => vec![1.0; m],
    };

    let residuals = |p: &[f64], out: &mut DVector<f64>| -> f64 {
        let mut cost = 0.0;
        for k in 0..m {
            let r = (y[k] - model(x[k], p)) * inv_sigma[k];
            out[k] = r;
            cost += r * r;
        }
        cost
    };

    let mut p = p0.to_vec();
    bounds.clamp(&mut p);

    let mut r = DVector::<f64>::zeros(m);
    let mut cost = residuals(&p, &mut r);
    if !cost.is_finite() {
        return Err(SolverError::NonFinite);
    }

    let y_scale: f64 = (0..m)
        .map(|k| (y[k] * inv_sigma[k]).powi(2))
        .sum::<f64>()
        .max(f64::MIN_POSITIVE);
    let cost_floor = f64::EPSILON * f64::EPSILON * y_scale;

    let max_iterations = opts.max_iterations.unwrap_or(200 * (n + 1));
    let mut lambda: f64 = 1e-3;
    let mut r_trial = DVector::<f64>::zeros(m);
    let mut jac = DMatrix::<f64>::zeros(m, n);

    for iteration in 0..max_iterations {
        if cost <= cost_floor {
            debug!(iteration, cost, "least squares converged (zero residual)");
            return Ok(LeastSquaresFit {
                params: p,
                cost,
                iterations: iteration,
            });
        }

        fill_jacobian(&model, x, &inv_sigma, &p, bounds, &mut jac)?;

        // Column scaling: solve for z = c ⊙ δ with unit-norm columns.
        let scale: Vec<f64> = (0..n)
            .map(|j| {
                let c = jac.column(j).norm();
                if c > 0.0 { c } else { 1.0 }
            })
            .collect();

        // Descent direction of the cost is Jᵀr. A parameter on a bound whose
        // descent direction points out of the box is held fixed this iteration.
        let descent = jac.tr_mul(&r);
        let free: Vec<usize> = (0..n)
            .filter(|&j| !bounds.blocks(j, p[j], descent[j]))
            .collect();

        let r_norm = cost.sqrt();
        let cosine = free
            .iter()
            .map(|&j| descent[j].abs() / (scale[j] * r_norm))
            .fold(0.0, f64::max);
        if free.is_empty() || cosine <= opts.gtol {
            debug!(
                iteration,
                cost,
                active = n - free.len(),
                "least squares converged (projected gradient)"
            );
            return Ok(LeastSquaresFit {
                params: p,
                cost,
                iterations: iteration,
            });
        }

        let nf = free.len();
        loop {
            let mut a = DMatrix::<f64>::zeros(m + nf, nf);
            let mut b = DVector::<f64>::zeros(m + nf);
            for k in 0..m {
                for (q, &j) in free.iter().enumerate() {
                    a[(k, q)] = jac[(k, j)] / scale[j];
                }
                b[k] = r[k];
            }
            let damping = lambda.sqrt();
            for q in 0..nf {
                a[(m + q, q)] = damping;
            }

            let z = solve_least_squares(&a, &b).ok_or(SolverError::SingularStep)?;
            let mut trial = p.clone();
            for (q, &j) in free.iter().enumerate() {
                trial[j] += z[q] / scale[j];
            }
            bounds.clamp(&mut trial);

            let cost_trial = residuals(&trial, &mut r_trial);
            if cost_trial.is_finite() && cost_trial < cost {
                let step_norm = trial
                    .iter()
                    .zip(p.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt();
                let p_norm = trial.iter().map(|v| v * v).sum::<f64>().sqrt();
                let reduction = cost - cost_trial;

                p = trial;
                std::mem::swap(&mut r, &mut r_trial);
                let previous = cost;
                cost = cost_trial;
                lambda = (lambda / 10.0).max(1e-15);

                if reduction <= opts.ftol * previous || step_norm <= opts.xtol * (opts.xtol + p_norm) {
                    debug!(iteration, cost, "least squares converged (tolerance)");
                    return Ok(LeastSquaresFit {
                        params: p,
                        cost,
                        iterations: iteration + 1,
                    });
                }
                break;
            }

            lambda *= 10.0;
            if lambda > 1e16 {
                // No damped step lowers the cost: stationary within the box.
                debug!(iteration, cost, "least squares converged (no further descent)");
                return Ok(LeastSquaresFit {
                    params: p,
                    cost,
                    iterations: iteration + 1,
                });
            }
        }
    }

    Err(SolverError::MaxIterations(max_iterations))
}

fn fill_jacobian<F>(
    model: &F,
    x: &[f64],
    inv_sigma: &[f64],
    p: &[f64],
    bounds: &Bounds,
    jac: &mut DMatrix<f64>,
) -> Result<(), SolverError>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let m = jac.nrows();
    let base: Vec<f64> = (0..m).map(|k| model(x[k], p)).collect();
    let mut shifted = p.to_vec();

    for j in 0..p.len() {
        let mut h = f64::EPSILON.sqrt() * p[j].abs().max(1.0);
        if p[j] + h > bounds.upper[j] {
            h = -h;
        }
        shifted[j] = p[j] + h;
        for k in 0..m {
            let d = (model(x[k], &shifted) - base[k]) / h * inv_sigma[k];
            if !d.is_finite() {
                return Err(SolverError::NonFinite);
            }
            jac[(k, j)] = d;
        }
        shifted[j] = p[j];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exponential_decay() {
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|&t| 2.5 * (-1.3 * t).exp()).collect();
        let model = |t: f64, p: &[f64]| p[0] * (-p[1] * t).exp();

        let fit = least_squares(
            model,
            &x,
            &y,
            None,
            &[1.0, 1.0],
            &Bounds::unbounded(2),
            &SolverOptions::default(),
        )
        .unwrap();
        assert!((fit.params[0] - 2.5).abs() < 1e-8, "{:?}", fit.params);
        assert!((fit.params[1] - 1.3).abs() < 1e-8, "{:?}", fit.params);
    }

    #[test]
    fn respects_bounds() {
        // The unconstrained optimum (slope 3) lies outside [0, 1].
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&t| 3.0 * t).collect();
        let model = |t: f64, p: &[f64]| p[0] * t;

        let fit = least_squares(
            model,
            &x,
            &y,
            None,
            &[0.5],
            &Bounds::new(vec![0.0], vec![1.0]),
            &SolverOptions::default(),
        )
        .unwrap();
        assert!((fit.params[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn optimum_on_a_bound_terminates_with_the_free_parameter_fitted() {
        // Rate capped at 1.0 below the generating 1.3; amplitude stays free.
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|&t| 2.5 * (-1.3 * t).exp()).collect();
        let model = |t: f64, p: &[f64]| p[0] * (-p[1] * t).exp();

        let fit = least_squares(
            model,
            &x,
            &y,
            None,
            &[1.0, 0.5],
            &Bounds::new(vec![0.0, 0.0], vec![10.0, 1.0]),
            &SolverOptions::default(),
        )
        .unwrap();
        assert!((fit.params[1] - 1.0).abs() < 1e-12, "{:?}", fit.params);
        assert!(fit.params[0] > 0.0 && fit.params[0] < 2.5, "{:?}", fit.params);
        assert!(fit.iterations < 200 * 3);

        // Moving the free amplitude either way cannot lower the cost.
        let cost_at = |a: f64| -> f64 {
            x.iter()
                .zip(y.iter())
                .map(|(&t, &v)| (v - model(t, &[a, 1.0])).powi(2))
                .sum()
        };
        let a = fit.params[0];
        assert!(cost_at(a) <= cost_at(a * (1.0 + 1e-4)));
        assert!(cost_at(a) <= cost_at(a * (1.0 - 1e-4)));
    }

    #[test]
    fn noisy_fit_with_a_pinned_parameter_converges() {
        // Line with intercept 2 and slope 3, slope boxed to [0, 1], small deterministic noise.
        let x: Vec<f64> = (0..40).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(k, &t)| 2.0 + 3.0 * t + 0.05 * ((k * 7 % 11) as f64 - 5.0))
            .collect();
        let model = |t: f64, p: &[f64]| p[0] + p[1] * t;

        let fit = least_squares(
            model,
            &x,
            &y,
            None,
            &[0.0, 0.5],
            &Bounds::new(vec![-100.0, 0.0], vec![100.0, 1.0]),
            &SolverOptions::default(),
        )
        .unwrap();
        assert!((fit.params[1] - 1.0).abs() < 1e-12, "{:?}", fit.params);
        // With the slope pinned the intercept is the mean of y − t.
        let expected = x.iter().zip(y.iter()).map(|(&t, &v)| v - t).sum::<f64>() / x.len() as f64;
        assert!((fit.params[0] - expected).abs() < 1e-6, "{} vs {expected}", fit.params[0]);
    }

    #[test]
    fn empty_data_is_a_solver_error() {
        let model = |t: f64, p: &[f64]| p[0] * t + p[1];
        let err = least_squares(
            model,
            &[],
            &[],
            None,
            &[1.0, 1.0],
            &Bounds::unbounded(2),
            &SolverOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, SolverError::TooFewPoints { params: 2, points: 0 });
    }

    #[test]
    fn sigma_downweights_points() {
        // One outlier with a huge sigma barely moves the constant fit.
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 1.0, 1.0, 100.0];
        let sigma = [1.0, 1.0, 1.0, 1e6];
        let model = |_t: f64, p: &[f64]| p[0];

        let fit = least_squares(
            model,
            &x,
            &y,
            Some(&sigma),
            &[0.0],
            &Bounds::unbounded(1),
            &SolverOptions::default(),
        )
        .unwrap();
        assert!((fit.params[0] - 1.0).abs() < 1e-6);
    }
}
