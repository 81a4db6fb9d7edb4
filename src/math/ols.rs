//! Linear least-squares step solver.
//!
//! Every Levenberg–Marquardt iteration solves a small damped system of the form
//!
//! ```text
//! minimize ‖ [J; √λ·D] δ − [r; 0] ‖²
//! ```
//!
//! which is an ordinary (tall) least-squares problem in `δ`.
//!
//! Implementation choices:
//! - We stack the damping rows under the Jacobian instead of forming `JᵀJ`,
//!   which keeps the condition number of the system at that of `J`.
//! - We solve with SVD. Nalgebra's `QR::solve` is intended for square
//!   systems and will panic for non-square matrices.
//! - The parameter dimension is tiny (2–5 columns), so SVD cost is negligible
//!   next to the model evaluations.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-14, 1e-12, 1e-10] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn damping_rows_shrink_the_step() {
        // Same system with a heavy ridge row block: the solution moves towards 0.
        let x = DMatrix::from_row_slice(
            5,
            2,
            &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 10.0, 0.0, 0.0, 10.0],
        );
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0, 0.0, 0.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!(beta[0].abs() < 2.0);
        assert!(beta[1].abs() < 3.0);
    }
}
