//! ASCII plotting for terminal output.
//!
//! A fixed-size character grid with `log10|i|` against `E`, meant for a
//! quick look at a fit in the terminal. Observed points are drawn as `o`
//! over the fitted curve (`-`), which only spans the fit window.

use crate::domain::{FitResult, PolarizationCurve};
use crate::math::to_log10;

/// Render observed `log10|i|` and the fitted curve on a `width × height` grid.
pub fn render_ascii_plot(
    curve: &PolarizationCurve,
    fit: &FitResult,
    width: usize,
    height: usize,
) -> String {
    let observed: Vec<(f64, f64)> = curve
        .potential()
        .iter()
        .zip(curve.current_density().iter())
        .map(|(&e, &i)| (e, to_log10(i)))
        .collect();
    let fitted: Vec<(f64, f64)> = fit
        .fit_curve
        .potential
        .iter()
        .zip(fit.fit_curve.current.iter())
        .map(|(&e, &i)| (e, to_log10(i)))
        .collect();

    render_plot(&observed, &fitted, width, height)
}

fn render_plot(observed: &[(f64, f64)], fitted: &[(f64, f64)], width: usize, height: usize) -> String {
    let all = || observed.iter().chain(fitted.iter());
    let e_range = finite_range(all().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let y_range = finite_range(all().map(|p| p.1))
        .map(|(lo, hi)| {
            let pad = (0.05 * (hi - lo)).max(1e-12);
            (lo - pad, hi + pad)
        })
        .unwrap_or((0.0, 1.0));

    let mut canvas = Canvas::new(width.max(10), height.max(5), e_range, y_range);

    // Curve first so points overlay it.
    let mut prev = None;
    for &p in fitted {
        let cell = canvas.cell(p);
        match (prev, cell) {
            (Some(a), Some(b)) => canvas.segment(a, b, '-'),
            (None, Some(b)) => canvas.put(b, '-'),
            _ => {}
        }
        prev = cell;
    }
    for &p in observed {
        if let Some((col, row)) = canvas.cell(p) {
            canvas.cells[row][col] = 'o';
        }
    }

    let (e_min, e_max) = e_range;
    let (y_min, y_max) = y_range;
    let mut out = format!("Plot: E=[{e_min:.3}, {e_max:.3}] V | log10|i|=[{y_min:.2}, {y_max:.2}]\n");
    for row in &canvas.cells {
        out.extend(row.iter());
        out.push('\n');
    }
    out
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (lo.is_finite() && hi > lo).then_some((lo, hi))
}

/// Character grid; row 0 is the top (largest `y`).
struct Canvas {
    cells: Vec<Vec<char>>,
    e_range: (f64, f64),
    y_range: (f64, f64),
}

impl Canvas {
    fn new(width: usize, height: usize, e_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self {
            cells: vec![vec![' '; width]; height],
            e_range,
            y_range,
        }
    }

    /// `(column, row)` of a data point, `None` if it is not finite.
    fn cell(&self, (e, y): (f64, f64)) -> Option<(usize, usize)> {
        if !(e.is_finite() && y.is_finite()) {
            return None;
        }
        let last_col = (self.cells[0].len() - 1) as f64;
        let last_row = (self.cells.len() - 1) as f64;
        let u = ((e - self.e_range.0) / (self.e_range.1 - self.e_range.0)).clamp(0.0, 1.0);
        let v = ((y - self.y_range.0) / (self.y_range.1 - self.y_range.0)).clamp(0.0, 1.0);
        Some(((u * last_col).round() as usize, (last_row - v * last_row).round() as usize))
    }

    /// Fill empty cells only.
    fn put(&mut self, (col, row): (usize, usize), ch: char) {
        if self.cells[row][col] == ' ' {
            self.cells[row][col] = ch;
        }
    }

    /// Straight segment between two cells, stepping along the longer axis.
    fn segment(&mut self, from: (usize, usize), to: (usize, usize), ch: char) {
        let (c0, r0) = (from.0 as f64, from.1 as f64);
        let (dc, dr) = (to.0 as f64 - c0, to.1 as f64 - r0);
        let steps = dc.abs().max(dr.abs()) as usize;
        if steps == 0 {
            self.put(from, ch);
            return;
        }
        for k in 0..=steps {
            let t = k as f64 / steps as f64;
            let cell = ((c0 + t * dc).round() as usize, (r0 + t * dr).round() as usize);
            self.put(cell, ch);
        }
    }
}
