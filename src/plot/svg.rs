//! SVG diagnostic figures rendered with Plotters.
//!
//! Two families of figures:
//! - per fit: the raw data, the fit overlaid on linear and log scales, and an
//!   overview with the Tafel line(s) and the limiting-current level
//! - per sensitivity sweep: stability of `b_c` against `W` and `w_ac`, and
//!   the fitted `b_c` / `i_L` against the cathodic window
//!
//! Current densities on log axes are drawn as `log10|i|` on a linear axis.
//! All series are computed up front; the drawing helpers only lay them out.

use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::debug;

use crate::domain::{FitKind, FitResult, PolarizationCurve, SensitivityReport};
use crate::error::{PolError, Result};
use crate::math::to_log10;

type DrawResult = std::result::Result<(), Box<dyn Error>>;

const SIZE: (u32, u32) = (900, 600);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
    Line,
    Points,
    Star,
}

struct Series {
    label: Option<String>,
    points: Vec<(f64, f64)>,
    color: RGBColor,
    mark: Mark,
}

impl Series {
    fn line(label: impl Into<String>, points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Self {
            label: Some(label.into()),
            points,
            color,
            mark: Mark::Line,
        }
    }

    fn points(label: impl Into<String>, points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Self {
            label: Some(label.into()),
            points,
            color,
            mark: Mark::Points,
        }
    }
}

/// Vertical `mean ± std` bar.
#[derive(Debug, Clone, Copy)]
struct ErrorBar {
    x: f64,
    mean: f64,
    std_dev: f64,
}

struct Figure<'a> {
    title: String,
    x_desc: &'a str,
    y_desc: &'a str,
    series: Vec<Series>,
    error_bars: Vec<ErrorBar>,
    /// Overlays drawn inside the data bounds only (not used for bounds).
    guides: Vec<Series>,
}

impl<'a> Figure<'a> {
    fn new(title: impl Into<String>, x_desc: &'a str, y_desc: &'a str) -> Self {
        Self {
            title: title.into(),
            x_desc,
            y_desc,
            series: Vec::new(),
            error_bars: Vec::new(),
            guides: Vec::new(),
        }
    }

    fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let xs = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.0))
            .chain(self.error_bars.iter().map(|b| b.x));
        let ys = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.1))
            .chain(self.error_bars.iter().flat_map(|b| [b.mean - b.std_dev, b.mean + b.std_dev]));
        (padded_range(xs), padded_range(ys))
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| PolError::io(format!("failed to create '{}'", parent.display()), e))?;
        }
        self.draw(path)
            .map_err(|e| PolError::plot(path.display().to_string(), e))?;
        debug!(path = %path.display(), "figure written");
        Ok(())
    }

    fn draw(&self, path: &Path) -> DrawResult {
        let ([x0, x1], [y0, y1]) = self.bounds();

        let root = SVGBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 20))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(x0..x1, y0..y1)?;

        chart
            .configure_mesh()
            .x_desc(self.x_desc)
            .y_desc(self.y_desc)
            .x_labels(8)
            .y_labels(8)
            .x_label_formatter(&|v| format_tick(*v))
            .y_label_formatter(&|v| format_tick(*v))
            .draw()?;

        let mut labelled = false;
        for series in self.guides.iter().chain(self.series.iter()) {
            let color = series.color;
            let anno = match series.mark {
                Mark::Line => chart.draw_series(LineSeries::new(
                    series.points.iter().copied(),
                    color.stroke_width(2),
                ))?,
                Mark::Points => chart.draw_series(
                    series
                        .points
                        .iter()
                        .map(|&p| Circle::new(p, 3, color.filled())),
                )?,
                Mark::Star => chart.draw_series(
                    series
                        .points
                        .iter()
                        .map(|&p| Cross::new(p, 7, color.stroke_width(2))),
                )?,
            };
            if let Some(label) = &series.label {
                labelled = true;
                anno.label(label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            }
        }

        for bar in &self.error_bars {
            let lo = bar.mean - bar.std_dev;
            let hi = bar.mean + bar.std_dev;
            let cap = 0.01 * (x1 - x0);
            chart.draw_series([
                PathElement::new(vec![(bar.x, lo), (bar.x, hi)], BLACK),
                PathElement::new(vec![(bar.x - cap, lo), (bar.x + cap, lo)], BLACK),
                PathElement::new(vec![(bar.x - cap, hi), (bar.x + cap, hi)], BLACK),
            ])?;
        }

        if labelled {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        root.present()?;
        Ok(())
    }
}

/// Write the four diagnostic figures of one fit into `dir`.
///
/// Returns the written paths: `data.svg`, `fit_linear.svg`,
/// `fit_semilogarithmic.svg` and `results_overview.svg`.
pub fn plot_fit(dir: &Path, curve: &PolarizationCurve, result: &FitResult) -> Result<Vec<PathBuf>> {
    let observed: Vec<(f64, f64)> = zip(curve.potential(), curve.current_density());
    let observed_log: Vec<(f64, f64)> = log_points(&observed);
    let fitted: Vec<(f64, f64)> = zip(&result.fit_curve.potential, &result.fit_curve.current);
    let fitted_log: Vec<(f64, f64)> = log_points(&fitted);

    let mut written = Vec::with_capacity(4);

    let mut data = Figure::new("Polarization curve", "E [V vs Ref]", "I [A]");
    data.series.push(Series::points(
        "data",
        zip(curve.observed_potential(), curve.observed_current()),
        BLUE,
    ));
    written.push(save(&data, dir.join("data.svg"))?);

    let mut linear = Figure::new(
        format!("Results, {}", result.kind.display_name()),
        "E [V vs Ref]",
        "i [A/area]",
    );
    linear.series.push(Series::points("data", observed, BLUE));
    linear.series.push(Series::line("fit", fitted, RED));
    written.push(save(&linear, dir.join("fit_linear.svg"))?);

    let mut semilog = Figure::new(
        format!("Results, {}", result.kind.display_name()),
        "E [V vs Ref]",
        "log10 |i| [A/area]",
    );
    semilog.series.push(Series::points("data", observed_log.clone(), BLUE));
    semilog.series.push(Series::line("fit", fitted_log.clone(), RED));
    written.push(save(&semilog, dir.join("fit_semilogarithmic.svg"))?);

    let mut overview = Figure::new("Overview of the fitted parameters", "E [V vs Ref]", "log10 |i| [A/area]");
    overview.series.push(Series::points("data", observed_log, BLUE));
    overview.series.push(Series::line("fit", fitted_log, RED));
    let ([e0, e1], [y0, y1]) = overview.bounds();
    for (label, slope) in tafel_lines(result) {
        let gradient = 1.0 / slope;
        let intercept = result.log_i_corr - result.e_corr * gradient;
        if let Some(seg) = clip_line(gradient, intercept, [e0, e1], [y0, y1]) {
            overview
                .guides
                .push(Series::line(label, seg.to_vec(), RGBColor(0, 128, 0)));
        }
    }
    if let Some(log_i_l) = result.log_i_l.filter(|v| (y0..=y1).contains(v)) {
        overview
            .guides
            .push(Series::line("i_L", vec![(e0, log_i_l), (e1, log_i_l)], RGBColor(128, 0, 128)));
    }
    written.push(save(&overview, dir.join("results_overview.svg"))?);

    Ok(written)
}

/// Stability figures of a sweep: `variability_W.svg` and one
/// `variability_wac/W=<W>.svg` per non-zero `W`.
pub fn plot_sweep_variability(dir: &Path, report: &SensitivityReport) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let mut by_w = Figure::new(
        "Variability of b_c in the diffusion controlled domain",
        "W [%]",
        "mean std(b_c) [V/dec]",
    );
    let mut weighted = Vec::new();
    for v in report.by_weight.iter().filter(|v| v.w_percent != 0.0) {
        if let Some(mean) = v.mean {
            weighted.push((v.w_percent, mean));
            by_w.error_bars.push(ErrorBar {
                x: v.w_percent,
                mean,
                std_dev: v.std_dev.unwrap_or(0.0),
            });
        }
    }
    by_w.series.push(Series::points("weighted", weighted, BLUE));
    if let Some(mean) = report
        .by_weight
        .iter()
        .find(|v| v.w_percent == 0.0)
        .and_then(|v| v.mean)
    {
        by_w.series.push(Series {
            label: Some("not weighted".to_string()),
            points: vec![(0.0, mean)],
            color: BLACK,
            mark: Mark::Star,
        });
    }
    written.push(save(&by_w, dir.join("variability_W.svg"))?);

    for &w in report.w_percent.iter().filter(|&&w| w != 0.0) {
        let points: Vec<(f64, f64)> = report
            .stability
            .iter()
            .filter(|s| s.w_percent == w)
            .filter_map(|s| s.std_dev.map(|sd| (s.w_ac, sd)))
            .collect();
        let mut fig = Figure::new(format!("W = {w:.1} %"), "w_ac [V]", "std(b_c) [V/dec]");
        fig.series.push(Series::points("std(b_c)", points.clone(), BLUE));
        fig.series.push(Series {
            label: None,
            points,
            color: BLUE,
            mark: Mark::Line,
        });
        written.push(save(&fig, dir.join("variability_wac").join(format!("W={w:.1}.svg")))?);
    }

    Ok(written)
}

/// Fitted `b_c` and `i_L` against the cathodic window.
///
/// - `effect_W/wac=<w_ac>.svg` and `effect_W_il/wac=<w_ac>.svg`: one line per `W`
/// - `effect_wac/W=<W>.svg`: one line per `w_ac`, plus the unweighted fit
pub fn plot_sweep_effects(dir: &Path, report: &SensitivityReport) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for &w_ac in &report.w_ac {
        let mut b_c = Figure::new(format!("w_ac = {w_ac:.2} V"), "cathodic window [V vs E_corr]", "b_c [V/dec]");
        let mut i_l = Figure::new(
            format!("w_ac = {w_ac:.2} V"),
            "cathodic window [V vs E_corr]",
            "log10 i_L [A/area]",
        );
        for (idx, &w) in report.w_percent.iter().enumerate() {
            let rows: Vec<_> = report.rows_for(w_ac, w).collect();
            if rows.is_empty() {
                continue;
            }
            let (label, color) = if w == 0.0 {
                ("not weighted".to_string(), BLACK)
            } else {
                (format!("W = {w}"), palette(idx))
            };
            b_c.series.push(Series::line(
                label.clone(),
                rows.iter().map(|r| (r.window_cathodic, r.b_cathodic)).collect(),
                color,
            ));
            i_l.series.push(Series::line(
                label,
                rows.iter().map(|r| (r.window_cathodic, to_log10(r.i_l))).collect(),
                color,
            ));
        }
        if b_c.series.is_empty() {
            continue;
        }
        let name = format!("wac={w_ac:.2}.svg");
        written.push(save(&b_c, dir.join("effect_W").join(&name))?);
        written.push(save(&i_l, dir.join("effect_W_il").join(&name))?);
    }

    let unweighted: Option<Vec<(f64, f64)>> = report.w_ac.first().map(|&w_ac| {
        report
            .rows_for(w_ac, 0.0)
            .map(|r| (r.window_cathodic, r.b_cathodic))
            .collect()
    });
    let n = report.w_ac.len();
    for &w in report.w_percent.iter().filter(|&&w| w != 0.0) {
        let mut fig = Figure::new(format!("W = {w} %"), "cathodic window [V vs E_corr]", "b_c [V/dec]");
        for (idx, &w_ac) in report.w_ac.iter().enumerate() {
            let points: Vec<(f64, f64)> = report
                .rows_for(w_ac, w)
                .map(|r| (r.window_cathodic, r.b_cathodic))
                .collect();
            if !points.is_empty() {
                fig.series
                    .push(Series::line(format!("w_ac = {w_ac:.2}"), points, red_shade(idx, n)));
            }
        }
        if let Some(points) = unweighted.as_ref().filter(|p| !p.is_empty()) {
            fig.series.push(Series::line("not weighted", points.clone(), BLACK));
        }
        if fig.series.is_empty() {
            continue;
        }
        written.push(save(&fig, dir.join("effect_wac").join(format!("W={w}.svg")))?);
    }

    Ok(written)
}

fn save(figure: &Figure<'_>, path: PathBuf) -> Result<PathBuf> {
    figure.save(&path)?;
    Ok(path)
}

fn zip(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter().copied().zip(y.iter().copied()).collect()
}

fn log_points(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|&(e, i)| (e, to_log10(i)))
        .filter(|p| p.1.is_finite())
        .collect()
}

/// Slopes `b` of the Tafel lines `log10|i| = log10 i_corr + (E − E_corr)/b`.
fn tafel_lines(result: &FitResult) -> Vec<(&'static str, f64)> {
    match (result.kind, result.b_cathodic) {
        (FitKind::Linear, _) | (_, None) => vec![("Tafel slope", result.b_anodic)],
        (_, Some(b_c)) => vec![("anodic Tafel slope", result.b_anodic), ("cathodic Tafel slope", -b_c)],
    }
}

/// Segment of `y = slope·x + intercept` inside the box, if any.
fn clip_line(slope: f64, intercept: f64, x: [f64; 2], y: [f64; 2]) -> Option<[(f64, f64); 2]> {
    if !(slope.is_finite() && intercept.is_finite()) || slope == 0.0 {
        return None;
    }
    let xa = (y[0] - intercept) / slope;
    let xb = (y[1] - intercept) / slope;
    let lo = x[0].max(xa.min(xb));
    let hi = x[1].min(xa.max(xb));
    (lo < hi).then(|| [(lo, slope * lo + intercept), (hi, slope * hi + intercept)])
}

fn padded_range(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(lo.is_finite() && hi.is_finite()) {
        return [0.0, 1.0];
    }
    let span = hi - lo;
    let pad = if span > 0.0 { 0.05 * span } else { 0.5 * lo.abs().max(1e-12) };
    [lo - pad, hi + pad]
}

fn format_tick(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-3..1e4).contains(&a) {
        format!("{v:.1e}")
    } else {
        format!("{v:.3}")
    }
}

fn palette(idx: usize) -> RGBColor {
    let RGBAColor(r, g, b, _) = Palette99::pick(idx).to_rgba();
    RGBColor(r, g, b)
}

/// Red gradient from light (first) to full red (last).
fn red_shade(idx: usize, n: usize) -> RGBColor {
    let t = if n > 1 { idx as f64 / (n - 1) as f64 } else { 1.0 };
    let alpha = 0.2 + 0.8 * t;
    let fade = (255.0 * (1.0 - alpha)).round() as u8;
    RGBColor(255, fade, fade)
}
