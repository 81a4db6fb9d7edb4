//! Text formatting of fit results and sweep summaries.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays free of presentation concerns
//! - output changes are localized (the report layout is snapshot-tested)

use crate::domain::{FitKind, FitResult, PolarizationCurve, SensitivityReport};
use crate::io::FitFile;

/// The full text report of one fit: header, parameters, then the fitted
/// curve as two whitespace-separated columns.
pub fn format_fit_report(result: &FitResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("Results, obtained by the {}.\n", result.kind.display_name()));
    out.push('\n');

    if let Some(w) = result.weighting {
        out.push_str("Weight distribution applied:\n");
        out.push_str(&format!("window activation control (w_ac) [V] = {:.3}\n", w.w_ac));
        out.push_str(&format!("Weight percentage (W) [%] = {:.1}\n", w.w_percent));
        out.push('\n');
    }

    out.push_str("Fitted parameters:\n");
    out.push_str(&format_parameters(result));
    out.push('\n');

    out.push_str("Fitted curve:\n");
    out.push_str("E_fit [V vs Ref]\tI_fit [unit input current / input surface area]\n");
    for (e, i) in result
        .fit_curve
        .potential
        .iter()
        .zip(result.fit_curve.current.iter())
    {
        out.push_str(&format!("{e:.18e} {i:.18e}\n"));
    }

    out
}

/// Parameter block shared by the text report and the terminal summary.
pub fn format_parameters(result: &FitResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("Corrosion potential (E_corr) [V vs Ref] = {:.4}\n", result.e_corr));
    out.push_str(&format!("Corrosion current (density) (I_corr) = {:.4e}\n", result.i_corr()));
    match result.cathodic_tafel_slope() {
        None => {
            out.push_str(&format!("Tafel slope (b) [V/dec] = {:.4}\n", result.tafel_slope()));
        }
        Some(b_c) => {
            out.push_str(&format!("Anodic Tafel slope (b_a) [V/dec] = {:.4}\n", result.b_anodic));
            out.push_str(&format!("Cathodic Tafel slope (b_c) [V/dec] = {:.4}\n", b_c));
        }
    }
    if let Some(i_l) = result.i_l() {
        out.push_str(&format!("Limiting current (density) (i_L) = {:.4e}\n", i_l));
    }
    if let Some(gamma) = result.gamma {
        out.push_str(&format!("Curvature (gamma) = {:.4}\n", gamma));
    }
    out.push_str(&format!("RMSE = {:.4e}\n", result.rmse));

    if result.kind == FitKind::Linear {
        if let Some(io) = result.io_anodic() {
            out.push_str(&format!("Exchange current (density) (io) = {:.4e}\n", io));
        }
    } else {
        if let Some(io) = result.io_anodic() {
            out.push_str(&format!("Anodic exchange current (density) (io_an) = {:.4e}\n", io));
        }
        if let Some(io) = result.io_cathodic() {
            out.push_str(&format!("Cathodic exchange current (density) (io_cath) = {:.4e}\n", io));
        }
    }

    out
}

/// Short terminal summary: the curve, the window, and the parameters.
pub fn format_fit_summary(curve: &PolarizationCurve, result: &FitResult) -> String {
    let mut out = String::new();

    out.push_str("=== polfit - polarization curve fit ===\n");
    let (e_min, e_max) = curve
        .potential()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &e| (lo.min(e), hi.max(e)));
    out.push_str(&format!(
        "Curve: n={} | E=[{e_min:.4}, {e_max:.4}] V | R={} Ohm | surface={}\n",
        curve.len(),
        curve.resistance(),
        curve.sample_surface()
    ));
    out.push_str(&format!(
        "Technique: {} | window points: {}\n",
        result.kind.display_name(),
        result.fit_curve.potential.len()
    ));
    if let Some(w) = result.weighting {
        out.push_str(&format!("Weighting: w_ac={:.3} V, W={:.1} %\n", w.w_ac, w.w_percent));
    }
    out.push('\n');
    out.push_str(&format_parameters(result));
    out
}

/// Summary of an exported fit file: provenance, then the parameter block.
pub fn format_fit_file(file: &FitFile) -> String {
    let mut out = String::new();
    let result = &file.result;

    out.push_str("=== polfit - stored fit ===\n");
    out.push_str(&format!(
        "Written by {} at {} | R={} Ohm | surface={}\n",
        file.tool,
        file.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        file.resistance,
        file.sample_surface
    ));
    out.push_str(&format!(
        "Technique: {} | window points: {}\n",
        result.kind.display_name(),
        result.fit_curve.potential.len()
    ));
    if let Some(w) = result.weighting {
        out.push_str(&format!("Weighting: w_ac={:.3} V, W={:.1} %\n", w.w_ac, w.w_percent));
    }
    out.push('\n');
    out.push_str(&format_parameters(result));
    out
}

/// Terminal summary of a sensitivity sweep: per-`W` variability and the
/// weight percentage with the lowest mean variability.
pub fn format_sweep_summary(report: &SensitivityReport) -> String {
    let mut out = String::new();

    out.push_str("=== polfit - sensitivity analysis ===\n");
    out.push_str(&format!(
        "Window: [{:.3}, {:.3}] V vs E_corr | w_dc = {:.3} V\n",
        report.window[0], report.window[1], report.w_dc
    ));
    out.push_str(&format!(
        "Grid: {} w_ac x {} W x {} w_c | fitted: {} | skipped: {}\n",
        report.w_ac.len(),
        report.w_percent.len(),
        report.window_cathodic.len(),
        report.rows.len(),
        report.skipped
    ));
    out.push('\n');

    out.push_str(&format!("{:>8} {:>14} {:>14}\n", "W [%]", "mean std(b_c)", "std std(b_c)"));
    out.push_str(&format!("{:->8} {:->14} {:->14}\n", "", "", ""));
    for v in &report.by_weight {
        let label = if v.w_percent == 0.0 {
            "none".to_string()
        } else {
            format!("{:.1}", v.w_percent)
        };
        out.push_str(&format!("{:>8} {:>14} {:>14}\n", label, fmt_opt(v.mean), fmt_opt(v.std_dev)));
    }

    let best = report
        .by_weight
        .iter()
        .filter_map(|v| v.mean.map(|m| (v.w_percent, m)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((w, m)) = best {
        out.push('\n');
        if w == 0.0 {
            out.push_str(&format!("Most stable: unweighted (mean std {m:.4e})\n"));
        } else {
            out.push_str(&format!("Most stable: W = {w:.1} % (mean std {m:.4e})\n"));
        }
    }

    out
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4e}")).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitCurve, WeightSettings, WeightVariability};

    fn mixed_result() -> FitResult {
        FitResult {
            kind: FitKind::Mixed,
            fit_curve: FitCurve {
                potential: vec![-0.5, -0.4],
                current: vec![-1e-3, 1e-8],
            },
            e_corr: -0.4,
            log_i_corr: -5.0,
            b_anodic: 0.06,
            b_cathodic: Some(0.12),
            log_i_l: Some(-3.0),
            gamma: Some(3.0),
            rmse: 0.0,
            log_io_anodic: None,
            log_io_cathodic: None,
            weighting: Some(WeightSettings {
                w_ac: 0.04,
                w_percent: 75.0,
            }),
        }
    }

    #[test]
    fn mixed_report_layout() {
        let text = format_fit_report(&mixed_result());
        let expected_head = "\
Results, obtained by the mixed diffusion-activation control fit.

Weight distribution applied:
window activation control (w_ac) [V] = 0.040
Weight percentage (W) [%] = 75.0

Fitted parameters:
Corrosion potential (E_corr) [V vs Ref] = -0.4000
Corrosion current (density) (I_corr) = 1.0000e-5
Anodic Tafel slope (b_a) [V/dec] = 0.0600
Cathodic Tafel slope (b_c) [V/dec] = -0.1200
Limiting current (density) (i_L) = 1.0000e-3
Curvature (gamma) = 3.0000
RMSE = 0.0000e0

Fitted curve:
";
        assert!(text.starts_with(expected_head), "{text}");
        let curve_lines: Vec<&str> = text.lines().skip_while(|l| !l.starts_with("E_fit")).skip(1).collect();
        assert_eq!(curve_lines.len(), 2);
        assert!(curve_lines[0].starts_with("-5.000000000000000000e-1 "));
    }

    #[test]
    fn linear_report_names_single_slope_and_io() {
        let result = FitResult {
            kind: FitKind::Linear,
            b_anodic: -0.06,
            b_cathodic: None,
            log_i_l: None,
            gamma: None,
            log_io_anodic: Some(-6.0),
            weighting: None,
            ..mixed_result()
        };
        let text = format_fit_report(&result);
        assert!(text.starts_with("Results, obtained by the linear fit."));
        assert!(text.contains("Tafel slope (b) [V/dec] = -0.0600\n"));
        assert!(text.contains("Exchange current (density) (io) = 1.0000e-6\n"));
        assert!(!text.contains("Weight distribution"));
        assert!(!text.contains("Cathodic"));
    }

    #[test]
    fn stored_fit_summary_names_provenance() {
        let file = FitFile::new(mixed_result(), 2.5, 0.8);
        let text = format_fit_file(&file);
        assert!(text.starts_with("=== polfit - stored fit ===\nWritten by polfit at "), "{text}");
        assert!(text.contains("| R=2.5 Ohm | surface=0.8\n"));
        assert!(text.contains("Technique: mixed diffusion-activation control fit | window points: 2\n"));
        assert!(text.contains("Limiting current (density) (i_L) = 1.0000e-3\n"));
    }

    #[test]
    fn sweep_summary_picks_lowest_mean() {
        let report = SensitivityReport {
            window: [-0.5, 0.15],
            w_dc: -0.2,
            w_ac: vec![0.01],
            w_percent: vec![50.0, 75.0, 0.0],
            window_cathodic: vec![-0.3],
            rows: Vec::new(),
            stability: Vec::new(),
            by_weight: vec![
                WeightVariability { w_percent: 50.0, mean: Some(0.02), std_dev: None },
                WeightVariability { w_percent: 75.0, mean: Some(0.01), std_dev: Some(0.001) },
                WeightVariability { w_percent: 0.0, mean: None, std_dev: None },
            ],
            skipped: 3,
        };
        let text = format_sweep_summary(&report);
        assert!(text.contains("skipped: 3"));
        assert!(text.contains("Most stable: W = 75.0 %"));
        assert!(text.contains("    none              -              -"));
    }
}
