//! Tab-separated exports of the sensitivity sweep.
//!
//! Two tables are written into the sweep's output directory:
//!
//! - `fitted_parameters.txt`: one row per successful fit
//!   (`w_ac  W  window_cat  b_c  i_L`)
//! - `variability.txt`: one row per `(w_ac, W)` (`w_ac  W  std_dev`)
//!
//! Numbers use four significant digits in `%g` style; a missing standard
//! deviation is written as `nan`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::SensitivityReport;
use crate::error::{PolError, Result};

pub const FITTED_PARAMETERS_FILE: &str = "fitted_parameters.txt";
pub const VARIABILITY_FILE: &str = "variability.txt";

/// Write both sweep tables into `dir` (created if needed).
pub fn write_sweep_tables(dir: &Path, report: &SensitivityReport) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| PolError::io(format!("failed to create '{}'", dir.display()), e))?;
    write_fitted_parameters(&dir.join(FITTED_PARAMETERS_FILE), report)?;
    write_variability(&dir.join(VARIABILITY_FILE), report)?;
    Ok(())
}

pub fn write_fitted_parameters(path: &Path, report: &SensitivityReport) -> Result<()> {
    let context = || format!("failed to write '{}'", path.display());
    let file = File::create(path).map_err(|e| PolError::io(context(), e))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "w_ac\tW\twindow_cat\tb_c\ti_L").map_err(|e| PolError::io(context(), e))?;
    for r in &report.rows {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            format_g(r.w_ac, 4),
            format_g(r.w_percent, 4),
            format_g(r.window_cathodic, 4),
            format_g(r.b_cathodic, 4),
            format_g(r.i_l, 4),
        )
        .map_err(|e| PolError::io(context(), e))?;
    }
    out.flush().map_err(|e| PolError::io(context(), e))?;
    Ok(())
}

pub fn write_variability(path: &Path, report: &SensitivityReport) -> Result<()> {
    let context = || format!("failed to write '{}'", path.display());
    let file = File::create(path).map_err(|e| PolError::io(context(), e))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "w_ac\tW\tstd_dev").map_err(|e| PolError::io(context(), e))?;
    for s in &report.stability {
        writeln!(
            out,
            "{}\t{}\t{}",
            format_g(s.w_ac, 4),
            format_g(s.w_percent, 4),
            format_g(s.std_dev.unwrap_or(f64::NAN), 4),
        )
        .map_err(|e| PolError::io(context(), e))?;
    }
    out.flush().map_err(|e| PolError::io(context(), e))?;
    Ok(())
}

/// `printf("%.{precision}g")`: fixed or scientific notation, whichever is
/// shorter for the exponent, with trailing zeros removed.
pub fn format_g(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    // Rounding to `precision` digits decides the exponent (9.9996 -> 10.00).
    let sci = format!("{:.*e}", precision - 1, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
