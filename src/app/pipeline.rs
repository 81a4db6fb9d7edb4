//! Shared pipeline steps used by the subcommands.
//!
//! Keeping these in one place avoids duplicating the workflow:
//! load curve -> fit -> print summary/plot -> optional files

use tracing::info;

use crate::analysis::Analysis;
use crate::cli::{DemoArgs, InputArgs, OutputArgs};
use crate::data::{SyntheticSpec, generate_curve};
use crate::error::Result;
use crate::io::{CurveColumns, FitFile, load_curve_csv, write_curve_csv, write_fit_json};

/// Read the CSV named by `input` and start a session on it.
pub fn load_analysis(input: &InputArgs) -> Result<Analysis> {
    let data = load_curve_csv(&input.input, &input.columns())?;
    info!(path = %input.input.display(), points = data.potential.len(), "curve loaded");
    Analysis::new(&data.potential, &data.current, input.resistance, input.surface)
}

/// The synthetic curve of the `demo` subcommand.
pub fn demo_spec(args: &DemoArgs) -> SyntheticSpec {
    SyntheticSpec {
        noise: args.noise,
        seed: args.seed,
        ..SyntheticSpec::default()
    }
}

/// Generate the demo curve; returns `None` when it was written to CSV instead.
pub fn demo_analysis(args: &DemoArgs) -> Result<Option<Analysis>> {
    let curve = generate_curve(&demo_spec(args))?;
    if let Some(path) = &args.write_csv {
        write_curve_csv(path, &CurveColumns::default(), &curve.potential, &curve.current)?;
        info!(path = %path.display(), points = curve.potential.len(), "synthetic curve written");
        return Ok(None);
    }
    Analysis::new(&curve.potential, &curve.current, 0.0, 1.0).map(Some)
}

/// Print the summary of the last fit and write the requested files.
pub fn finish_fit(analysis: &Analysis, output: &OutputArgs) -> Result<()> {
    let fit = analysis.last_fit()?;
    println!("{}", crate::report::format_fit_summary(analysis.curve(), fit));

    if !output.no_plot {
        let plot = crate::plot::render_ascii_plot(analysis.curve(), fit, output.width, output.height);
        println!("{plot}");
    }

    if let Some(path) = &output.report {
        analysis.save_to_txt(path)?;
    }
    if let Some(dir) = &output.plots {
        analysis.plotting(dir)?;
    }
    if let Some(path) = &output.export_json {
        let curve = analysis.curve();
        write_fit_json(path, &FitFile::new(fit.clone(), curve.resistance(), curve.sample_surface()))?;
        info!(path = %path.display(), "fit exported");
    }
    Ok(())
}
