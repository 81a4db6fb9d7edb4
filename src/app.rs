//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the log subscriber
//! - parses CLI arguments
//! - loads or generates the curve
//! - runs the requested fit or sweep
//! - prints summaries/plots and writes optional outputs
//! - reads back exported fit files

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{ActiveArgs, Cli, Command, DemoArgs, LinearArgs, MixedArgs, ShowArgs, SweepArgs};
use crate::error::Result;

pub mod pipeline;

/// Entry point for the `polfit` binary.
pub fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Linear(args) => handle_linear(args),
        Command::Active(args) => handle_active(args),
        Command::Mixed(args) => handle_mixed(args),
        Command::Sweep(args) => handle_sweep(args),
        Command::Demo(args) => handle_demo(args),
        Command::Show(args) => handle_show(args),
    }
}

/// Logs go to stderr so stdout stays clean for reports and plots.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_linear(args: LinearArgs) -> Result<()> {
    let mut analysis = pipeline::load_analysis(&args.input)?;
    analysis.linear_fit(&args.options())?;
    pipeline::finish_fit(&analysis, &args.output)
}

fn handle_active(args: ActiveArgs) -> Result<()> {
    let mut analysis = pipeline::load_analysis(&args.input)?;
    analysis.active_pol_fit(&args.options())?;
    pipeline::finish_fit(&analysis, &args.output)
}

fn handle_mixed(args: MixedArgs) -> Result<()> {
    let mut analysis = pipeline::load_analysis(&args.input)?;
    analysis.mixed_pol_fit(&args.settings.options())?;
    pipeline::finish_fit(&analysis, &args.output)
}

fn handle_sweep(args: SweepArgs) -> Result<()> {
    let mut analysis = pipeline::load_analysis(&args.input)?;
    let report = analysis.sens_analysis(&args.config())?;
    println!("{}", crate::report::format_sweep_summary(report));

    if let Some(dir) = &args.output {
        analysis.save_sens_analysis(dir)?;
        if args.effects {
            analysis.plotting_sens_analysis(dir)?;
        }
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<()> {
    let Some(mut analysis) = pipeline::demo_analysis(&args)? else {
        return Ok(());
    };
    analysis.mixed_pol_fit(&args.settings.options())?;
    pipeline::finish_fit(&analysis, &args.output)
}

fn handle_show(args: ShowArgs) -> Result<()> {
    let file = crate::io::read_fit_json(&args.input)?;
    println!("{}", crate::report::format_fit_file(&file));
    if args.curve {
        println!("{}", crate::report::format_fit_report(&file.result));
    }
    if let Some(path) = &args.report {
        crate::report::save_to_txt(path, &file.result)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}
